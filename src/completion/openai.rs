use super::{CompletionClient, CompletionError};
use crate::config::BackendSettings;
use crate::prompt::SYSTEM_INSTRUCTION;
use crate::util::truncate_string;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Error bodies are truncated to this many bytes in error messages.
const ERROR_BODY_LIMIT: usize = 500;

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    organization: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, CompletionError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(CompletionError::MissingApiKey)?;

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(settings.request_timeout))
            .http_status_as_error(false)
            .build();

        Ok(Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            api_key,
            organization: settings.organization.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        let url = self.endpoint();
        let body = chat_request(model, prompt);
        let start = Instant::now();

        let authorization = format!("Bearer {}", self.api_key);
        let mut request = self
            .agent
            .post(&url)
            .header("Authorization", authorization.as_str());
        if let Some(org) = &self.organization {
            request = request.header("OpenAI-Organization", org.as_str());
        }

        let mut response = request
            .send_json(&body)
            .map_err(|e| CompletionError::Request {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| CompletionError::Request {
                url: url.clone(),
                message: e.to_string(),
            })?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            status = status.as_u16(),
            prompt_bytes = prompt.len(),
            response_bytes = text.len(),
            model,
            "openai completion complete"
        );

        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: truncate_string(text.trim(), ERROR_BODY_LIMIT),
            });
        }
        parse_chat_response(&text)
    }
}

fn chat_request<'a>(model: &'a str, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        temperature: 0.0,
        messages: [
            ChatMessage {
                role: "system",
                content: SYSTEM_INSTRUCTION,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
    }
}

fn parse_chat_response(text: &str) -> Result<String, CompletionError> {
    let response: ChatResponse =
        serde_json::from_str(text).map_err(|e| CompletionError::Parse {
            message: format!(
                "{e}; first {ERROR_BODY_LIMIT} bytes: {}",
                truncate_string(text, ERROR_BODY_LIMIT)
            ),
        })?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::Parse {
            message: "response has no choices[0].message.content".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_has_system_and_user_messages_at_temperature_zero() {
        let value = serde_json::to_value(chat_request("gpt-4", "where is mary?")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "gpt-4",
                "temperature": 0.0,
                "messages": [
                    {"role": "system", "content": SYSTEM_INSTRUCTION},
                    {"role": "user", "content": "where is mary?"}
                ]
            })
        );
    }

    #[test]
    fn parses_first_choice_content() {
        let text = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "<answer>hall</answer>"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        assert_eq!(parse_chat_response(text).unwrap(), "<answer>hall</answer>");
    }

    #[test]
    fn empty_choices_is_a_parse_error() {
        let err = parse_chat_response(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, CompletionError::Parse { .. }));
    }

    #[test]
    fn non_json_is_a_parse_error() {
        let err = parse_chat_response("<html>bad gateway</html>").unwrap_err();
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let settings = BackendSettings {
            openai_base_url: "https://example.test/v1/".to_string(),
            api_key: Some("sk-test".to_string()),
            organization: None,
            local_command: String::new(),
            request_timeout: std::time::Duration::from_secs(5),
        };
        let client = OpenAiClient::new(&settings).unwrap();
        assert_eq!(client.endpoint(), "https://example.test/v1/chat/completions");
    }
}
