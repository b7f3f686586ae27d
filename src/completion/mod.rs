//! Completion backends.
//!
//! Every backend sends the fixed system instruction plus one user prompt and
//! returns the model's raw text. Two backends exist:
//!
//! - **OpenAI**: chat completions over HTTP with temperature 0.
//! - **Command**: a user-configured local command that reads the prompt on
//!   stdin and writes the response to stdout (e.g. `ollama run {model}`).
//!
//! Failures are returned to the caller as-is; there is no retry.

mod command;
mod openai;

pub use command::CommandClient;
pub use openai::OpenAiClient;

use crate::config::BackendSettings;
use thiserror::Error;

/// Errors from a completion backend.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("completion request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("completion endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("parse completion response: {message}")]
    Parse { message: String },

    #[error("invalid LM command {command:?}: {message}")]
    InvalidCommand { command: String, message: String },

    #[error("run LM command {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("LM command failed with status {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },
}

/// A model that answers prompts.
pub trait CompletionClient {
    /// Send the system instruction and `prompt` to `model`, returning the raw
    /// response text.
    fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError>;
}

/// Which backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    OpenAi,
    Command,
}

impl Backend {
    pub fn from_local_flag(local: bool) -> Self {
        if local {
            Self::Command
        } else {
            Self::OpenAi
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Command => write!(f, "command"),
        }
    }
}

/// Build the client for `backend` from resolved settings.
pub fn build_client(
    backend: Backend,
    settings: &BackendSettings,
) -> Result<Box<dyn CompletionClient>, CompletionError> {
    tracing::debug!(%backend, "building completion client");
    match backend {
        Backend::OpenAi => Ok(Box::new(OpenAiClient::new(settings)?)),
        Backend::Command => Ok(Box::new(CommandClient::new(&settings.local_command)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(api_key: Option<&str>) -> BackendSettings {
        BackendSettings {
            openai_base_url: "http://127.0.0.1:9".to_string(),
            api_key: api_key.map(str::to_string),
            organization: None,
            local_command: "cat".to_string(),
            request_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn local_flag_selects_command_backend() {
        assert_eq!(Backend::from_local_flag(true), Backend::Command);
        assert_eq!(Backend::from_local_flag(false), Backend::OpenAi);
    }

    #[test]
    fn openai_backend_requires_api_key() {
        let err = build_client(Backend::OpenAi, &settings(None)).err();
        assert!(matches!(err, Some(CompletionError::MissingApiKey)));
    }

    #[test]
    fn command_backend_ignores_api_key() {
        assert!(build_client(Backend::Command, &settings(None)).is_ok());
    }
}
