use super::{CompletionClient, CompletionError};
use crate::prompt::SYSTEM_INSTRUCTION;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Replaced with the model name in each argument of the command.
pub const MODEL_PLACEHOLDER: &str = "{model}";
/// Replaced with the system instruction in each argument of the command.
pub const SYSTEM_PLACEHOLDER: &str = "{system}";

/// Runs a local command per completion, prompt on stdin, response on stdout.
#[derive(Debug, Clone)]
pub struct CommandClient {
    argv: Vec<String>,
}

impl CommandClient {
    /// Parse `command` with shell quoting rules.
    pub fn new(command: &str) -> Result<Self, CompletionError> {
        let argv = shell_words::split(command).map_err(|e| CompletionError::InvalidCommand {
            command: command.to_string(),
            message: e.to_string(),
        })?;
        if argv.is_empty() {
            return Err(CompletionError::InvalidCommand {
                command: command.to_string(),
                message: "command is empty".to_string(),
            });
        }
        Ok(Self { argv })
    }

    fn resolved_argv(&self, model: &str) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| {
                arg.replace(MODEL_PLACEHOLDER, model)
                    .replace(SYSTEM_PLACEHOLDER, SYSTEM_INSTRUCTION)
            })
            .collect()
    }
}

impl CompletionClient for CommandClient {
    fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        let argv = self.resolved_argv(model);
        let program = argv[0].clone();
        let spawn_err = |source| CompletionError::Spawn {
            program: program.clone(),
            source,
        };

        let start = Instant::now();
        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).map_err(spawn_err)?;
        }

        let output = child.wait_with_output().map_err(spawn_err)?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_bytes = prompt.len(),
            response_bytes = output.stdout.len(),
            model,
            "lm command complete"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CompletionError::CommandFailed {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
