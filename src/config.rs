//! Harness configuration.
//!
//! Settings resolve in priority order:
//! 1. CLI flags
//! 2. the JSON config file passed with `--config`
//! 3. environment variables
//! 4. built-in defaults
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LOCAL_COMMAND: &str = "ollama run {model}";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_QUESTIONS_DIR: &str = "data/questions";
pub const DEFAULT_OUTPUT_DIR: &str = "data/raw_output";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_ORGANIZATION: &str = "OPENAI_ORGANIZATION";
pub const ENV_BASE_URL: &str = "TOMBENCH_OPENAI_BASE_URL";
pub const ENV_LM_COMMAND: &str = "TOMBENCH_LM_COMMAND";

/// Optional on-disk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            openai_base_url: None,
            local_command: None,
            request_timeout_secs: None,
            questions_dir: None,
            output_dir: None,
        }
    }
}

/// Everything a completion backend needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub openai_base_url: String,
    pub api_key: Option<String>,
    pub organization: Option<String>,
    pub local_command: String,
    pub request_timeout: Duration,
}

/// Load the config file, or defaults when no path was given.
pub fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    let Some(path) = path else {
        return Ok(HarnessConfig::default());
    };
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: HarnessConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &HarnessConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} (expected {CONFIG_SCHEMA_VERSION})",
            config.schema_version
        ));
    }
    if config.request_timeout_secs == Some(0) {
        return Err(anyhow!("request_timeout_secs must be greater than zero"));
    }
    if let Some(command) = &config.local_command {
        if command.trim().is_empty() {
            return Err(anyhow!("local_command must not be empty"));
        }
    }
    Ok(())
}

/// Resolve backend settings from CLI overrides, config, and environment.
///
/// `env` is the environment lookup, injected so resolution can be tested
/// without touching the process environment.
pub fn resolve_backend_settings<F>(
    config: &HarnessConfig,
    cli_lm_command: Option<&str>,
    env: F,
) -> BackendSettings
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    let openai_base_url = config
        .openai_base_url
        .clone()
        .or_else(|| non_empty(ENV_BASE_URL))
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
    let local_command = cli_lm_command
        .map(str::to_string)
        .or_else(|| config.local_command.clone())
        .or_else(|| non_empty(ENV_LM_COMMAND))
        .unwrap_or_else(|| DEFAULT_LOCAL_COMMAND.to_string());
    let timeout_secs = config
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

    BackendSettings {
        openai_base_url,
        api_key: non_empty(ENV_API_KEY),
        organization: non_empty(ENV_ORGANIZATION),
        local_command,
        request_timeout: Duration::from_secs(timeout_secs),
    }
}

/// Directory holding `test.trace` and `test.txt`.
pub fn resolve_questions_dir(config: &HarnessConfig, cli: Option<&Path>) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| config.questions_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_QUESTIONS_DIR))
}

/// Directory receiving raw run output.
pub fn resolve_output_dir(config: &HarnessConfig, cli: Option<&Path>) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// Process environment lookup for [`resolve_backend_settings`].
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
