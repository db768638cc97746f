//! Configuration file support

use coinpilot_ai::{Model, models};
use coinpilot_chat::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for coinpilot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default model to use
    pub model: Option<String>,
    /// Endpoint override for OpenAI-compatible services
    pub base_url: Option<String>,
    /// Reply budget per request
    pub max_tokens: Option<u32>,
    /// Custom system prompt file path
    pub system_prompt_file: Option<String>,
    /// Replay at most this many recent exchanges per request
    pub replay_limit: Option<usize>,
    /// Keep a cancelled reply visible with its partial text
    pub keep_partial_on_cancel: Option<bool>,
    /// Resend attachments when retrying a failed message
    pub retry_with_attachments: Option<bool>,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coinpilot")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("COINPILOT_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some(models::DEFAULT_MODEL_ID.to_string()),
            max_tokens: Some(models::DEFAULT_MAX_TOKENS),
            ..Default::default()
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get the API key, checking config then env
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_keys.openai.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        std::env::var(coinpilot_ai::providers::openai::API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
    }

    /// Resolve the model, CLI choice first
    pub fn resolve_model(&self, cli_model: Option<&str>) -> Model {
        let id = cli_model
            .or(self.model.as_deref())
            .unwrap_or(models::DEFAULT_MODEL_ID);
        let mut model = models::resolve_model(id, self.base_url.as_deref());
        if let Some(max_tokens) = self.max_tokens {
            model.max_tokens = max_tokens;
        }
        model
    }

    /// Read the custom system prompt, if one is configured and readable
    pub fn system_prompt(&self) -> Option<String> {
        let path = self.system_prompt_file.as_ref()?;
        let path = expand_home(path);
        match fs::read_to_string(&path) {
            Ok(prompt) => Some(prompt),
            Err(e) => {
                eprintln!(
                    "Warning: Failed to read system prompt file {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Session settings for the given model
    pub fn session_config(&self, model: Model) -> SessionConfig {
        let mut config = SessionConfig::new(model);
        if let Some(prompt) = self.system_prompt() {
            config.system_prompt = Some(prompt);
        }
        config.replay_limit = self.replay_limit;
        config.keep_partial_on_cancel = self.keep_partial_on_cancel.unwrap_or(false);
        config.retry_with_attachments = self.retry_with_attachments.unwrap_or(false);
        config
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# coinpilot configuration file
# Place at ~/.config/coinpilot/config.toml (Linux) or set COINPILOT_CONFIG_PATH

# Default model to use
model = "gpt-4o-mini"

# OpenAI-compatible endpoint (optional)
# base_url = "https://api.openai.com/v1"

# Reply budget per request
max_tokens = 1024

# Custom system prompt file (optional)
# system_prompt_file = "~/.config/coinpilot/system_prompt.txt"

# Replay only the most recent N exchanges with each request (optional)
# replay_limit = 20

# Keep a cancelled reply on screen with its partial text
# keep_partial_on_cancel = false

# Resend image attachments when retrying a failed message
# retry_with_attachments = false

# API keys (optional - OPENAI_API_KEY is used when unset)
[api_keys]
# openai = "sk-..."
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.max_tokens, Some(1024));
        assert!(config.api_keys.openai.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            model = "gpt-4o"
            base_url = "http://localhost:8080/v1"
            replay_limit = 5
            keep_partial_on_cancel = true
            retry_with_attachments = true

            [api_keys]
            openai = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.replay_limit, Some(5));
        assert_eq!(config.keep_partial_on_cancel, Some(true));

        let model = config.resolve_model(None);
        assert_eq!(model.id, "gpt-4o");
        assert_eq!(model.base_url, "http://localhost:8080/v1");

        let session = config.session_config(model);
        assert_eq!(session.replay_limit, Some(5));
        assert!(session.keep_partial_on_cancel);
        assert!(session.retry_with_attachments);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        let model = config.resolve_model(None);
        assert_eq!(model.id, models::DEFAULT_MODEL_ID);
        assert_eq!(model.max_tokens, models::DEFAULT_MAX_TOKENS);

        let session = config.session_config(model);
        assert!(session.system_prompt.is_some());
        assert!(!session.keep_partial_on_cancel);
        assert!(!session.retry_with_attachments);
    }

    #[test]
    fn test_cli_model_wins_over_config() {
        let config = Config {
            model: Some("gpt-4o".into()),
            max_tokens: Some(256),
            ..Default::default()
        };
        let model = config.resolve_model(Some("my-local-model"));
        assert_eq!(model.id, "my-local-model");
        assert_eq!(model.max_tokens, 256);
    }

    #[test]
    fn test_config_key_takes_precedence() {
        let config = Config {
            api_keys: ApiKeys {
                openai: Some("sk-from-config".into()),
            },
            ..Default::default()
        };
        assert_eq!(config.get_api_key().as_deref(), Some("sk-from-config"));
    }

    #[test]
    fn test_missing_config_key_falls_back_to_env() {
        let config = Config::default();
        let from_env = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        assert_eq!(config.get_api_key(), from_env);
    }

    #[test]
    fn test_unreadable_prompt_file_keeps_default() {
        let config = Config {
            system_prompt_file: Some("/nonexistent/prompt.txt".into()),
            ..Default::default()
        };
        assert!(config.system_prompt().is_none());
        let session = config.session_config(models::default_model());
        assert_eq!(
            session.system_prompt.as_deref(),
            Some(coinpilot_ai::analysis::ANALYST_SYSTEM_PROMPT)
        );
    }
}
