//! User-level configuration for codediag
//!
//! Supports loading the reviewer credential and model from:
//! - Environment variables (`CODEDIAG_AI_API_KEY`, `ANTHROPIC_API_KEY`)
//! - ~/.config/codediag/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

pub const API_KEY_ENV: &str = "CODEDIAG_AI_API_KEY";
pub const FALLBACK_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub ai: UserAiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserAiConfig {
    /// Credential for the external reviewer
    pub api_key: Option<String>,

    /// Model override applied on top of the project setting
    pub model: Option<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/codediag/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(user_config) = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|content| toml::from_str::<UserConfig>(&content).ok())
        {
            debug!("Loaded user config");
            config.merge(user_config);
        }

        let env_key = pick_api_key(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(FALLBACK_API_KEY_ENV).ok(),
        );
        if env_key.is_some() {
            config.ai.api_key = env_key;
        }

        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("codediag").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if other.ai.api_key.is_some() {
            self.ai.api_key = other.ai.api_key;
        }
        if other.ai.model.is_some() {
            self.ai.model = other.ai.model;
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.ai.api_key.as_deref()
    }
}

/// First non-empty credential in precedence order
fn pick_api_key(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary
        .into_iter()
        .chain(fallback)
        .find(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert!(config.api_key().is_none());
        assert!(config.ai.model.is_none());
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[ai]
api_key = "sk-test-123"
model = "claude-3"
"#;
        let config: UserConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_key(), Some("sk-test-123"));
        assert_eq!(config.ai.model.as_deref(), Some("claude-3"));
    }

    #[test]
    fn test_toml_parsing_minimal() {
        let config: UserConfig = toml::from_str("").unwrap();
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_merge_preserves_base_when_other_is_none() {
        let mut base = UserConfig {
            ai: UserAiConfig {
                api_key: Some("sk-original".to_string()),
                model: None,
            },
        };
        base.merge(UserConfig::default());
        assert_eq!(base.api_key(), Some("sk-original"));
    }

    #[test]
    fn test_pick_api_key_precedence() {
        assert_eq!(
            pick_api_key(Some("a".into()), Some("b".into())).as_deref(),
            Some("a")
        );
        assert_eq!(
            pick_api_key(Some("".into()), Some("b".into())).as_deref(),
            Some("b")
        );
        assert_eq!(pick_api_key(None, None), None);
    }

    #[test]
    fn test_user_config_path_returns_some() {
        if let Some(p) = UserConfig::user_config_path() {
            assert!(p.ends_with("codediag/config.toml"));
        }
    }
}
