//! Configuration module for codediag
//!
//! This module handles:
//! - Project-level configuration (codediag.toml)
//! - Analysis threshold overrides
//! - Reviewer credential resolution (environment, user config)

mod project_config;
mod user_config;

pub use project_config::{
    load_project_config, AiSettings, ProjectConfig, ReportSettings, Thresholds, CONFIG_FILE_NAME,
};
pub use user_config::{UserConfig, API_KEY_ENV, FALLBACK_API_KEY_ENV};

use std::path::Path;
use tracing::warn;

/// Load the project config and fill in the reviewer credential from the
/// user-level sources.
pub fn load_config(root: &Path) -> ProjectConfig {
    let mut config = load_project_config(root);
    match UserConfig::load() {
        Ok(user) => {
            if let Some(model) = user.ai.model {
                config.ai.model = model;
            }
            config.ai.api_key = user.ai.api_key;
        }
        Err(e) => warn!("Failed to load user config: {:#}", e),
    }
    config
}
