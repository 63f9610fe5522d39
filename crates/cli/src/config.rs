//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub vk: VkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Derive the source set from the account's subscriptions instead of
    /// the explicit `sources` list
    #[serde(default)]
    pub from_subscriptions: bool,

    /// Owner-identifier strings (negative = group, positive = profile)
    #[serde(default)]
    pub sources: Vec<String>,

    /// Subscriptions to skip, matched by raw id, negated id, or handle
    #[serde(default)]
    pub exclude_sources: Vec<String>,

    /// Pause after each source's fetch, in milliseconds
    #[serde(default = "default_source_delay_ms")]
    pub source_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VkConfig {
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
}

// Default value functions
fn default_state_db_path() -> PathBuf {
    PathBuf::from("./state.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_source_delay_ms() -> u64 {
    300
}

fn default_access_token_env() -> String {
    "VK_ACCESS_TOKEN".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_db_path: default_state_db_path(),
            log_level: default_log_level(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            from_subscriptions: false,
            sources: vec![],
            exclude_sources: vec![],
            source_delay_ms: default_source_delay_ms(),
        }
    }
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            access_token_env: default_access_token_env(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("VK_WALL_WATCH")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# vk-wall-watch configuration

[general]
state_db_path = "./state.sqlite"
log_level = "info"

[watch]
poll_interval_secs = 60
# Explicit source list: negative ids are groups/pages, positive are profiles
sources = ["-123456"]
# Or derive sources from the account's subscription list instead:
from_subscriptions = false
# Subscriptions to skip (matched by id, negated id, or screen name)
exclude_sources = []
# Pause between per-source API calls, in milliseconds
source_delay_ms = 300

[vk]
access_token_env = "VK_ACCESS_TOKEN"
"#
        .to_string()
    }
}
