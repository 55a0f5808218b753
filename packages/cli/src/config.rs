use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_CONFIG_NAME: &str = "litebuilder.config.json";

/// LiteBuilder configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding one JSON file per project
    #[serde(default = "default_projects_dir")]
    pub projects_dir: String,

    /// Template for `new` when none is given
    #[serde(default = "default_template")]
    pub default_template: String,

    /// trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_projects_dir() -> String {
    "projects".to_string()
}

fn default_template() -> String {
    litebuilder_editor::DEFAULT_TEMPLATE.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get absolute path to the projects directory
    pub fn get_projects_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.projects_dir)
    }

    /// Max log level; unknown names fall back to warn
    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::WARN)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir(),
            default_template: default_template(),
            log_level: default_log_level(),
        }
    }
}
