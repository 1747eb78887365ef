use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub etl: EtlConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(".")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Config::builder()
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/default")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/local")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub test_admin_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
    /// Directory holding one `<stream>.json` file per extracted stream.
    pub streams_path: String,
    /// Streams consumed from the batch; anything else the connector
    /// produced is ignored.
    #[serde(default = "EtlConfig::default_streams")]
    pub streams: Vec<String>,
    /// Civil offset attached to naive source timestamps, e.g. "-03:00".
    #[serde(default = "EtlConfig::default_timezone_offset")]
    pub timezone_offset: String,
}

impl EtlConfig {
    fn default_streams() -> Vec<String> {
        [
            "issues",
            "pull_requests",
            "commits",
            "issue_milestones",
            "assignees",
            "repositories",
            "branches",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    fn default_timezone_offset() -> String {
        "-03:00".to_string()
    }
}
