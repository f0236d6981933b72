use std::time::Duration;

use serde::Deserialize;
use strum::{Display, EnumString};

use crate::error::InitError;

/// Report format written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_namespace_candidates")]
    pub namespace_candidates: Vec<String>,

    #[serde(default = "default_workload_keyword")]
    pub workload_keyword: String,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    #[serde(default = "default_health_scheme")]
    pub health_scheme: String,

    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    #[serde(default)]
    pub output: OutputFormat,

    #[serde(default = "default_color")]
    pub color: bool,

    #[serde(default = "default_purpose_label")]
    pub purpose_label: String,
}

fn default_namespace_candidates() -> Vec<String> {
    vec!["druid".to_string(), "apache-druid".to_string()]
}

fn default_workload_keyword() -> String {
    "druid".to_string()
}

fn default_health_path() -> String {
    "/status/health".to_string()
}

fn default_health_scheme() -> String {
    "https".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn default_purpose_label() -> String {
    "app.kubernetes.io/component".to_string()
}

impl Config {
    /// Load settings from `.env`, an optional `druid-smoke.*` file and `SMOKE_*` variables
    pub fn load() -> Result<Self, InitError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("druid-smoke").required(false))
            .add_source(
                config::Environment::with_prefix("SMOKE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("namespace_candidates"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// URL probed for a discovered ingress host
    pub fn health_url(&self, host: &str) -> String {
        format!("{}://{}{}", self.health_scheme, host, self.health_path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace_candidates: default_namespace_candidates(),
            workload_keyword: default_workload_keyword(),
            health_path: default_health_path(),
            health_scheme: default_health_scheme(),
            probe_timeout_secs: default_probe_timeout_secs(),
            output: OutputFormat::default(),
            color: default_color(),
            purpose_label: default_purpose_label(),
        }
    }
}
