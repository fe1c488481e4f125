use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sprocket_core::{CalculationService, HttpCalculationService, LocalCalculationService};

/// Environment variable prefix, e.g. `SPROCKET__SERVICE__URL`
pub const ENV_PREFIX: &str = "SPROCKET";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// Remote calculation service over HTTP
    #[default]
    Http,
    /// In-process cost engine
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_url")]
    pub url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub mode: ServiceMode,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            url: default_service_url(),
            timeout_seconds: default_timeout_seconds(),
            mode: ServiceMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            output_dir: default_output_dir(),
        }
    }
}

fn default_service_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl ServiceConfig {
    /// Build the configured calculation service
    pub fn build(&self) -> anyhow::Result<Box<dyn CalculationService>> {
        Ok(match self.mode {
            ServiceMode::Http => Box::new(HttpCalculationService::new(
                &self.url,
                Duration::from_secs(self.timeout_seconds),
            )?),
            ServiceMode::Local => Box::new(LocalCalculationService),
        })
    }
}

/// Load configuration from an optional TOML file, then `SPROCKET__*` variables.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.service.mode == ServiceMode::Http && cfg.service.url.trim().is_empty() {
        anyhow::bail!("service.url must not be empty");
    }
    if cfg.service.timeout_seconds == 0 {
        anyhow::bail!("service.timeout_seconds must be greater than 0");
    }
    Ok(())
}
