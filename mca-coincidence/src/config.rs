//! Configuration resolution for mca-coincidence
//!
//! Each setting resolves CLI → ENV → TOML → default. The TOML file itself is
//! located by `--config`, then `MCA_CONFIG`, then
//! `<config_dir>/mca/mca-coincidence.toml`.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mca_common::api::SharedSecret;
use mca_common::config::{load_toml_config, resolve_config_path, resolve_setting, TomlConfig};
use mca_common::{Error, Result};

use crate::services::{RandomSource, UniformDelay};

pub const DEFAULT_BACKEND_URL: &str = "http://django:8000";
pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_SECRET_KEY: &str = "music_analysis_secret_2024";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DELAY_MIN_MS: u64 = 5_000;
pub const DEFAULT_DELAY_MAX_MS: u64 = 10_000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const CONFIG_ENV_VAR: &str = "MCA_CONFIG";
pub const CONFIG_FILE_NAME: &str = "mca-coincidence.toml";

const BACKEND_URL_ENV_VAR: &str = "DJANGO_API_URL";
const PORT_ENV_VAR: &str = "PORT";
const BIND_ENV_VAR: &str = "MCA_BIND_ADDRESS";
const SECRET_ENV_VAR: &str = "MCA_SECRET_KEY";

/// Command-line arguments for mca-coincidence
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "mca-coincidence")]
#[command(about = "Composer coincidence calculation service")]
#[command(version)]
pub struct CliArgs {
    /// Path to TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Base URL of the backend, e.g. http://django:8000
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Address to bind to
    #[arg(long)]
    pub bind: Option<IpAddr>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Config file that was consulted (may not exist)
    pub config_path: Option<PathBuf>,
    pub bind_address: IpAddr,
    pub port: u16,
    /// Backend base URL without trailing `/`
    pub backend_url: String,
    pub secret: SharedSecret,
    pub request_timeout: Duration,
    pub delay_min: Duration,
    pub delay_max: Duration,
    /// End-to-end limit for the sync endpoint; None waits indefinitely
    pub sync_deadline: Option<Duration>,
    /// Filter directive used when RUST_LOG is unset
    pub log_level: String,
}

impl ServiceConfig {
    /// Locate and load the config file, then resolve every setting
    pub fn resolve(cli: &CliArgs) -> Result<Self> {
        let config_path =
            resolve_config_path(cli.config.as_deref(), CONFIG_ENV_VAR, CONFIG_FILE_NAME);

        let toml_config = match &config_path {
            Some(path) => load_toml_config(path)?,
            None => TomlConfig::default(),
        };

        let mut config = Self::from_sources(cli, &toml_config)?;
        config.config_path = config_path;
        Ok(config)
    }

    /// Resolve settings from CLI, environment and an already-loaded TOML file
    pub fn from_sources(cli: &CliArgs, toml_config: &TomlConfig) -> Result<Self> {
        let toml_bind = toml_config
            .server
            .bind_address
            .as_deref()
            .map(|raw| {
                raw.parse::<IpAddr>()
                    .map_err(|e| Error::Config(format!("Invalid server.bind_address {}: {}", raw, e)))
            })
            .transpose()?;

        let bind_address = resolve_setting(
            cli.bind,
            Some(BIND_ENV_VAR),
            toml_bind,
            DEFAULT_BIND_ADDRESS
                .parse()
                .map_err(|e| Error::Config(format!("Invalid default bind address: {}", e)))?,
        )?;

        let port = resolve_setting(cli.port, Some(PORT_ENV_VAR), toml_config.server.port, DEFAULT_PORT)?;

        let backend_url = resolve_setting(
            cli.backend_url.clone(),
            Some(BACKEND_URL_ENV_VAR),
            toml_config.backend.base_url.clone(),
            DEFAULT_BACKEND_URL.to_string(),
        )?
        .trim_end_matches('/')
        .to_string();

        let secret_value = resolve_setting(
            None,
            Some(SECRET_ENV_VAR),
            toml_config.server.secret_key.clone(),
            DEFAULT_SECRET_KEY.to_string(),
        )?;

        let compute = &toml_config.compute;
        let delay_min_ms = compute.delay_min_ms.unwrap_or(DEFAULT_DELAY_MIN_MS);
        let delay_max_ms = compute.delay_max_ms.unwrap_or(DEFAULT_DELAY_MAX_MS);

        let log_level = toml_config
            .logging
            .level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let request_timeout_secs = toml_config
            .backend
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        // Validation
        if backend_url.is_empty() {
            return Err(Error::Config("Backend URL must not be empty".to_string()));
        }
        if delay_min_ms > delay_max_ms {
            return Err(Error::Config(format!(
                "compute.delay_min_ms ({}) exceeds compute.delay_max_ms ({})",
                delay_min_ms, delay_max_ms
            )));
        }
        if request_timeout_secs == 0 {
            return Err(Error::Config(
                "backend.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        let secret = SharedSecret::new(secret_value).map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            config_path: None,
            bind_address,
            port,
            backend_url,
            secret,
            request_timeout: Duration::from_secs(request_timeout_secs),
            delay_min: Duration::from_millis(delay_min_ms),
            delay_max: Duration::from_millis(delay_max_ms),
            sync_deadline: compute.sync_deadline_secs.map(Duration::from_secs),
            log_level,
        })
    }

    /// Production delay policy for the configured bounds
    pub fn delay_policy(&self, random: Arc<dyn RandomSource>) -> UniformDelay {
        UniformDelay::new(self.delay_min, self.delay_max, random)
    }
}
