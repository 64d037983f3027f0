//! Configuration file loading and setting resolution
//!
//! Every setting resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Contents of a service TOML config file
///
/// Every field is optional so that an absent key falls through to the
/// compiled default instead of overriding it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerSection,
    pub backend: BackendSection,
    pub compute: ComputeSection,
    pub logging: LoggingConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub secret_key: Option<String>,
}

/// `[backend]` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendSection {
    /// Base address of the system of record, e.g. `http://django:8000`
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// `[compute]` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComputeSection {
    /// Lower bound of the simulated computation delay
    pub delay_min_ms: Option<u64>,
    /// Upper bound of the simulated computation delay
    pub delay_max_ms: Option<u64>,
    /// Upper bound on a synchronous calculation, end to end
    pub sync_deadline_secs: Option<u64>,
}

/// `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (e.g. "info", "debug")
    pub level: Option<String>,
}

/// Locate the config file for a module
///
/// CLI path wins, then the environment variable, then
/// `<config_dir>/mca/<file_name>`. Returns None only when no platform config
/// directory exists.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_value(env_var_name) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|d| d.join("mca").join(file_name))
}

/// Load a TOML config file
///
/// A missing file is not an error: the caller gets an empty config and every
/// setting falls through to its default. A file that exists but cannot be
/// read or parsed is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!("Config file not found, using defaults: {}", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Read an environment variable, treating an empty value as unset
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Resolve one setting across CLI, environment, TOML and default
///
/// An environment value that does not parse is reported rather than silently
/// skipped, since it almost always means a deployment typo.
pub fn resolve_setting<T>(
    cli_arg: Option<T>,
    env_var_name: Option<&str>,
    toml_value: Option<T>,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(value) = cli_arg {
        return Ok(value);
    }

    if let Some(name) = env_var_name {
        if let Some(raw) = env_value(name) {
            return raw
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Invalid value for {}: {} ({})", name, raw, e)));
        }
    }

    Ok(toml_value.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_value_wins() {
        let value = resolve_setting(Some(1u16), None, Some(2), 3).unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn test_toml_value_beats_default() {
        let value = resolve_setting::<u16>(None, None, Some(2), 3).unwrap();
        assert_eq!(value, 2);
    }

    #[test]
    fn test_default_used_when_nothing_set() {
        let value = resolve_setting::<String>(None, None, None, "fallback".to_string()).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_partial_toml_parses() {
        let config: TomlConfig = toml::from_str(
            r#"
            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, Some(9000));
        assert!(config.server.secret_key.is_none());
        assert!(config.backend.base_url.is_none());
        assert_eq!(config.logging, LoggingConfig::default());
    }
}
