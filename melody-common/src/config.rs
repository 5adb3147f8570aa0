//! Configuration loading and client settings resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and the
//! compiled defaults are used.

use crate::time::secs_to_duration;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const ENV_BACKEND_URL: &str = "MELODY_BACKEND_URL";
pub const ENV_DISPLAY_MANIFEST: &str = "MELODY_DISPLAY_MANIFEST";
pub const ENV_LOG_LEVEL: &str = "MELODY_LOG_LEVEL";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the Melody backend (e.g. `http://localhost:8080`)
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Display plugin manifest location (file path or http(s) URL)
    #[serde(default)]
    pub display_manifest: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Per-request timeout for backend calls, in seconds
    #[serde(default)]
    pub request_secs: Option<u64>,

    /// Per-load timeout for display plugin resolution, in seconds
    #[serde(default)]
    pub plugin_load_secs: Option<u64>,
}

/// Compiled fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub backend_url: String,
    pub display_manifest: String,
    pub log_level: String,
    pub request_timeout: Duration,
    pub plugin_load_timeout: Duration,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8080".to_string(),
            display_manifest: "displayPlugins.txt".to_string(),
            log_level: "info".to_string(),
            request_timeout: Duration::from_secs(30),
            plugin_load_timeout: Duration::from_secs(10),
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub backend_url: Option<String>,
    pub display_manifest: Option<String>,
    pub log_level: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub plugin_load_timeout_secs: Option<u64>,
}

/// Fully resolved client settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub backend_url: String,
    pub display_manifest: String,
    pub log_level: String,
    pub request_timeout: Duration,
    pub plugin_load_timeout: Duration,
}

/// Resolves [`ClientSettings`] from CLI overrides, environment, TOML and defaults
pub struct SettingsResolver {
    config_file: Option<PathBuf>,
    explicit: bool,
}

impl SettingsResolver {
    /// Resolver that reads the platform default config file, if present
    pub fn new() -> Self {
        Self {
            config_file: default_config_path(),
            explicit: false,
        }
    }

    /// Resolver that reads the given config file
    ///
    /// Unlike the platform default, an explicit file must exist and parse.
    pub fn with_config_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_file: Some(path.into()),
            explicit: true,
        }
    }

    /// Load the TOML layer
    pub fn load_toml(&self) -> Result<TomlConfig> {
        let Some(path) = &self.config_file else {
            warn!("Could not determine config directory, using defaults");
            return Ok(TomlConfig::default());
        };

        if !path.exists() {
            if self.explicit {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(TomlConfig::default());
        }

        load_toml_file(path)
    }

    pub fn resolve(&self, overrides: &SettingsOverrides) -> Result<ClientSettings> {
        let toml_config = self.load_toml()?;
        let defaults = CompiledDefaults::default();

        let backend_url = pick(
            overrides.backend_url.clone(),
            ENV_BACKEND_URL,
            toml_config.backend_url,
        )
        .unwrap_or(defaults.backend_url);
        validate_backend_url(&backend_url)?;

        let display_manifest = pick(
            overrides.display_manifest.clone(),
            ENV_DISPLAY_MANIFEST,
            toml_config.display_manifest,
        )
        .unwrap_or(defaults.display_manifest);

        let log_level = pick(
            overrides.log_level.clone(),
            ENV_LOG_LEVEL,
            toml_config.logging.level,
        )
        .unwrap_or(defaults.log_level);

        let request_timeout = timeout_from(
            "request timeout",
            overrides
                .request_timeout_secs
                .or(toml_config.timeouts.request_secs),
            defaults.request_timeout,
        )?;
        let plugin_load_timeout = timeout_from(
            "plugin load timeout",
            overrides
                .plugin_load_timeout_secs
                .or(toml_config.timeouts.plugin_load_secs),
            defaults.plugin_load_timeout,
        )?;

        Ok(ClientSettings {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            display_manifest,
            log_level,
            request_timeout,
            plugin_load_timeout,
        })
    }
}

impl Default for SettingsResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// `<config_dir>/melody/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("melody").join("config.toml"))
}

fn load_toml_file(path: &Path) -> Result<TomlConfig> {
    debug!(path = %path.display(), "Loading config file");
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// CLI value, then non-blank environment value, then TOML value
fn pick(cli: Option<String>, env_var: &str, toml: Option<String>) -> Option<String> {
    cli.or_else(|| {
        std::env::var(env_var)
            .ok()
            .filter(|value| !value.trim().is_empty())
    })
    .or(toml)
}

fn timeout_from(what: &str, secs: Option<u64>, default: Duration) -> Result<Duration> {
    match secs {
        Some(0) => Err(Error::Config(format!("{} must be at least 1 second", what))),
        Some(secs) => Ok(secs_to_duration(secs)),
        None => Ok(default),
    }
}

fn validate_backend_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Backend URL must start with http:// or https://, got '{}'",
            url
        )))
    }
}
