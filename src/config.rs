//! Layered runtime settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional config
//! file, `SANCTUARY_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::data::duration::parse_duration;

/// Environment variable prefix, e.g. `SANCTUARY_ENDPOINT`.
pub const ENV_PREFIX: &str = "SANCTUARY";

pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:5001/socket.io/?EIO=4&transport=websocket";
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5001";

/// Which color theme to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    /// Pick from the terminal background.
    Auto,
    Dark,
    Light,
}

/// Resolved settings for one dashboard run.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Live channel endpoint (`ws://` or `wss://`).
    pub endpoint: String,
    /// Root of the HTTP API serving `/api/pod-states`.
    pub api_base: String,
    pub pods_enabled: bool,
    #[serde(deserialize_with = "duration_str")]
    pub refresh_interval: Duration,
    #[serde(deserialize_with = "duration_str")]
    pub display_interval: Duration,
    #[serde(deserialize_with = "duration_str")]
    pub request_timeout: Duration,
    pub theme: ThemeChoice,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub api_base: Option<String>,
    pub pods_enabled: Option<bool>,
    pub refresh_interval: Option<String>,
    pub display_interval: Option<String>,
    pub theme: Option<String>,
    pub log_file: Option<String>,
}

impl Settings {
    /// Load settings from all layers.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(
            config_file,
            Environment::with_prefix(ENV_PREFIX),
            overrides,
        )
    }

    fn load_with_env(
        config_file: Option<&Path>,
        env: Environment,
        overrides: &Overrides,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("endpoint", DEFAULT_ENDPOINT)?
            .set_default("api_base", DEFAULT_API_BASE)?
            .set_default("pods_enabled", true)?
            .set_default("refresh_interval", "10s")?
            .set_default("display_interval", "1s")?
            .set_default("request_timeout", "5s")?
            .set_default("theme", "auto")?
            .set_default("log_level", "info")?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(env)
            .set_override_option("endpoint", overrides.endpoint.clone())?
            .set_override_option("api_base", overrides.api_base.clone())?
            .set_override_option("pods_enabled", overrides.pods_enabled)?
            .set_override_option("refresh_interval", overrides.refresh_interval.clone())?
            .set_override_option("display_interval", overrides.display_interval.clone())?
            .set_override_option("theme", overrides.theme.clone())?
            .set_override_option("log_file", overrides.log_file.clone())?
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Invalid configuration")
    }
}

fn duration_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}
