//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use serde::Deserialize;
use strum::{Display, EnumString};

use crate::counter::CounterMode;
use crate::settings::{SettingsSource, StoreSettings};

/// Where the store connection settings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SettingsKind {
    /// Client library defaults.
    #[default]
    Implicit,
    /// `REDIS_*` variables, fixed at startup.
    Inline,
    /// JSON file re-read on every request.
    JsonFile,
}

/// What the single endpoint answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseKind {
    /// Increment the counter and greet.
    #[default]
    Counter,
    /// Return the message file verbatim.
    MessageFile,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Store Settings ===
    /// Settings strategy.
    #[serde(default)]
    pub settings_source: SettingsKind,

    /// Store host for the inline strategy.
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    /// Store port for the inline strategy.
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    /// Store password for the inline strategy.
    #[serde(default)]
    pub redis_password: Option<String>,

    /// Store database index for the inline strategy.
    #[serde(default)]
    pub redis_db: i64,

    /// Settings file for the json_file strategy.
    #[serde(default = "default_store_config_file")]
    pub store_config_file: PathBuf,

    // === Counter ===
    /// Key holding the counter.
    #[serde(default = "default_counter_key")]
    pub counter_key: String,

    /// Increment strategy.
    #[serde(default)]
    pub counter_mode: CounterMode,

    // === Response ===
    /// Response strategy.
    #[serde(default)]
    pub response_mode: ResponseKind,

    /// Text file served by the message_file response mode.
    #[serde(default = "default_message_file")]
    pub message_file: PathBuf,

    // === Metrics ===
    /// Prometheus exporter port. Disabled when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_store_config_file() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_counter_key() -> String {
    "hit_count".to_string()
}

fn default_message_file() -> PathBuf {
    PathBuf::from("custom_message.txt")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_source: SettingsKind::default(),
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            redis_password: None,
            redis_db: 0,
            store_config_file: default_store_config_file(),
            counter_key: default_counter_key(),
            counter_mode: CounterMode::default(),
            response_mode: ResponseKind::default(),
            message_file: default_message_file(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.counter_key.is_empty() {
            return Err("COUNTER_KEY must not be empty".to_string());
        }

        if self.settings_source == SettingsKind::Inline && self.redis_host.is_empty() {
            return Err("REDIS_HOST is required for the inline settings source".to_string());
        }

        if self.redis_db < 0 {
            return Err("REDIS_DB must not be negative".to_string());
        }

        if self.metrics_port == Some(0) {
            return Err("METRICS_PORT must not be 0".to_string());
        }

        Ok(())
    }

    /// Build the settings strategy this configuration selects.
    pub fn settings_source(&self) -> SettingsSource {
        match self.settings_source {
            SettingsKind::Implicit => SettingsSource::Implicit,
            SettingsKind::Inline => SettingsSource::Inline(StoreSettings {
                host: self.redis_host.clone(),
                port: self.redis_port,
                password: self.redis_password.clone().filter(|p| !p.is_empty()),
                db: self.redis_db,
            }),
            SettingsKind::JsonFile => SettingsSource::JsonFile(self.store_config_file.clone()),
        }
    }
}
