//! Store connection settings and the strategies that produce them.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{AppError, Result};

/// Default key-value store port.
pub const DEFAULT_STORE_PORT: u16 = 6379;

/// Connection parameters for the key-value store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Password for `AUTH`, if any.
    pub password: Option<String>,
    /// Database index.
    pub db: i64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_STORE_PORT,
            password: None,
            db: 0,
        }
    }
}

impl StoreSettings {
    /// Connection URL with the password percent-encoded.
    pub fn connection_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("redis://{}:{}/{}", self.host, self.port, self.db))
            .map_err(|e| AppError::StoreUnavailable(format!("invalid store address: {}", e)))?;

        if let Some(password) = &self.password {
            url.set_password(Some(password)).map_err(|()| {
                AppError::StoreUnavailable(format!("cannot attach password to {}", self.host))
            })?;
        }

        Ok(url)
    }
}

// Never print the password.
impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("db", &self.db)
            .finish()
    }
}

impl fmt::Display for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = if self.password.is_some() { ":***@" } else { "" };
        write!(f, "redis://{}{}:{}/{}", auth, self.host, self.port, self.db)
    }
}

/// On-disk settings document.
#[derive(Debug, Deserialize)]
struct SettingsFile {
    redis_host: String,
    redis_password: String,
    #[serde(default)]
    redis_port: Option<u16>,
}

/// Strategy for obtaining store settings on each request.
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// Client library defaults: `localhost:6379`, no password.
    Implicit,
    /// A literal fixed when the process starts.
    Inline(StoreSettings),
    /// A JSON file with `redis_host` and `redis_password`, read per request.
    JsonFile(PathBuf),
}

impl SettingsSource {
    /// Produce the settings for one request.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self) -> Result<StoreSettings> {
        match self {
            SettingsSource::Implicit => Ok(StoreSettings::default()),
            SettingsSource::Inline(settings) => Ok(settings.clone()),
            SettingsSource::JsonFile(path) => read_settings_file(path).await,
        }
    }

    /// Short name for logs.
    pub fn describe(&self) -> String {
        match self {
            SettingsSource::Implicit => "implicit defaults".to_string(),
            SettingsSource::Inline(settings) => format!("inline {}", settings),
            SettingsSource::JsonFile(path) => format!("json file {}", path.display()),
        }
    }
}

async fn read_settings_file(path: &Path) -> Result<StoreSettings> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::SettingsFile {
            path: path.to_path_buf(),
            source,
        })?;

    let parsed = parse_settings(&raw).map_err(|source| AppError::SettingsFormat {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), settings = %parsed, "Loaded store settings");
    Ok(parsed)
}

fn parse_settings(raw: &str) -> std::result::Result<StoreSettings, serde_json::Error> {
    let file: SettingsFile = serde_json::from_str(raw)?;

    Ok(StoreSettings {
        host: file.redis_host,
        port: file.redis_port.unwrap_or(DEFAULT_STORE_PORT),
        password: Some(file.redis_password).filter(|p| !p.is_empty()),
        db: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn connection_url_encodes_password() {
        let settings = StoreSettings {
            host: "10.0.0.7".to_string(),
            port: 6380,
            password: Some("p@ss word".to_string()),
            db: 2,
        };
        let url = settings.connection_url().unwrap();
        assert_eq!(url.as_str(), "redis://:p%40ss%20word@10.0.0.7:6380/2");
    }

    #[test]
    fn display_and_debug_hide_password() {
        let settings = StoreSettings {
            password: Some("foobared".to_string()),
            ..StoreSettings::default()
        };
        assert_eq!(settings.to_string(), "redis://:***@localhost:6379/0");
        assert!(!format!("{:?}", settings).contains("foobared"));
    }

    #[test]
    fn parse_settings_requires_both_keys() {
        assert!(parse_settings(r#"{"redis_host": "db"}"#).is_err());
        assert!(parse_settings("not json").is_err());

        let settings =
            parse_settings(r#"{"redis_host": "db", "redis_password": "s3cret"}"#).unwrap();
        assert_eq!(settings.host, "db");
        assert_eq!(settings.port, DEFAULT_STORE_PORT);
        assert_eq!(settings.password.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn implicit_source_uses_defaults() {
        let settings = SettingsSource::Implicit.resolve().await.unwrap();
        assert_eq!(settings, StoreSettings::default());
    }

    #[tokio::test]
    async fn json_file_is_read_on_every_resolve() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"redis_host": "first", "redis_password": "a"}}"#).unwrap();
        file.flush().unwrap();

        let source = SettingsSource::JsonFile(file.path().to_path_buf());
        assert_eq!(source.resolve().await.unwrap().host, "first");

        std::fs::write(
            file.path(),
            r#"{"redis_host": "second", "redis_password": "b", "redis_port": 7000}"#,
        )
        .unwrap();
        let settings = source.resolve().await.unwrap();
        assert_eq!(settings.host, "second");
        assert_eq!(settings.port, 7000);
    }

    #[tokio::test]
    async fn missing_json_file_is_a_settings_error() {
        let source = SettingsSource::JsonFile(PathBuf::from("/nonexistent/config.json"));
        let err = source.resolve().await.unwrap_err();
        assert!(matches!(err, AppError::SettingsFile { .. }));
    }

    #[tokio::test]
    async fn malformed_json_file_is_a_format_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"redis_host\": ").unwrap();
        file.flush().unwrap();

        let source = SettingsSource::JsonFile(file.path().to_path_buf());
        let err = source.resolve().await.unwrap_err();
        assert!(matches!(err, AppError::SettingsFormat { .. }));
    }
}
