use std::fmt;
use std::path::Path;

use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::{DbManagerError, Result};
use crate::types::Backend;

/// Environment variables with this prefix override file settings, using `__` between
/// key segments: `DB_MANAGER_MYSQL__PASSWORD`, `DB_MANAGER_DEFAULT__DATABASE`.
pub const ENV_PREFIX: &str = "DB_MANAGER";

const DEFAULT_DATABASE: &str = "mysql";

/// Resolved connection settings for one backend.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    /// Driver identifier, kept for diagnostics
    #[serde(default)]
    pub driver: String,
    /// Backend URL; a leading `jdbc:` is accepted
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    /// The URL without a JDBC `jdbc:` prefix.
    #[must_use]
    pub fn url_without_jdbc_prefix(&self) -> &str {
        self.url
            .strip_prefix("jdbc:")
            .unwrap_or(self.url.as_str())
    }
}

// Keep passwords out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Per-backend database settings.
///
/// ```toml
/// [default]
/// database = "postgresql"
///
/// [postgresql]
/// driver = "tokio-postgres"
/// url = "postgresql://localhost:5432/test"
/// username = "postgres"
/// password = "secret"
/// ```
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    settings: Config,
}

impl DbConfig {
    /// Load settings from a file (format picked from the extension) overlaid with
    /// `DB_MANAGER_*` environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file is missing or cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path))
            .add_source(env_source())
            .build()
            .map_err(|e| {
                DbManagerError::ConfigError(format!(
                    "failed to load configuration from {}: {e}",
                    path.display()
                ))
            })?;
        Ok(Self { settings })
    }

    /// Settings from environment variables only.
    ///
    /// # Errors
    /// Returns `ConfigError` if the environment cannot be read into settings.
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder().add_source(env_source()).build()?;
        Ok(Self { settings })
    }

    /// Parse settings from an in-memory document.
    ///
    /// # Errors
    /// Returns `ConfigError` if the text is not valid for `format`.
    pub fn parse(text: &str, format: FileFormat) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(text, format))
            .build()?;
        Ok(Self { settings })
    }

    #[must_use]
    pub fn from_settings(settings: Config) -> Self {
        Self { settings }
    }

    /// Value of `default.database`, or `mysql` when absent.
    #[must_use]
    pub fn default_database(&self) -> String {
        self.settings
            .get_string("default.database")
            .unwrap_or_else(|_| DEFAULT_DATABASE.to_string())
    }

    /// Connection settings under `{backend}.*`.
    ///
    /// # Errors
    /// Returns `ConfigError` if the section or its `url` key is missing.
    pub fn database_info(&self, backend: Backend) -> Result<ConnectionConfig> {
        let key = backend.as_str();
        self.settings.get::<ConnectionConfig>(key).map_err(|e| {
            DbManagerError::ConfigError(format!(
                "missing or invalid configuration for {key} (expected at least {key}.url): {e}"
            ))
        })
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[default]
database = "postgresql"

[mysql]
driver = "sqlx-mysql"
url = "jdbc:mysql://localhost:3306/test"
username = "root"
password = "root"

[postgresql]
url = "postgresql://localhost:5432/test"
username = "postgres"
"#;

    #[test]
    fn resolves_backend_sections() {
        let cfg = DbConfig::parse(SAMPLE, FileFormat::Toml).unwrap();
        assert_eq!(cfg.default_database(), "postgresql");

        let mysql = cfg.database_info(Backend::MySql).unwrap();
        assert_eq!(mysql.driver, "sqlx-mysql");
        assert_eq!(mysql.url_without_jdbc_prefix(), "mysql://localhost:3306/test");
        assert_eq!(mysql.username, "root");
        assert_eq!(mysql.password, "root");

        let pg = cfg.database_info(Backend::PostgreSql).unwrap();
        assert_eq!(pg.driver, "");
        assert_eq!(pg.password, "");
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let cfg = DbConfig::parse(SAMPLE, FileFormat::Toml).unwrap();
        let err = cfg.database_info(Backend::Oracle).unwrap_err();
        assert!(matches!(err, DbManagerError::ConfigError(ref msg) if msg.contains("oracle.url")));
    }

    #[test]
    fn default_database_falls_back_to_mysql() {
        assert_eq!(DbConfig::default().default_database(), "mysql");
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = DbConfig::load(&path).unwrap();
        assert_eq!(
            cfg.database_info(Backend::PostgreSql).unwrap().url,
            "postgresql://localhost:5432/test"
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let err = DbConfig::load("/definitely/not/here/db.toml").unwrap_err();
        assert!(matches!(err, DbManagerError::ConfigError(_)));
    }

    #[test]
    fn debug_hides_password() {
        let conn = ConnectionConfig::new("mysql://h/db").with_credentials("u", "hunter2");
        assert!(!format!("{conn:?}").contains("hunter2"));
    }
}
