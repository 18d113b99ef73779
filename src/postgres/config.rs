use std::str::FromStr;

use tokio_postgres::Config as PgConfig;

use crate::config::ConnectionConfig;
use crate::error::{DbManagerError, Result};

/// Build a `tokio-postgres` config from a `postgresql://` URL (optionally `jdbc:`
/// prefixed). Explicit credentials override any embedded in the URL.
pub(super) fn build_pg_config(config: &ConnectionConfig) -> Result<PgConfig> {
    let mut pg_config = PgConfig::from_str(config.url_without_jdbc_prefix()).map_err(|e| {
        DbManagerError::ConfigError(format!("invalid PostgreSQL url {}: {e}", config.url))
    })?;

    if !config.username.is_empty() {
        pg_config.user(&config.username);
    }
    if !config.password.is_empty() {
        pg_config.password(&config.password);
    }

    if pg_config.get_hosts().is_empty() {
        return Err(DbManagerError::ConfigError(
            "host is required".to_string(),
        ));
    }
    if pg_config.get_dbname().is_none() {
        return Err(DbManagerError::ConfigError(
            "dbname is required".to_string(),
        ));
    }
    if pg_config.get_user().is_none() {
        return Err(DbManagerError::ConfigError(
            "user is required".to_string(),
        ));
    }

    Ok(pg_config)
}
