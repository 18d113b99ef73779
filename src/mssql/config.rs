use tiberius::{AuthMethod, Config as TiberiusConfig};

use crate::config::ConnectionConfig;
use crate::error::{DbManagerError, Result};

/// Build a tiberius config from a JDBC (`jdbc:sqlserver://host:port;databaseName=db`),
/// bare `sqlserver://` or ADO.NET style connection string.
pub(super) fn build_tiberius_config(config: &ConnectionConfig) -> Result<TiberiusConfig> {
    let url = config.url.trim();
    let parsed = if url.starts_with("jdbc:sqlserver://") {
        TiberiusConfig::from_jdbc_string(url)
    } else if let Some(rest) = url.strip_prefix("sqlserver://") {
        TiberiusConfig::from_jdbc_string(&format!("jdbc:sqlserver://{rest}"))
    } else {
        TiberiusConfig::from_ado_string(url)
    };
    let mut tiberius_config = parsed.map_err(|e| {
        DbManagerError::ConfigError(format!("invalid SQL Server url {url}: {e}"))
    })?;

    if !config.username.is_empty() {
        tiberius_config.authentication(AuthMethod::sql_server(
            &config.username,
            &config.password,
        ));
    }

    // Development servers ship self-signed certificates; honour explicit settings only.
    if !mentions_tls_option(url) {
        tiberius_config.trust_cert();
    }

    Ok(tiberius_config)
}

fn mentions_tls_option(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.contains("trustservercertificate") || lower.contains("encrypt")
}
