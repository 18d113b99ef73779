use crate::config::{ConnectionConfig, DbConfig};
use crate::connection::Connector;
use crate::error::{DbManagerError, Result};
use crate::manager::DatabaseManager;
use crate::types::Backend;

/// The connection constructor compiled in for `backend`.
///
/// # Errors
/// Returns `ConfigError` if support for `backend` was disabled at compile time.
pub fn connector(backend: Backend) -> Result<Connector> {
    match backend {
        #[cfg(feature = "mysql")]
        Backend::MySql => Ok(crate::mysql::connect),
        #[cfg(not(feature = "mysql"))]
        Backend::MySql => Err(compiled_out(backend, "mysql")),

        #[cfg(feature = "postgres")]
        Backend::PostgreSql => Ok(crate::postgres::connect),
        #[cfg(not(feature = "postgres"))]
        Backend::PostgreSql => Err(compiled_out(backend, "postgres")),

        #[cfg(feature = "mssql")]
        Backend::SqlServer => Ok(crate::mssql::connect),
        #[cfg(not(feature = "mssql"))]
        Backend::SqlServer => Err(compiled_out(backend, "mssql")),

        #[cfg(feature = "oracle")]
        Backend::Oracle => Ok(crate::oracle::connect),
        #[cfg(not(feature = "oracle"))]
        Backend::Oracle => Err(compiled_out(backend, "oracle")),
    }
}

#[allow(dead_code)]
fn compiled_out(backend: Backend, feature: &str) -> DbManagerError {
    DbManagerError::ConfigError(format!(
        "{backend} support is not compiled in; enable the `{feature}` feature"
    ))
}

impl DatabaseManager {
    /// Build a manager for `backend` using the built-in connector.
    ///
    /// # Errors
    /// Returns `ConfigError` if support for `backend` was disabled at compile time.
    pub fn new(backend: Backend, config: ConnectionConfig) -> Result<Self> {
        Ok(Self::with_connector(backend, config, connector(backend)?))
    }
}

/// Builds managers from configuration.
#[derive(Debug, Clone, Default)]
pub struct DatabaseManagerFactory {
    config: DbConfig,
}

impl DatabaseManagerFactory {
    #[must_use]
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Build an unconnected manager for `kind` (`mysql`, `postgresql`, `sqlserver`,
    /// or `oracle`, in any letter case).
    ///
    /// # Errors
    /// `UnsupportedBackend` for any other kind; `ConfigError` if the backend's settings
    /// are missing or its support is compiled out.
    pub fn create_manager(&self, kind: &str) -> Result<DatabaseManager> {
        let backend: Backend = kind.parse()?;
        self.create_manager_for(backend)
    }

    /// # Errors
    /// Same as [`create_manager`](DatabaseManagerFactory::create_manager), minus the
    /// kind parsing.
    pub fn create_manager_for(&self, backend: Backend) -> Result<DatabaseManager> {
        let connector = connector(backend)?;
        let info = self.config.database_info(backend)?;
        tracing::debug!(backend = %backend, driver = %info.driver, "creating database manager");
        Ok(DatabaseManager::with_connector(backend, info, connector))
    }

    /// Build a manager for the configured `default.database` (MySQL when unset).
    ///
    /// # Errors
    /// Same as [`create_manager`](DatabaseManagerFactory::create_manager).
    pub fn create_default_manager(&self) -> Result<DatabaseManager> {
        self.create_manager(&self.config.default_database())
    }
}
