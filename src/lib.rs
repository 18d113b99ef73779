//! Blocking database access for MySQL, `PostgreSQL`, SQL Server and Oracle.
//!
//! A [`DatabaseManager`] owns the credentials for one backend and runs positional
//! statements (`?` placeholders) with per-statement connections, or on one pinned
//! connection between [`begin_transaction`](DatabaseManager::begin_transaction) and
//! commit/rollback. [`DatabaseManagerFactory`] builds managers from configuration.
//!
//! ```rust,no_run
//! use db_manager::prelude::*;
//!
//! # fn main() -> db_manager::Result<()> {
//! let factory = DatabaseManagerFactory::new(DbConfig::load("db.toml")?);
//! let mut db = factory.create_manager("postgresql")?;
//!
//! db.create_table_if_absent("users", "id INT, name VARCHAR(100), age INT")?;
//! db.execute_update(
//!     "INSERT INTO users (id, name, age) VALUES (?, ?, ?)",
//!     &[1.into(), "Jean Dupont".into(), 35.into()],
//! )?;
//!
//! for row in &db.execute_query("SELECT * FROM users WHERE age > ?", &[25.into()])? {
//!     println!("{:?}", row.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(any(feature = "postgres", feature = "mysql", feature = "mssql"))]
mod blocking;

pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod factory;
pub mod fixtures;
pub mod manager;
pub mod prelude;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "oracle")]
pub mod oracle;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use config::{ConnectionConfig, DbConfig};
pub use connection::{Connection, Connector};
pub use dialect::Dialect;
pub use error::{DbManagerError, Result};
pub use factory::DatabaseManagerFactory;
pub use manager::{DatabaseManager, TransactionState};
pub use results::{ResultSet, Row};
pub use types::{Backend, DbValue};
