//! Convenient imports for common functionality.

pub use crate::config::{ConnectionConfig, DbConfig};
pub use crate::connection::{Connection, Connector};
pub use crate::dialect::Dialect;
pub use crate::error::{DbManagerError, Result};
pub use crate::factory::DatabaseManagerFactory;
pub use crate::fixtures::{FixtureRow, load_fixture, load_fixture_from_reader};
pub use crate::manager::{DatabaseManager, TransactionState};
pub use crate::results::{ResultSet, Row};
pub use crate::types::{Backend, DbValue};
