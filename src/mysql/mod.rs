//! MySQL backend over `sqlx`.

mod connection;
mod params;
mod query;

pub use connection::{MysqlConnection, connect};
