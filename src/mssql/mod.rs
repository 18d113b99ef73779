//! SQL Server backend over `tiberius`.

mod config;
mod connection;
mod params;
mod query;

pub use connection::{MssqlConnection, connect};
