//! `PostgreSQL` backend over `tokio-postgres`.

mod config;
mod connection;
mod params;
mod query;

pub use connection::{PostgresConnection, connect};
