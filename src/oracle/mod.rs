//! Oracle backend over the `oracle` crate (ODPI-C).
//!
//! Needs the Oracle client libraries at run time, so it sits behind the opt-in
//! `oracle` feature.

mod connection;
mod url;

pub use connection::{OracleConnection, connect};
