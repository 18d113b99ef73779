//! Materialized query results.
//!
//! Drivers hand back a [`RawResult`] with column labels exactly as the server reported
//! them; [`ResultSet::from_raw`] normalizes those labels to lowercase once and shares
//! them between all rows.

mod result_set;
mod row;

pub use result_set::{RawResult, ResultSet};
pub use row::Row;
