//! Loading tabular test fixtures.
//!
//! A fixture is a comma-separated file whose first line names the columns:
//!
//! ```text
//! name,age,email
//! Jean Dupont,35,jean@example.com
//! Marie Martin,28
//! ```
//!
//! Every following line becomes a map from column name to value. Names and values
//! are trimmed, and columns missing from a short line map to `""`.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::error::{DbManagerError, Result};

/// One fixture line keyed by column name.
pub type FixtureRow = HashMap<String, String>;

/// Load a fixture file.
///
/// # Errors
/// Returns `FixtureError` if the file cannot be opened or read.
pub fn load_fixture(path: impl AsRef<Path>) -> Result<Vec<FixtureRow>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        DbManagerError::FixtureError(format!("cannot open fixture {}: {e}", path.display()))
    })?;
    load_fixture_from_reader(file)
}

/// Load fixture rows from any reader. Empty input yields no rows.
///
/// # Errors
/// Returns `FixtureError` if the input cannot be read or is not valid UTF-8.
pub fn load_fixture_from_reader(reader: impl Read) -> Result<Vec<FixtureRow>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut records = csv_reader.records();

    let Some(header) = records.next().transpose()? else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header.iter().map(str::to_string).collect();

    records
        .map(|record| {
            let record = record?;
            Ok(headers
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.clone(), record.get(idx).unwrap_or("").to_string()))
                .collect())
        })
        .collect()
}
