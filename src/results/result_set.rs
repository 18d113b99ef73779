use std::sync::Arc;

use super::row::{Row, build_column_index};
use crate::types::DbValue;

/// Tabular result as produced by a backend connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    /// Column labels in result order, with the backend's own casing
    pub columns: Vec<String>,
    /// One vector per row, aligned with `columns`
    pub rows: Vec<Vec<DbValue>>,
}

impl RawResult {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, values: Vec<DbValue>) {
        self.rows.push(values);
    }
}

/// Rows returned by a query, in the order the server produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<Row>,
    column_names: Arc<Vec<String>>,
}

impl ResultSet {
    /// Materialize driver output, lower-casing every column label.
    #[must_use]
    pub fn from_raw(raw: RawResult) -> Self {
        let column_names: Arc<Vec<String>> =
            Arc::new(raw.columns.iter().map(|c| c.to_lowercase()).collect());
        let column_index = Arc::new(build_column_index(&column_names));

        let rows = raw
            .rows
            .into_iter()
            .map(|values| Row::with_index(column_names.clone(), column_index.clone(), values))
            .collect();

        Self { rows, column_names }
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
