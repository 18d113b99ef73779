use std::borrow::Cow;

use super::DatabaseManager;
use crate::error::{DbManagerError, Result};
use crate::results::ResultSet;
use crate::translation::{count_placeholders, translate_placeholders};
use crate::types::DbValue;

impl DatabaseManager {
    /// Run a `SELECT` and materialize every row.
    ///
    /// `sql` uses `?` for positional parameters on every backend; `params[0]` binds to
    /// the first marker. Column labels in the returned rows are lower-cased.
    ///
    /// # Errors
    /// `QueryError` for a parameter-count mismatch or a statement the server rejects,
    /// `ConnectionError` if no usable connection can be obtained.
    pub fn execute_query(&mut self, sql: &str, params: &[DbValue]) -> Result<ResultSet> {
        let sql = self.bind_template(sql, params)?;
        tracing::debug!(backend = %self.backend, sql = %sql, params = params.len(), "query");

        let mut conn = self.scoped_connection()?;
        let raw = conn.query(&sql, params)?;
        conn.finish()?;

        Ok(ResultSet::from_raw(raw))
    }

    /// Run an `INSERT`, `UPDATE`, `DELETE`, or DDL statement and return the affected-row count.
    ///
    /// # Errors
    /// Same as [`execute_query`](DatabaseManager::execute_query).
    pub fn execute_update(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
        let sql = self.bind_template(sql, params)?;
        tracing::debug!(backend = %self.backend, sql = %sql, params = params.len(), "update");

        let mut conn = self.scoped_connection()?;
        let affected = conn.execute(&sql, params)?;
        conn.finish()?;

        Ok(affected)
    }

    /// Create `table` unless it already exists.
    ///
    /// `columns` is the column definition list without the surrounding parentheses.
    ///
    /// # Errors
    /// Returns any error from [`execute_update`](DatabaseManager::execute_update).
    pub fn create_table_if_absent(&mut self, table: &str, columns: &str) -> Result<u64> {
        let sql = self.dialect().create_table_if_absent(table, columns);
        self.execute_update(&sql, &[])
    }

    /// Drop `table` if it exists.
    ///
    /// # Errors
    /// Returns any error from [`execute_update`](DatabaseManager::execute_update).
    pub fn drop_table_if_present(&mut self, table: &str) -> Result<u64> {
        let sql = self.dialect().drop_table_if_present(table);
        self.execute_update(&sql, &[])
    }

    /// Number of rows in `table`.
    ///
    /// # Errors
    /// Returns any error from [`execute_query`](DatabaseManager::execute_query), or
    /// `QueryError` if the count column is missing or not an integer.
    pub fn count_all(&mut self, table: &str) -> Result<i64> {
        let sql = self.dialect().count_all(table);
        let rs = self.execute_query(&sql, &[])?;
        rs.first()
            .and_then(|row| row.get("count"))
            .and_then(DbValue::as_int)
            .ok_or_else(|| {
                DbManagerError::QueryError(format!("count query on {table} returned no count"))
            })
    }

    /// Check the parameter count and rewrite markers into the backend's syntax.
    fn bind_template<'q>(&self, sql: &'q str, params: &[DbValue]) -> Result<Cow<'q, str>> {
        let style = self.dialect().placeholder_style();
        let expected = count_placeholders(sql, style);
        if expected != params.len() {
            return Err(DbManagerError::QueryError(format!(
                "statement expects {expected} parameter(s) but {} were supplied",
                params.len()
            )));
        }
        Ok(translate_placeholders(sql, style))
    }
}
