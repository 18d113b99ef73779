use super::Connection;
use crate::error::Result;
use crate::results::RawResult;
use crate::types::DbValue;

/// A borrowed view of a connection that ignores [`close`](Connection::close).
///
/// Handed out while a transaction is active so that per-statement cleanup does not tear
/// down the session the transaction lives on. The view never owns the connection and
/// cannot outlive it.
pub struct NonClosingConnection<'a> {
    inner: &'a mut dyn Connection,
}

impl<'a> NonClosingConnection<'a> {
    pub fn new(inner: &'a mut dyn Connection) -> Self {
        Self { inner }
    }
}

impl Connection for NonClosingConnection<'_> {
    fn query(&mut self, sql: &str, params: &[DbValue]) -> Result<RawResult> {
        self.inner.query(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64> {
        self.inner.execute(sql, params)
    }

    fn auto_commit(&self) -> bool {
        self.inner.auto_commit()
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        self.inner.set_auto_commit(enabled)
    }

    fn commit(&mut self) -> Result<()> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<()> {
        self.inner.rollback()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
