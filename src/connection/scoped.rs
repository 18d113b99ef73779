use std::ops::{Deref, DerefMut};

use super::Connection;
use crate::error::Result;

/// Scope guard that releases a connection when the statement using it is done.
///
/// Call [`finish`](ScopedConnection::finish) on the success path to surface release
/// errors. If the guard is dropped instead (an earlier `?` returned), the connection
/// is still closed and any release error is discarded.
pub struct ScopedConnection<'a> {
    conn: Box<dyn Connection + 'a>,
    released: bool,
}

impl<'a> ScopedConnection<'a> {
    pub fn new(conn: Box<dyn Connection + 'a>) -> Self {
        Self {
            conn,
            released: false,
        }
    }

    /// Release the connection now.
    ///
    /// # Errors
    /// Returns the error reported by [`Connection::close`].
    pub fn finish(mut self) -> Result<()> {
        self.released = true;
        self.conn.close()
    }
}

impl<'a> Deref for ScopedConnection<'a> {
    type Target = dyn Connection + 'a;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref()
    }
}

impl DerefMut for ScopedConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut()
    }
}

impl Drop for ScopedConnection<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(err) = self.conn.close()
        {
            tracing::debug!(error = %err, "ignoring release error on unwinding statement scope");
        }
    }
}
