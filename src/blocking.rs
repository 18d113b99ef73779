use tokio::runtime::{Builder, Runtime};

use crate::error::{DbManagerError, Result};

/// Single-threaded runtime owned by one connection of an async driver.
///
/// Every driver call blocks on it, so background tasks (such as the `PostgreSQL`
/// connection task) only make progress while a call is in flight.
pub(crate) fn driver_runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DbManagerError::ConnectionError(format!("failed to start driver runtime: {e}")))
}
