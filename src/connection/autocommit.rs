/// Bookkeeping for drivers that emulate auto-commit with explicit transaction statements.
///
/// Disabling auto-commit does not talk to the server. The next statement opens a
/// transaction (`begin_needed`), and commit/rollback close it. The following statement
/// then opens a new one for as long as auto-commit stays off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoCommitTracker {
    enabled: bool,
    open: bool,
}

impl Default for AutoCommitTracker {
    fn default() -> Self {
        Self {
            enabled: true,
            open: false,
        }
    }
}

impl AutoCommitTracker {
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a server-side transaction is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether a `BEGIN` has to go out before the next statement.
    #[must_use]
    pub fn begin_needed(&self) -> bool {
        !self.enabled && !self.open
    }

    pub fn mark_begun(&mut self) {
        self.open = true;
    }

    pub fn mark_finished(&mut self) {
        self.open = false;
    }

    /// Whether switching to `enabled` has to commit the open transaction first.
    #[must_use]
    pub fn commit_needed_for(&self, enabled: bool) -> bool {
        enabled && self.open
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begins_lazily_once_per_transaction() {
        let mut tracker = AutoCommitTracker::default();
        assert!(tracker.enabled());
        assert!(!tracker.begin_needed());

        assert!(!tracker.commit_needed_for(false));
        tracker.set_enabled(false);
        assert!(tracker.begin_needed());
        tracker.mark_begun();
        assert!(!tracker.begin_needed());

        tracker.mark_finished();
        assert!(tracker.begin_needed());
    }

    #[test]
    fn re_enabling_with_open_transaction_requests_commit() {
        let mut tracker = AutoCommitTracker::default();
        tracker.set_enabled(false);
        tracker.mark_begun();
        assert!(tracker.commit_needed_for(true));
        assert!(!tracker.commit_needed_for(false));
        tracker.mark_finished();
        tracker.set_enabled(true);
        assert!(!tracker.begin_needed());
    }
}
