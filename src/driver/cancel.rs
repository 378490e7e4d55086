use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Cancellation handle for the `*_ctx` statement variants.
///
/// Clones share the cancel flag, so a handle given to another thread can
/// abort a statement running on this one. A deadline, when set, fires on
/// its own without anyone calling [`Cancellation::cancel`].
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// A handle sharing this one's cancel flag with a deadline no later
    /// than `timeout` from now.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails with `Cancelled` or `DeadlineExceeded` once the handle fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_handle_is_live() {
        let c = Cancellation::new();
        assert!(!c.is_done());
        assert!(c.check().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let c = Cancellation::new();
        let other = c.clone();
        other.cancel();
        assert!(matches!(c.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_expired_deadline() {
        let c = Cancellation::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(c.is_done());
        assert!(matches!(c.check(), Err(Error::DeadlineExceeded)));
    }

    #[test]
    fn test_child_keeps_earlier_deadline() {
        let parent = Cancellation::with_timeout(Duration::from_millis(10));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
