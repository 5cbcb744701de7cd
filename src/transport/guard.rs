//! Cleanup for connection attempts dropped part-way through

/// Runs `cleanup` when dropped, unless the attempt disarmed it first.
///
/// A connect future cancelled by a timeout or an interrupt never reaches its
/// own error branch, so whatever it opened has to be released from `Drop`.
pub struct ConnectGuard<F: FnOnce()> {
    cleanup: Option<F>,
}

impl<F: FnOnce()> ConnectGuard<F> {
    pub fn new(cleanup: F) -> Self {
        Self {
            cleanup: Some(cleanup),
        }
    }

    /// The connection was handed over or already torn down
    pub fn disarm(mut self) {
        self.cleanup = None;
    }
}

impl<F: FnOnce()> Drop for ConnectGuard<F> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_cleanup_runs_on_drop() {
        let released = Cell::new(0);
        {
            let _guard = ConnectGuard::new(|| released.set(released.get() + 1));
        }
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_disarmed_guard_does_nothing() {
        let released = Cell::new(0);
        let guard = ConnectGuard::new(|| released.set(released.get() + 1));
        guard.disarm();
        assert_eq!(released.get(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_runs_when_future_is_cancelled() {
        let released = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let counter = released.clone();

        let attempt = async move {
            let _guard = ConnectGuard::new(move || {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            });
            std::future::pending::<()>().await;
        };
        let result = tokio::time::timeout(std::time::Duration::from_millis(5), attempt).await;

        assert!(result.is_err());
        assert_eq!(released.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
