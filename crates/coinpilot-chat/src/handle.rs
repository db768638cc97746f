//! A cloneable handle for poking the session from external code.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

/// A cloneable handle for cancelling and observing a session.
///
/// All fields are `Arc`-wrapped, so cloning is cheap.
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) is_running: Arc<AtomicBool>,
}

impl SessionHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the in-flight exchange, if any.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Whether an exchange is currently streaming.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Fresh token for a new exchange
    pub(crate) fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();
        self.is_running.store(true, Ordering::Release);
        token
    }

    pub(crate) fn finish(&self) {
        self.is_running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_when_not_started() {
        let handle = SessionHandle::new();
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_abort_cancels_current_token() {
        let handle = SessionHandle::new();
        let token = handle.begin();
        assert!(handle.is_running());
        handle.clone().abort();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_begin_replaces_cancelled_token() {
        let handle = SessionHandle::new();
        let first = handle.begin();
        handle.abort();
        handle.finish();
        let second = handle.begin();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_finish_clears_running_for_clones() {
        let handle = SessionHandle::new();
        let observer = handle.clone();
        handle.begin();
        assert!(observer.is_running());
        handle.finish();
        assert!(!observer.is_running());
    }
}
