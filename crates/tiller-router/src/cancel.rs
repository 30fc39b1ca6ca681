//! Cooperative cancellation tokens.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A cooperative cancellation token shared between the resolver and one
/// in-flight controller.
///
/// Cancellation is advisory: a controller may poll
/// [`is_cancelled`](Self::is_cancelled) and bail out early, but the resolver
/// honors supersession either way by checking the token again when the
/// controller finishes.
///
/// The `reported` latch makes sure the abort is published as a `route-error`
/// exactly once, whether the superseding navigation or the stale navigation's
/// own completion check gets there first.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    reported: AtomicBool,
    reason: Mutex<Option<String>>,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token, recording the reason. The first reason wins.
    pub fn cancel(&self, reason: impl Into<String>) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            if let Ok(mut slot) = self.inner.reason.lock() {
                *slot = Some(reason.into());
            }
        }
    }

    /// Returns whether the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if cancelled.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.inner.reason.lock().ok().and_then(|slot| slot.clone())
    }

    /// Claims the right to publish this token's abort event.
    ///
    /// Returns `true` exactly once across all clones.
    #[must_use]
    pub fn claim_report(&self) -> bool {
        !self.inner.reported.swap(true, Ordering::SeqCst)
    }

    /// Returns whether this token and `other` share the same allocation.
    #[must_use]
    pub fn same_token(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_records_first_reason() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());

        token.cancel("superseded by /hello");
        token.cancel("too late");
        assert!(token.is_cancelled());
        assert_eq!(token.reason().as_deref(), Some("superseded by /hello"));
    }

    #[test]
    fn test_report_claimed_once() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel("superseded");

        assert!(clone.claim_report());
        assert!(!token.claim_report());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel("gone");
        assert!(token.is_cancelled());
        assert!(token.same_token(&clone));
        assert!(!token.same_token(&CancelToken::new()));
    }
}
