use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// `CancelToken` is a shared flag a controller flips to interrupt callers
/// blocked in a gate.
///
/// Cancellation is observed by a blocked caller at its next poll (see
/// [`super::WaitOptions::poll_interval`]) and only while its admission
/// predicate is still false; a caller that can be admitted is admitted.
///
/// ```
/// use foundation_gates::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flips the token. Returns `true` if this call was the one that
    /// cancelled it.
    pub fn cancel(&self) -> bool {
        self.cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// WHY: Controllers may cancel the same token from several places
    /// WHAT: Only the first `cancel` reports the transition
    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancelToken::new();
        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(token.is_cancelled());
    }
}
