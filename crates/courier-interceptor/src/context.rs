//! Per-call context.
//!
//! A [`CallContext`] is created by the client for every call and shared
//! read-only with each interceptor and the terminal stage.

use std::time::{Duration, Instant};
use uuid::Uuid;

/// Context that flows through the interceptor chain for a single call.
///
/// # Example
///
/// ```
/// use courier_interceptor::CallContext;
///
/// let ctx = CallContext::new();
/// assert_eq!(ctx.call_id().get_version_num(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Unique, time-ordered identifier for this call (UUID v7).
    call_id: Uuid,

    /// When the call entered the chain.
    started_at: Instant,
}

impl CallContext {
    /// Creates a context with a fresh call ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_call_id(Uuid::now_v7())
    }

    /// Creates a context with a specific call ID.
    #[must_use]
    pub fn with_call_id(call_id: Uuid) -> Self {
        Self {
            call_id,
            started_at: Instant::now(),
        }
    }

    /// Returns the call ID.
    #[must_use]
    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    /// Returns when the call started.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time elapsed since the call started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_ids_are_unique() {
        let a = CallContext::new();
        let b = CallContext::new();
        assert_ne!(a.call_id(), b.call_id());
    }

    #[test]
    fn test_with_call_id() {
        let id = Uuid::now_v7();
        let ctx = CallContext::with_call_id(id);
        assert_eq!(ctx.call_id(), id);
        assert!(ctx.elapsed() < Duration::from_secs(5));
    }
}
