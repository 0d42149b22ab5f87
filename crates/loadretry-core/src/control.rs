//! Session control for teardown: shared abort tokens.
//!
//! Each playback/fetch session registers with `SessionControl` and passes the
//! returned token into its retry loops. Tearing the session down sets the
//! token; loops notice it between attempts and while waiting out a delay.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Error returned when a retry loop is stopped because its session went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("load aborted: session torn down")]
pub struct LoadAborted;

/// Shared abort token. `true` means stop.
pub type AbortToken = Arc<AtomicBool>;

/// True if the token exists and is set.
pub fn is_aborted(abort: Option<&AbortToken>) -> bool {
    abort.map(|a| a.load(Ordering::Relaxed)).unwrap_or(false)
}

/// Registry of session id -> abort token.
#[derive(Debug, Default)]
pub struct SessionControl {
    sessions: RwLock<HashMap<u64, AbortToken>>,
}

impl SessionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session; returns the token to hand to its retry loops.
    pub fn register(&self, session_id: u64) -> AbortToken {
        let token = Arc::new(AtomicBool::new(false));
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session_id, Arc::clone(&token));
        token
    }

    /// Forget a session that finished normally.
    pub fn unregister(&self, session_id: u64) {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&session_id);
    }

    /// Tear a session down: its loops stop before their next attempt.
    pub fn request_abort(&self, session_id: u64) {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = sessions.get(&session_id) {
            token.store(true, Ordering::Relaxed);
            tracing::debug!(session_id, "abort requested");
        }
    }

    pub fn is_aborted(&self, session_id: u64) -> bool {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        is_aborted(sessions.get(&session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_sets_only_that_session() {
        let ctl = SessionControl::new();
        let a = ctl.register(1);
        let b = ctl.register(2);
        ctl.request_abort(1);
        assert!(a.load(Ordering::Relaxed));
        assert!(!b.load(Ordering::Relaxed));
        assert!(ctl.is_aborted(1));
        assert!(!ctl.is_aborted(2));
    }

    #[test]
    fn unknown_or_unregistered_session_is_not_aborted() {
        let ctl = SessionControl::new();
        ctl.request_abort(7);
        assert!(!ctl.is_aborted(7));
        let t = ctl.register(7);
        ctl.unregister(7);
        ctl.request_abort(7);
        assert!(!t.load(Ordering::Relaxed));
    }

    #[test]
    fn missing_token_is_not_aborted() {
        assert!(!is_aborted(None));
    }
}
