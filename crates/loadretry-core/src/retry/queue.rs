//! Pending retries with deadlines, for callers that drive their own event loop.
//!
//! Nothing here sleeps: the loop asks `next_wait` how long it may block and
//! calls `pop_ready` when it wakes up.

use std::time::{Duration, Instant};

use super::policy::RetryDirective;
use super::tracker::LoadableKey;

/// Retries waiting for their deadline. At most one entry per loadable.
#[derive(Debug)]
pub struct RetryQueue<T> {
    entries: Vec<(Instant, LoadableKey, T)>,
}

impl<T> Default for RetryQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> RetryQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `item` according to `directive`. Returns the deadline, or `None`
    /// when the directive is `GiveUp` (nothing is queued). An entry already
    /// pending for `key` is replaced.
    pub fn schedule(
        &mut self,
        key: LoadableKey,
        item: T,
        directive: RetryDirective,
        now: Instant,
    ) -> Option<Instant> {
        let delay = directive.delay()?;
        self.cancel(&key);
        let deadline = now + delay;
        self.entries.push((deadline, key, item));
        Some(deadline)
    }

    /// Remove and return every entry whose deadline has passed, earliest first.
    pub fn pop_ready(&mut self, now: Instant) -> Vec<(LoadableKey, T)> {
        let (mut ready, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|(t, ..)| *t <= now);
        self.entries = pending;
        ready.sort_by_key(|(t, ..)| *t);
        ready.into_iter().map(|(_, k, item)| (k, item)).collect()
    }

    /// Time until the next deadline; zero if one is already due, `None` if empty.
    pub fn next_wait(&self, now: Instant) -> Option<Duration> {
        self.entries
            .iter()
            .map(|(t, ..)| t.saturating_duration_since(now))
            .min()
    }

    /// Drop the pending retry for `key`. Returns true if one existed.
    pub fn cancel(&mut self, key: &LoadableKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(_, k, _)| k != key);
        self.entries.len() != before
    }

    /// Drop every pending retry (session teardown). Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        if n > 0 {
            tracing::debug!(cancelled = n, "cancelled pending retries");
        }
        n
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
