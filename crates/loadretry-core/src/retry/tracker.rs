//! Per-loadable failure counters.
//!
//! The policy is stateless, so the caller has to remember how many times
//! each logical resource has failed. `LoadTracker` keeps one counter per
//! `LoadableKey`; counts never leak from one loadable to another.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;

use super::classify::classify;
use super::error::LoadFailure;
use super::policy::LoadErrorInfo;

/// What kind of resource a loadable is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadableKind {
    Manifest,
    Segment,
    Subtitle,
    DrmKey,
}

impl fmt::Display for LoadableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadableKind::Manifest => "manifest",
            LoadableKind::Segment => "segment",
            LoadableKind::Subtitle => "subtitle",
            LoadableKind::DrmKey => "drm-key",
        };
        f.write_str(s)
    }
}

/// Identity of a loadable for retry counting.
///
/// The URL is parsed and re-serialised so that trivially different spellings
/// of the same resource (host case, default port) share one counter. The
/// fragment is dropped; it never reaches the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadableKey {
    pub kind: LoadableKind,
    pub url: String,
}

impl LoadableKey {
    pub fn new(kind: LoadableKind, url: &str) -> Result<Self> {
        let mut parsed =
            url::Url::parse(url).with_context(|| format!("invalid URL for loadable: {url}"))?;
        parsed.set_fragment(None);
        Ok(Self {
            kind,
            url: parsed.to_string(),
        })
    }
}

impl fmt::Display for LoadableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.url)
    }
}

/// Consecutive-failure counters keyed by loadable.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    counts: HashMap<LoadableKey, u32>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more failure for `key` and build the info the policy needs.
    pub fn record_failure(&mut self, key: &LoadableKey, failure: &LoadFailure) -> LoadErrorInfo {
        let count = self.counts.entry(key.clone()).or_insert(0);
        *count = count.saturating_add(1);
        LoadErrorInfo::new(*count, classify(failure), failure.to_string())
    }

    /// The load succeeded; the next failure starts again from 1.
    pub fn record_success(&mut self, key: &LoadableKey) {
        self.counts.remove(key);
    }

    /// The caller gave up on the resource.
    pub fn abandon(&mut self, key: &LoadableKey) {
        if self.counts.remove(key).is_some() {
            tracing::debug!(loadable = %key, "abandoned loadable");
        }
    }

    /// Failures recorded so far (0 if none).
    pub fn error_count(&self, key: &LoadableKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
