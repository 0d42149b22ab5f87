use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::PolicyError;

/// Fixed cadence for retries after a connectivity failure.
pub const CONNECTIVITY_RETRY_DELAY_MS: u64 = 1000;
/// Delay added per previous failure for non-connectivity errors.
pub const BACKOFF_STEP_MS: u64 = 1000;
/// Upper bound on the step backoff.
pub const MAX_BACKOFF_MS: u64 = 5000;

/// High-level classification of a load failure for retry purposes.
///
/// Produced once at the network boundary (see `classify`); the policy never
/// looks at error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Transport could not establish or keep a connection (refused, aborted,
    /// unreachable host, DNS).
    Connectivity,
    /// Anything else: timeouts, HTTP error statuses, malformed or undecodable
    /// responses.
    Other,
}

/// One failed load attempt, as seen by the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadErrorInfo {
    /// Consecutive failures for this loadable, including the current one (1-based).
    pub error_count: u32,
    pub error_kind: ErrorKind,
    /// Diagnostics only.
    pub error_message: String,
}

impl LoadErrorInfo {
    pub fn new(error_count: u32, error_kind: ErrorKind, error_message: impl Into<String>) -> Self {
        Self {
            error_count,
            error_kind,
            error_message: error_message.into(),
        }
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum RetryDirective {
    /// Wait `delay_ms`, then retry the same load.
    Retry { delay_ms: u64 },
    /// Surface the failure; no further retries.
    GiveUp,
}

impl RetryDirective {
    /// Delay before the next attempt, or `None` for `GiveUp`.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            RetryDirective::Retry { delay_ms } => Some(Duration::from_millis(*delay_ms)),
            RetryDirective::GiveUp => None,
        }
    }

    pub fn is_retry(&self) -> bool {
        matches!(self, RetryDirective::Retry { .. })
    }
}

/// How many retries a loader should attempt on its own before consulting
/// the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBudget {
    /// No fixed cap; the policy decides every time.
    Unbounded,
    Bounded(u32),
}

/// Retry policy parameters (the `[retry]` section of config.toml).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Minimum retries guaranteed for non-connectivity errors before giving up.
    pub min_retry_count: u32,
    /// Optional ceiling for connectivity errors. `None` retries forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity_ceiling: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_retry_count: 3,
            connectivity_ceiling: None,
        }
    }
}

impl RetryConfig {
    pub fn with_min_retry_count(min_retry_count: u32) -> Self {
        Self {
            min_retry_count,
            ..Self::default()
        }
    }
}

/// Decide whether to retry a failed load and after what delay.
///
/// Precedence: connectivity fast-path, then step backoff while
/// `error_count < min_retry_count`, then give up. `error_count == 0` is a
/// caller bug and is reported as `PolicyError`, never as `GiveUp`.
pub fn decide(info: &LoadErrorInfo, config: &RetryConfig) -> Result<RetryDirective, PolicyError> {
    if info.error_count == 0 {
        return Err(PolicyError::InvalidErrorCount(info.error_count));
    }

    if info.error_kind == ErrorKind::Connectivity {
        return Ok(match config.connectivity_ceiling {
            Some(ceiling) if info.error_count >= ceiling => RetryDirective::GiveUp,
            _ => RetryDirective::Retry {
                delay_ms: CONNECTIVITY_RETRY_DELAY_MS,
            },
        });
    }

    if info.error_count < config.min_retry_count {
        let steps = u64::from(info.error_count - 1);
        let delay_ms = steps.saturating_mul(BACKOFF_STEP_MS).min(MAX_BACKOFF_MS);
        return Ok(RetryDirective::Retry { delay_ms });
    }

    Ok(RetryDirective::GiveUp)
}

/// Load-error retry policy. Stateless; cheap to copy and share across loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn decide(&self, info: &LoadErrorInfo) -> Result<RetryDirective, PolicyError> {
        decide(info, &self.config)
    }

    /// Budget a loader should apply before consulting this policy. Always
    /// unbounded so the policy stays the only source of retry limits.
    pub fn minimum_retry_count(&self) -> RetryBudget {
        RetryBudget::Unbounded
    }
}
