//! Error types for the retry layer: policy misuse, boundary failures, loop outcome.

use crate::control::LoadAborted;

/// Caller misused the policy API. Distinct from a `GiveUp` decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// `error_count` is 1-based; 0 means the caller never counted the failure.
    #[error("invalid error count {0}: counts start at 1")]
    InvalidErrorCount(u32),
}

/// Structured failure of a single load, as raised at the network boundary.
///
/// Callers map their transport's error taxonomy into this enum once; retry
/// decisions are made from the variant, never from the message text.
#[derive(Debug, thiserror::Error)]
pub enum LoadFailure {
    #[error("connection refused")]
    ConnectionRefused,
    #[error("connection aborted")]
    ConnectionAborted,
    #[error("host unreachable")]
    HostUnreachable,
    #[error("could not resolve {0}")]
    DnsFailure(String),
    #[error("timed out")]
    Timeout,
    /// Server answered with a non-2xx status.
    #[error("HTTP {0}")]
    HttpStatus(u32),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// The transfer was stopped from our side (session torn down mid-request).
    #[error("transfer cancelled")]
    Cancelled,
}

/// Outcome of a retry loop that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Policy returned `GiveUp` after `attempts` tries.
    #[error("gave up after {attempts} attempt(s): {source}")]
    GaveUp {
        attempts: u32,
        #[source]
        source: LoadFailure,
    },
    #[error(transparent)]
    Aborted(#[from] LoadAborted),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl LoadError {
    /// The last boundary failure, if the loop ended by giving up.
    pub fn last_failure(&self) -> Option<&LoadFailure> {
        match self {
            LoadError::GaveUp { source, .. } => Some(source),
            LoadError::Aborted(_) | LoadError::Policy(_) => None,
        }
    }
}
