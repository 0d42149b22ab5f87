//! Load-error retry policy.
//!
//! This module holds the retry decision (connectivity fast-path, capped step
//! backoff, give-up), the classification of boundary failures into error
//! kinds, per-loadable failure counters and the loops/queues that carry out
//! the delays, so every loader shares one consistent policy.

mod classify;
mod error;
mod policy;
mod queue;
mod run;
mod tracker;

pub use classify::{classify, classify_io_error, failure_from_curl};
pub use error::{LoadError, LoadFailure, PolicyError};
pub use policy::{
    decide, ErrorKind, LoadErrorInfo, RetryBudget, RetryConfig, RetryDirective, RetryPolicy,
    BACKOFF_STEP_MS, CONNECTIVITY_RETRY_DELAY_MS, MAX_BACKOFF_MS,
};
pub use queue::RetryQueue;
pub use run::{run_tracked, run_with_fixed_retries, run_with_retry, run_with_retry_async};
pub use tracker::{LoadTracker, LoadableKey, LoadableKind};
