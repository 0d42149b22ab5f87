//! Fetch a loadable over HTTP(S) under the retry policy.
//!
//! Uses the curl crate (libcurl). Curl errors and non-2xx statuses become
//! `LoadFailure`s at this boundary so the policy only sees error kinds.
//! Runs in the current thread; call from `spawn_blocking` if used from async code.

use std::time::Duration;

use crate::control::{is_aborted, AbortToken};
use crate::retry::{run_tracked, LoadError, LoadFailure, LoadTracker, LoadableKey, RetryPolicy};

/// Body of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u32,
    pub body: Vec<u8>,
    /// Attempts made, including the one that succeeded.
    pub attempts: u32,
}

/// One GET request, no retries. Setting `abort` stops the transfer from the
/// progress callback (libcurl calls it at least once a second while idle) and
/// yields `LoadFailure::Cancelled`.
pub fn fetch_once(
    url: &str,
    timeout: Duration,
    abort: Option<&AbortToken>,
) -> Result<FetchResult, LoadFailure> {
    let mut body = Vec::new();
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(timeout.min(Duration::from_secs(15)))?;
    easy.timeout(timeout)?;
    easy.progress(true)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.progress_function(|_, _, _, _| !is_aborted(abort))?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    if !(200..300).contains(&status) {
        return Err(LoadFailure::HttpStatus(status));
    }
    Ok(FetchResult {
        status,
        body,
        attempts: 1,
    })
}

/// Fetch `key.url`, retrying per `policy`. Failures are counted in `tracker`
/// under `key`; a success resets the count. Setting `abort` mid-transfer ends
/// the call with `LoadError::Aborted`.
pub fn fetch_with_policy(
    key: &LoadableKey,
    policy: &RetryPolicy,
    tracker: &mut LoadTracker,
    timeout: Duration,
    abort: Option<&AbortToken>,
) -> Result<FetchResult, LoadError> {
    let mut attempts = 0u32;
    let res = run_tracked(policy, tracker, key, abort, || {
        attempts += 1;
        tracing::debug!(loadable = %key, attempt = attempts, "fetching");
        fetch_once(&key.url, timeout, abort)
    });
    let mut r = res?;
    r.attempts = attempts;
    tracing::info!(loadable = %key, attempts, bytes = r.body.len(), "fetched");
    Ok(r)
}
