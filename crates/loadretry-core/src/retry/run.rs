//! Retry loops: run a load until it succeeds or the policy says stop.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::control::{is_aborted, AbortToken, LoadAborted};

use super::classify::classify;
use super::error::{LoadError, LoadFailure};
use super::policy::{LoadErrorInfo, RetryDirective, RetryPolicy};
use super::tracker::{LoadTracker, LoadableKey};

/// Longest uninterrupted sleep; an abort is noticed within this window.
const ABORT_POLL: Duration = Duration::from_millis(50);

/// Ask the policy about one failure and log the outcome.
/// Returns the delay before the next attempt, or `None` to give up.
fn next_delay(policy: &RetryPolicy, info: &LoadErrorInfo) -> Result<Option<Duration>, LoadError> {
    let directive = policy.decide(info)?;
    match directive {
        RetryDirective::Retry { delay_ms } => {
            tracing::debug!(
                kind = ?info.error_kind,
                error_count = info.error_count,
                delay_ms,
                "load failed, retrying: {}",
                info.error_message
            );
        }
        RetryDirective::GiveUp => {
            tracing::warn!(
                kind = ?info.error_kind,
                error_count = info.error_count,
                "load failed, giving up: {}",
                info.error_message
            );
        }
    }
    Ok(directive.delay())
}

/// Sleep for `delay` in short slices, returning early with an error on abort.
fn sleep_abortable(delay: Duration, abort: Option<&AbortToken>) -> Result<(), LoadAborted> {
    let deadline = Instant::now() + delay;
    loop {
        if is_aborted(abort) {
            return Err(LoadAborted);
        }
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Ok(());
        }
        std::thread::sleep(left.min(ABORT_POLL));
    }
}

async fn sleep_abortable_async(delay: Duration, abort: Option<&AbortToken>) -> Result<(), LoadAborted> {
    let deadline = tokio::time::Instant::now() + delay;
    loop {
        if is_aborted(abort) {
            return Err(LoadAborted);
        }
        let left = deadline.saturating_duration_since(tokio::time::Instant::now());
        if left.is_zero() {
            return Ok(());
        }
        tokio::time::sleep(left.min(ABORT_POLL)).await;
    }
}

/// Blocking loop shared by `run_with_retry` and `run_tracked`. `count` turns a
/// failure into the info the policy sees (and owns the failure counter).
/// A failure raised after the token was set is reported as `Aborted`, not counted.
fn run_loop<T, F, C>(
    policy: &RetryPolicy,
    abort: Option<&AbortToken>,
    mut count: C,
    mut f: F,
) -> Result<T, LoadError>
where
    F: FnMut() -> Result<T, LoadFailure>,
    C: FnMut(&LoadFailure) -> LoadErrorInfo,
{
    loop {
        if is_aborted(abort) {
            return Err(LoadAborted.into());
        }
        let failure = match f() {
            Ok(v) => return Ok(v),
            Err(_) if is_aborted(abort) => return Err(LoadAborted.into()),
            Err(e) => e,
        };
        let info = count(&failure);
        match next_delay(policy, &info)? {
            Some(d) => sleep_abortable(d, abort)?,
            None => {
                return Err(LoadError::GaveUp {
                    attempts: info.error_count,
                    source: failure,
                })
            }
        }
    }
}

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the policy's delay (on this thread) then
/// tries again. Attempts are counted from 1.
pub fn run_with_retry<T, F>(
    policy: &RetryPolicy,
    abort: Option<&AbortToken>,
    f: F,
) -> Result<T, LoadError>
where
    F: FnMut() -> Result<T, LoadFailure>,
{
    let mut attempt = 0u32;
    run_loop(
        policy,
        abort,
        |failure| {
            attempt = attempt.saturating_add(1);
            LoadErrorInfo::new(attempt, classify(failure), failure.to_string())
        },
        f,
    )
}

/// Like `run_with_retry`, but counts failures in `tracker` under `key`.
/// Success resets the count; giving up abandons the loadable.
pub fn run_tracked<T, F>(
    policy: &RetryPolicy,
    tracker: &mut LoadTracker,
    key: &LoadableKey,
    abort: Option<&AbortToken>,
    f: F,
) -> Result<T, LoadError>
where
    F: FnMut() -> Result<T, LoadFailure>,
{
    let res = run_loop(policy, abort, |failure| tracker.record_failure(key, failure), f);
    match &res {
        Ok(_) => tracker.record_success(key),
        Err(LoadError::GaveUp { .. }) => tracker.abandon(key),
        Err(_) => {}
    }
    res
}

/// Async retry loop. Delays use `tokio::time::sleep`, so a stalled retry of
/// one loadable never blocks other tasks on the runtime.
pub async fn run_with_retry_async<T, F, Fut>(
    policy: &RetryPolicy,
    abort: Option<&AbortToken>,
    mut f: F,
) -> Result<T, LoadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LoadFailure>>,
{
    let mut attempt = 0u32;
    loop {
        if is_aborted(abort) {
            return Err(LoadAborted.into());
        }
        let failure = match f().await {
            Ok(v) => return Ok(v),
            Err(_) if is_aborted(abort) => return Err(LoadAborted.into()),
            Err(e) => e,
        };
        attempt = attempt.saturating_add(1);
        let info = LoadErrorInfo::new(attempt, classify(&failure), failure.to_string());
        match next_delay(policy, &info)? {
            Some(d) => sleep_abortable_async(d, abort).await?,
            None => {
                return Err(LoadError::GaveUp {
                    attempts: attempt,
                    source: failure,
                })
            }
        }
    }
}

/// Retry immediately, without delay, up to `max_retries` extra times.
///
/// For operations that fail for reasons unrelated to the network (e.g. the
/// platform DRM framework refusing a session) where a short fixed number of
/// immediate retries is enough.
pub fn run_with_fixed_retries<T, E, F>(max_retries: u32, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: std::fmt::Display,
{
    let mut retries = 0u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) if retries < max_retries => {
                retries += 1;
                tracing::debug!(retry = retries, max_retries, "retrying immediately: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::{LoadableKind, RetryConfig};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn policy(min: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig::with_min_retry_count(min))
    }

    #[test]
    fn succeeds_after_retries() {
        // First retry has a 0 ms delay, second 1000 ms; keep the test fast by
        // succeeding on the second attempt.
        let mut calls = 0;
        let out = run_with_retry(&policy(5), None, || {
            calls += 1;
            if calls < 2 {
                Err(LoadFailure::HttpStatus(500))
            } else {
                Ok(calls)
            }
        })
        .unwrap();
        assert_eq!(out, 2);
    }

    #[test]
    fn gives_up_with_attempt_count() {
        let mut calls = 0;
        let err = run_with_retry(&policy(1), None, || -> Result<(), _> {
            calls += 1;
            Err(LoadFailure::HttpStatus(404))
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        match err {
            LoadError::GaveUp { attempts, source } => {
                assert_eq!(attempts, 1);
                assert!(matches!(source, LoadFailure::HttpStatus(404)));
            }
            other => panic!("expected GaveUp, got {other:?}"),
        }
    }

    #[test]
    fn pre_aborted_token_stops_before_first_attempt() {
        let abort: AbortToken = Arc::new(AtomicBool::new(true));
        let mut calls = 0;
        let err = run_with_retry(&policy(5), Some(&abort), || -> Result<(), _> {
            calls += 1;
            Err(LoadFailure::Timeout)
        })
        .unwrap_err();
        assert_eq!(calls, 0);
        assert!(matches!(err, LoadError::Aborted(LoadAborted)));
    }

    #[test]
    fn abort_interrupts_connectivity_wait() {
        let abort: AbortToken = Arc::new(AtomicBool::new(false));
        let started = Instant::now();
        let err = run_with_retry(&policy(5), Some(&abort), || -> Result<(), _> {
            // Tear the session down while the 1000 ms connectivity delay runs.
            abort.store(true, Ordering::Relaxed);
            Err(LoadFailure::ConnectionRefused)
        })
        .unwrap_err();
        assert!(matches!(err, LoadError::Aborted(_)));
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn failure_after_abort_is_not_counted() {
        let abort: AbortToken = Arc::new(AtomicBool::new(false));
        let mut tracker = LoadTracker::new();
        let key = LoadableKey::new(LoadableKind::Segment, "https://cdn.example.com/seg1.ts").unwrap();
        let mut calls = 0;
        let err = run_tracked(&policy(5), &mut tracker, &key, Some(&abort), || -> Result<(), _> {
            calls += 1;
            // Transfer cut short by the teardown.
            abort.store(true, Ordering::Relaxed);
            Err(LoadFailure::Cancelled)
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(matches!(err, LoadError::Aborted(_)));
        assert_eq!(tracker.error_count(&key), 0);
    }

    #[test]
    fn tracked_loop_resets_on_success_and_abandons_on_give_up() {
        let mut tracker = LoadTracker::new();
        let key = LoadableKey::new(LoadableKind::Manifest, "https://cdn.example.com/master.m3u8")
            .unwrap();

        let mut calls = 0;
        run_tracked(&policy(3), &mut tracker, &key, None, || {
            calls += 1;
            if calls == 1 {
                Err(LoadFailure::Malformed("truncated".into()))
            } else {
                Ok(())
            }
        })
        .unwrap();
        assert_eq!(tracker.error_count(&key), 0);

        let err = run_tracked(&policy(1), &mut tracker, &key, None, || -> Result<(), _> {
            Err(LoadFailure::HttpStatus(410))
        })
        .unwrap_err();
        assert!(matches!(err, LoadError::GaveUp { attempts: 1, .. }));
        assert!(tracker.is_empty());
    }

    #[test]
    fn fixed_retries_stop_after_budget() {
        let mut calls = 0;
        let res: Result<(), String> = run_with_fixed_retries(3, || {
            calls += 1;
            Err("drm session unavailable".to_string())
        });
        assert!(res.is_err());
        assert_eq!(calls, 4);
    }

    #[test]
    fn fixed_retries_return_first_success() {
        let mut calls = 0;
        let res: Result<u32, String> = run_with_fixed_retries(1, || {
            calls += 1;
            if calls == 2 {
                Ok(calls)
            } else {
                Err("no tracks".into())
            }
        });
        assert_eq!(res, Ok(2));
    }
}
