//! `loadretry fetch <url>` – fetch one loadable under the retry policy.

use anyhow::{Context, Result};
use loadretry_core::config::LoadRetryConfig;
use loadretry_core::control::SessionControl;
use loadretry_core::fetch::{self, FetchResult};
use loadretry_core::retry::{LoadTracker, LoadableKey, LoadableKind, RetryConfig, RetryPolicy};
use std::sync::Arc;

const SESSION_ID: u64 = 1;

pub async fn run_fetch(
    cfg: &LoadRetryConfig,
    url: &str,
    kind: LoadableKind,
    retry: RetryConfig,
) -> Result<()> {
    let key = LoadableKey::new(kind, url)?;
    let policy = RetryPolicy::new(retry);
    let timeout = cfg.fetch_timeout();

    // Ctrl-C tears the session down; the retry loop stops at its next check.
    let control = Arc::new(SessionControl::new());
    let abort = control.register(SESSION_ID);
    let watcher = tokio::spawn({
        let control = Arc::clone(&control);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                control.request_abort(SESSION_ID);
            }
        }
    });

    let res = tokio::task::spawn_blocking(move || {
        let mut tracker = LoadTracker::new();
        fetch::fetch_with_policy(&key, &policy, &mut tracker, timeout, Some(&abort))
    })
    .await
    .context("fetch task join")?;

    watcher.abort();
    control.unregister(SESSION_ID);

    let fetched = res.with_context(|| format!("fetching {url}"))?;
    println!("{}", fetch_summary(url, &fetched));
    Ok(())
}

pub(crate) fn fetch_summary(url: &str, fetched: &FetchResult) -> String {
    format!(
        "{} {} bytes in {} attempt(s) (HTTP {})",
        url,
        fetched.body.len(),
        fetched.attempts,
        fetched.status
    )
}
