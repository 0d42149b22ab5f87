//! `loadretry probe` – connectivity check.

use anyhow::{bail, Context, Result};
use loadretry_core::config::LoadRetryConfig;
use loadretry_core::connectivity::{self, CurlProbe};

/// Check once, or with `wait = Some(n)` poll up to `n` times on the
/// connectivity retry cadence.
pub async fn run_probe(
    cfg: &LoadRetryConfig,
    endpoints: Vec<String>,
    wait: Option<u32>,
) -> Result<()> {
    let mut probe: CurlProbe = cfg.probe();
    if !endpoints.is_empty() {
        probe.endpoints = endpoints;
    }
    let max_checks = wait.unwrap_or(1).max(1);
    let checks = tokio::task::spawn_blocking(move || {
        connectivity::wait_for_connectivity(&probe, Some(max_checks), None)
    })
    .await
    .context("probe task join")?;
    println!("{}", connectivity_outcome(checks)?);
    Ok(())
}

/// Line to print when online; an error (non-zero exit) when no check succeeded.
pub(crate) fn connectivity_outcome(checks: Option<u32>) -> Result<String> {
    match checks {
        Some(n) => Ok(format!("online (after {} check(s))", n)),
        None => bail!("offline: no connectivity endpoint reachable"),
    }
}
