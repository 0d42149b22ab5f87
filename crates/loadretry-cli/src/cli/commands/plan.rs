//! `loadretry plan` – the directive sequence for consecutive failures.

use anyhow::Result;
use loadretry_core::retry::{ErrorKind, LoadErrorInfo, RetryConfig, RetryDirective, RetryPolicy};

use super::decide::describe;

/// Directives for failure counts 1..=limit, stopping at the first `GiveUp`.
pub(crate) fn plan_directives(
    kind: ErrorKind,
    retry: RetryConfig,
    limit: u32,
) -> Result<Vec<RetryDirective>> {
    let policy = RetryPolicy::new(retry);
    let mut out = Vec::new();
    for count in 1..=limit {
        let directive = policy.decide(&LoadErrorInfo::new(count, kind, "plan"))?;
        out.push(directive);
        if directive == RetryDirective::GiveUp {
            break;
        }
    }
    Ok(out)
}

pub fn run_plan(kind: ErrorKind, retry: RetryConfig, limit: u32, json: bool) -> Result<()> {
    let directives = plan_directives(kind, retry, limit)?;
    for (i, d) in directives.iter().enumerate() {
        if json {
            println!("{}", serde_json::to_string(d)?);
        } else {
            println!("  failure {:>3}: {}", i + 1, describe(d));
        }
    }
    if !json && directives.last().is_some_and(RetryDirective::is_retry) {
        println!("  (still retrying after {} failures)", directives.len());
    }
    Ok(())
}
