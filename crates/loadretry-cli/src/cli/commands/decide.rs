//! `loadretry decide` – one policy decision.

use anyhow::Result;
use loadretry_core::retry::{ErrorKind, LoadErrorInfo, RetryConfig, RetryDirective, RetryPolicy};

/// Human-readable form of a directive.
pub(super) fn describe(directive: &RetryDirective) -> String {
    match directive {
        RetryDirective::Retry { delay_ms } => format!("retry after {} ms", delay_ms),
        RetryDirective::GiveUp => "give up".to_string(),
    }
}

pub fn run_decide(kind: ErrorKind, count: u32, retry: RetryConfig, json: bool) -> Result<()> {
    let policy = RetryPolicy::new(retry);
    let info = LoadErrorInfo::new(count, kind, "command line");
    let directive = policy.decide(&info)?;
    if json {
        println!("{}", serde_json::to_string(&directive)?);
    } else {
        println!("{}", describe(&directive));
    }
    Ok(())
}
