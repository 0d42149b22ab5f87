//! Network reachability check.
//!
//! A connectivity failure is retried on a fixed cadence until the network
//! comes back; callers that want to show "offline" UI, or to wait before the
//! first attempt, can ask a probe whether any endpoint is reachable.

use std::time::Duration;

use crate::control::{is_aborted, AbortToken};
use crate::retry::CONNECTIVITY_RETRY_DELAY_MS;

/// Something that can tell whether the network is currently usable.
pub trait ConnectivityProbe {
    fn is_connected(&self) -> bool;
}

/// Probe that opens a connect-only curl handle to each endpoint in turn.
/// Connected as soon as one endpoint accepts a connection.
#[derive(Debug, Clone)]
pub struct CurlProbe {
    pub endpoints: Vec<String>,
    pub connect_timeout: Duration,
}

impl CurlProbe {
    pub fn new(endpoints: Vec<String>, connect_timeout: Duration) -> Self {
        Self {
            endpoints,
            connect_timeout,
        }
    }

    fn try_endpoint(&self, endpoint: &str) -> Result<(), curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(endpoint)?;
        easy.connect_only(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.perform()
    }
}

impl ConnectivityProbe for CurlProbe {
    fn is_connected(&self) -> bool {
        for endpoint in &self.endpoints {
            match self.try_endpoint(endpoint) {
                Ok(()) => {
                    tracing::debug!(endpoint = %endpoint, "endpoint reachable");
                    return true;
                }
                Err(e) => tracing::debug!(endpoint = %endpoint, "endpoint unreachable: {}", e),
            }
        }
        false
    }
}

/// Fixed answer, for tests and for callers that track connectivity elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

impl ConnectivityProbe for StaticProbe {
    fn is_connected(&self) -> bool {
        self.0
    }
}

/// Poll `probe` on the connectivity retry cadence until it reports connected.
///
/// Returns the number of checks made when connected, or `None` after
/// `max_checks` failed checks (`None` = no cap) or when `abort` is set.
pub fn wait_for_connectivity<P: ConnectivityProbe + ?Sized>(
    probe: &P,
    max_checks: Option<u32>,
    abort: Option<&AbortToken>,
) -> Option<u32> {
    let interval = Duration::from_millis(CONNECTIVITY_RETRY_DELAY_MS);
    let mut checks = 0u32;
    loop {
        if is_aborted(abort) {
            return None;
        }
        checks = checks.saturating_add(1);
        if probe.is_connected() {
            return Some(checks);
        }
        if max_checks.is_some_and(|max| checks >= max) {
            tracing::info!(checks, "still offline, stopped waiting");
            return None;
        }
        std::thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FlakyProbe {
        up_after: u32,
        calls: Cell<u32>,
    }

    impl ConnectivityProbe for FlakyProbe {
        fn is_connected(&self) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.calls.get() > self.up_after
        }
    }

    #[test]
    fn connected_probe_returns_on_first_check() {
        assert_eq!(wait_for_connectivity(&StaticProbe(true), Some(3), None), Some(1));
    }

    #[test]
    fn offline_probe_stops_at_max_checks() {
        assert_eq!(wait_for_connectivity(&StaticProbe(false), Some(1), None), None);
    }

    #[test]
    fn waits_until_network_returns() {
        let probe = FlakyProbe {
            up_after: 1,
            calls: Cell::new(0),
        };
        assert_eq!(wait_for_connectivity(&probe, Some(5), None), Some(2));
    }

    #[test]
    fn empty_curl_probe_is_offline() {
        let probe = CurlProbe::new(Vec::new(), Duration::from_secs(1));
        assert!(!probe.is_connected());
    }
}
