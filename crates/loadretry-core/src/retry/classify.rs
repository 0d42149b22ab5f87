//! Classify boundary failures (curl, io, HTTP status) into retry error kinds.

use std::io;

use super::error::LoadFailure;
use super::policy::ErrorKind;

/// Classify a load failure for retry decisions.
pub fn classify(failure: &LoadFailure) -> ErrorKind {
    match failure {
        LoadFailure::ConnectionRefused
        | LoadFailure::ConnectionAborted
        | LoadFailure::HostUnreachable
        | LoadFailure::DnsFailure(_) => ErrorKind::Connectivity,
        LoadFailure::Io(e) => classify_io_error(e),
        LoadFailure::Timeout
        | LoadFailure::HttpStatus(_)
        | LoadFailure::Malformed(_)
        | LoadFailure::Decode(_)
        | LoadFailure::Cancelled => ErrorKind::Other,
    }
}

/// Classify an io error by its kind. Only transport-level kinds count as
/// connectivity; everything else (including `TimedOut`) is `Other`.
pub fn classify_io_error(e: &io::Error) -> ErrorKind {
    match e.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::HostUnreachable
        | io::ErrorKind::NetworkUnreachable
        | io::ErrorKind::NetworkDown => ErrorKind::Connectivity,
        _ => ErrorKind::Other,
    }
}

/// Map a curl error onto the boundary failure taxonomy.
pub fn failure_from_curl(e: &curl::Error) -> LoadFailure {
    if e.is_aborted_by_callback() {
        return LoadFailure::Cancelled;
    }
    if e.is_operation_timedout() {
        return LoadFailure::Timeout;
    }
    if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
        return LoadFailure::DnsFailure(e.description().to_string());
    }
    if e.is_couldnt_connect() {
        return LoadFailure::ConnectionRefused;
    }
    if e.is_send_error() || e.is_recv_error() || e.is_got_nothing() {
        return LoadFailure::ConnectionAborted;
    }
    // Includes CURLE_READ_ERROR: a local read callback failed, not the network.
    LoadFailure::Malformed(e.to_string())
}

impl From<curl::Error> for LoadFailure {
    fn from(e: curl::Error) -> Self {
        failure_from_curl(&e)
    }
}
