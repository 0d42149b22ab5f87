//! Minimal HTTP/1.1 server that fails a fixed number of requests, then serves a body.
//!
//! Every GET is answered with `fail_status` until `failures` requests have been
//! seen; after that each GET gets 200 with the body.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

/// Handle to a running server: its URL and how many requests it has seen.
pub struct FlakyServer {
    pub url: String,
    hits: Arc<AtomicU32>,
}

impl FlakyServer {
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(body: Vec<u8>, failures: u32, fail_status: u16) -> FlakyServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let hits = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, n <= failures, fail_status));
        }
    });
    FlakyServer {
        url: format!("http://127.0.0.1:{}/stream.m3u8", port),
        hits,
    }
}

/// Starts a server that accepts connections and never answers. Streams are held
/// open so the client sees a stalled transfer, not a reset.
pub fn start_silent() -> FlakyServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&hits);
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            seen.fetch_add(1, Ordering::SeqCst);
            held.push(stream);
        }
    });
    FlakyServer {
        url: format!("http://127.0.0.1:{}/seg1.ts", port),
        hits,
    }
}

/// A URL on a port nothing listens on (connection refused).
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/stream.m3u8", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], fail: bool, fail_status: u16) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }
    let response = if fail {
        format!(
            "HTTP/1.1 {} Failure\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            fail_status
        )
    } else {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
    };
    let _ = stream.write_all(response.as_bytes());
    if !fail {
        let _ = stream.write_all(body);
    }
}
