//! Localhost helpers for tests that need a listening socket.
//!
//! Some sandboxes forbid binding 127.0.0.1; tests that need the fake ecoDMS
//! server skip themselves there instead of failing.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

/// Returns `true` (and says so on stderr) when 127.0.0.1 cannot be bound.
#[track_caller]
#[must_use]
pub fn skip_without_localhost() -> bool {
    if TcpListener::bind(("127.0.0.1", 0)).is_ok() {
        return false;
    }
    let caller = Location::caller();
    eprintln!(
        "skipping {}:{}: cannot bind 127.0.0.1 for the fake ecoDMS server",
        caller.file(),
        caller.line()
    );
    true
}

/// Starts a wiremock server, or `None` when localhost is unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if skip_without_localhost() {
        None
    } else {
        Some(MockServer::start().await)
    }
}

/// Port on 127.0.0.1 with nothing listening on it.
#[must_use]
pub fn closed_local_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}
