//! Helper utilities for Socksgate
//!
//! This module provides common constants and small utilities used throughout
//! the application.

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

/// Default buffer size for relay IO
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Default destination connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default time in-flight sessions get to drain on shutdown, in seconds
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Default SO_RCVBUF / SO_SNDBUF for accepted client sockets
pub const DEFAULT_SOCKET_BUFFER_SIZE: usize = 4096;

/// First delay after a failed accept
pub const ACCEPT_BACKOFF_INITIAL_MS: u64 = 100;

/// Upper bound on the delay between accept attempts
pub const ACCEPT_BACKOFF_MAX_SECS: u64 = 1;

/// Parse duration from seconds
pub fn duration_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

/// Backoff policy for transient accept errors (e.g. EMFILE)
///
/// Never gives up: the listener keeps retrying until shutdown. Call
/// `reset()` after a successful accept.
pub fn accept_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(ACCEPT_BACKOFF_INITIAL_MS))
        .with_max_interval(Duration::from_secs(ACCEPT_BACKOFF_MAX_SECS))
        .with_max_elapsed_time(None)
        .build()
}
