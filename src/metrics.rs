//! Metric helpers for `zmq_async`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking frames handed to or taken from a transport.
pub const FRAMES_TRANSFERRED: &str = "zmq_async_frames_total";
/// Name of the counter tracking operations that honoured a stop request.
pub const OPERATIONS_CANCELLED: &str = "zmq_async_operations_cancelled_total";
/// Name of the counter tracking failed operations.
pub const ERRORS_TOTAL: &str = "zmq_async_errors_total";

/// Direction of a socket operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Frames flowing out of the socket.
    Send,
    /// Frames flowing into the socket.
    Recv,
}

impl Direction {
    /// Stable label used for metrics and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Send => "send",
            Direction::Recv => "recv",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Record a frame transferred in the given direction.
#[cfg(feature = "metrics")]
pub fn inc_frames(direction: Direction) {
    counter!(FRAMES_TRANSFERRED, "direction" => direction.as_str()).increment(1);
}

/// Record an operation that completed as cancelled.
#[cfg(feature = "metrics")]
pub fn inc_cancelled(direction: Direction) {
    counter!(OPERATIONS_CANCELLED, "direction" => direction.as_str()).increment(1);
}

/// Record an error occurrence.
#[cfg(feature = "metrics")]
pub fn inc_errors(direction: Direction) {
    counter!(ERRORS_TOTAL, "direction" => direction.as_str()).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub fn inc_frames(_direction: Direction) {}

#[cfg(not(feature = "metrics"))]
pub fn inc_cancelled(_direction: Direction) {}

#[cfg(not(feature = "metrics"))]
pub fn inc_errors(_direction: Direction) {}
