//! Canonical error and result types for the crate.
//!
//! This module defines the single public `SocketError` surface returned by
//! every asynchronous socket operation and by the pass-through configuration
//! calls on the socket facade.

use std::io;

use thiserror::Error;

use crate::{metrics::Direction, socket_type::SocketType};

/// Top-level error type exposed by `zmq_async`.
///
/// Would-block conditions never surface here: they are retried by the
/// operation state machine. Every other transport failure is reported to the
/// immediate caller of the operation without being retried or logged.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SocketError {
    /// The transport failed to accept a frame.
    #[error("failed sending message: {0}")]
    Send(#[source] io::Error),
    /// The transport failed to deliver a frame.
    #[error("failed receiving message: {0}")]
    Recv(#[source] io::Error),
    /// The operation was issued against a closed or null socket handle.
    #[error("operating on null socket")]
    NullSocket,
    /// A multipart operation in the same direction is already in flight.
    ///
    /// Send and receive may run concurrently, but two multipart sends (or two
    /// multipart receives) on one socket may not.
    #[error("socket is busy with another multipart {0} operation")]
    SocketBusy(Direction),
    /// The operation honoured a stop request before completing.
    #[error("operation cancelled")]
    Cancelled,
    /// The readiness watcher or its reactor failed.
    #[error("readiness watcher error: {0}")]
    Io(#[source] io::Error),
    /// The socket type cannot be used asynchronously.
    #[error("socket type {0} does not support asynchronous operation")]
    Unsupported(SocketType),
    /// A pass-through configuration call failed.
    #[error("socket configuration failed: {0}")]
    Config(#[source] io::Error),
}

impl SocketError {
    /// Returns `true` if this error reports an honoured stop request.
    #[must_use]
    pub fn is_cancelled(&self) -> bool { matches!(self, Self::Cancelled) }
}

/// Canonical result alias used by `zmq_async` public APIs.
pub type Result<T> = std::result::Result<T, SocketError>;
