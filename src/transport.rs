//! The non-blocking transport socket consumed by the asynchronous core.
//!
//! [`RawSocket`] is the narrow interface between this crate and a native
//! messaging library. The core only ever calls the non-blocking variants of
//! send and receive, polls [`RawSocket::events`] for readiness, and reads the
//! pollable [`Descriptor`] once, when the socket's watcher is created.
//! Everything else is pass-through configuration.

use std::{fmt, io};

use thiserror::Error;

use crate::{
    flags::{Events, RecvFlags, SendFlags},
    frame::Frame,
    options::{OptionValue, SocketOption},
    socket_type::SocketType,
};

/// Platform handle a reactor can watch for readiness.
///
/// On unix this is a raw file descriptor; in-process transports use it as
/// an opaque key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Descriptor(i64);

impl Descriptor {
    /// Wrap a raw handle value.
    #[must_use]
    pub const fn new(raw: i64) -> Self { Self(raw) }

    /// Return the raw handle value.
    #[must_use]
    pub const fn as_raw(self) -> i64 { self.0 }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "fd:{}", self.0) }
}

/// Failure of a non-blocking send.
///
/// Mirrors `tokio::sync::mpsc::error::TrySendError`: a would-block hands the
/// frame back so the caller can retry without copying.
#[derive(Debug, Error)]
pub enum TrySendError {
    /// No capacity right now; the frame is returned untouched.
    #[error("send would block")]
    WouldBlock(Frame),
    /// The transport rejected the frame.
    #[error("send failed: {0}")]
    Failed(#[source] io::Error),
}

/// Failure of a non-blocking receive.
#[derive(Debug, Error)]
pub enum TryRecvError {
    /// No frame is queued right now.
    #[error("receive would block")]
    WouldBlock,
    /// The transport failed.
    #[error("receive failed: {0}")]
    Failed(#[source] io::Error),
}

/// A native non-blocking message socket.
///
/// Implementations must be safe to call from any thread. Concurrent calls in
/// the same direction are never issued by this crate's multipart operations,
/// but a send and a receive may run at the same time.
pub trait RawSocket: Send + Sync + 'static {
    /// Pattern implemented by the socket.
    fn socket_type(&self) -> SocketType;

    /// Current readiness bits.
    ///
    /// Reading the bits may re-arm an edge-triggered descriptor, so the core
    /// always reads them before deciding to wait.
    fn events(&self) -> Events;

    /// Hand one frame to the transport without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`TrySendError::WouldBlock`] with the frame when there is no
    /// capacity, or [`TrySendError::Failed`] on a hard failure.
    fn try_send(&self, frame: Frame, flags: SendFlags) -> Result<(), TrySendError>;

    /// Take one frame from the transport without blocking.
    ///
    /// The returned frame's [`Frame::more`] is set when further frames of the
    /// same message follow.
    ///
    /// # Errors
    ///
    /// Returns [`TryRecvError::WouldBlock`] when nothing is queued, or
    /// [`TryRecvError::Failed`] on a hard failure.
    fn try_recv(&self, flags: RecvFlags) -> Result<Frame, TryRecvError>;

    /// The pollable descriptor backing the socket.
    ///
    /// # Errors
    ///
    /// Fails if the socket cannot expose a descriptor.
    fn descriptor(&self) -> io::Result<Descriptor>;

    /// Returns `true` once the handle has been closed.
    fn is_closed(&self) -> bool;

    /// Bind to a local endpoint.
    ///
    /// # Errors
    ///
    /// Propagates the transport's failure.
    fn bind(&self, endpoint: &str) -> io::Result<()>;

    /// Remove a previous binding.
    ///
    /// # Errors
    ///
    /// Propagates the transport's failure.
    fn unbind(&self, endpoint: &str) -> io::Result<()>;

    /// Connect to a remote endpoint.
    ///
    /// # Errors
    ///
    /// Propagates the transport's failure.
    fn connect(&self, endpoint: &str) -> io::Result<()>;

    /// Drop a previous connection.
    ///
    /// # Errors
    ///
    /// Propagates the transport's failure.
    fn disconnect(&self, endpoint: &str) -> io::Result<()>;

    /// Close the handle. Later operations fail with a null-socket error.
    fn close(&self);

    /// Read an option.
    ///
    /// # Errors
    ///
    /// Fails for unknown or write-only options.
    fn get(&self, option: SocketOption) -> io::Result<OptionValue>;

    /// Write an option.
    ///
    /// # Errors
    ///
    /// Fails for unknown or read-only options, or values of the wrong kind.
    fn set(&self, option: SocketOption, value: OptionValue) -> io::Result<()>;
}
