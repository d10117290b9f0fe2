//! Asynchronous socket facades.
//!
//! [`AsyncSocket`] owns one transport socket and the watcher for its
//! descriptor. Every asynchronous method returns a lazy sender that can be
//! awaited directly or connected to a
//! [`Receiver`](crate::operation::Receiver). Configuration calls pass
//! straight through to the transport.

pub(crate) mod core;
mod typed;

use std::sync::Arc;

use futures::Stream;
use tracing::debug;

pub use self::typed::TypedSocket;
use self::core::SocketCore;
use crate::{
    error::{Result, SocketError},
    flags::{RecvFlags, SendFlags},
    frame::Frame,
    metrics::Direction,
    multipart::Multipart,
    operation::{RecvMultipartSender, RecvSender, SendMultipartSender, SendSender},
    options::{OptionValue, SocketConfig, SocketOption},
    reactor::Reactor,
    socket_type::SocketType,
    transport::RawSocket,
    watcher::Watcher,
};

/// Type-erased asynchronous socket.
///
/// Not `Clone`: the socket has a single owner. Awaited operations borrow
/// it, so it cannot be moved or dropped while one is pending. Connected
/// operations share its core and may outlive it.
///
/// Send and receive may run concurrently. Two multipart operations in the
/// same direction may not; the second fails with
/// [`SocketError::SocketBusy`].
///
/// # Examples
///
/// ```
/// use zmq_async::{RecvFlags, SendFlags, SocketType, inproc::Context};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> zmq_async::Result<()> {
/// let ctx = Context::new();
/// let server = ctx.async_socket(SocketType::Pair)?;
/// let client = ctx.async_socket(SocketType::Pair)?;
/// server.bind("inproc://docs")?;
/// client.connect("inproc://docs")?;
///
/// client.send_multipart(["Hi", "There"], SendFlags::empty()).await?;
/// let msg = server.recv_multipart(RecvFlags::empty()).await?;
/// assert_eq!(msg.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct AsyncSocket {
    core: Arc<SocketCore>,
}

impl AsyncSocket {
    /// Wrap `raw`, registering its descriptor with `reactor`.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Unsupported`] for socket types without a
    /// pollable descriptor, or [`SocketError::Io`] if the descriptor cannot
    /// be read or registered.
    pub fn new(raw: impl RawSocket, reactor: Arc<dyn Reactor>) -> Result<Self> {
        Self::from_boxed(Box::new(raw), reactor)
    }

    /// As [`AsyncSocket::new`], for an already boxed transport.
    ///
    /// # Errors
    ///
    /// See [`AsyncSocket::new`].
    pub fn from_boxed(raw: Box<dyn RawSocket>, reactor: Arc<dyn Reactor>) -> Result<Self> {
        let socket_type = raw.socket_type();
        if !socket_type.supports_descriptor() {
            return Err(SocketError::Unsupported(socket_type));
        }
        let descriptor = raw.descriptor().map_err(SocketError::Io)?;
        let watcher = Watcher::new(reactor, descriptor).map_err(SocketError::Io)?;
        debug!(%socket_type, %descriptor, "asynchronous socket created");
        Ok(Self {
            core: Arc::new(SocketCore::new(raw, watcher)),
        })
    }

    /// Send one frame.
    ///
    /// `SendFlags::SNDMORE` marks further frames of the same message;
    /// `DONTWAIT` is always applied to the transport call.
    pub fn send(&self, frame: impl Into<Frame>, flags: SendFlags) -> SendSender<'_> {
        SendSender::new(Arc::clone(&self.core), Some(frame.into()), flags)
    }

    /// Receive one frame.
    pub fn recv(&self, flags: RecvFlags) -> RecvSender<'_> {
        RecvSender::new(Arc::clone(&self.core), (), flags)
    }

    /// Send every part of `message` as one atomic message.
    ///
    /// An empty message completes at once without touching the socket.
    /// `SNDMORE` in `flags` is ignored. If the transport fails after a
    /// prefix of the parts has been handed over, that prefix cannot be
    /// recalled and the peer may observe a torn message.
    pub fn send_multipart(&self, message: impl Into<Multipart>, flags: SendFlags) -> SendMultipartSender<'_> {
        SendMultipartSender::send(Arc::clone(&self.core), message.into(), flags)
    }

    /// Receive frames until the final part of a message arrives.
    pub fn recv_multipart(&self, flags: RecvFlags) -> RecvMultipartSender<'_> {
        RecvMultipartSender::recv(Arc::clone(&self.core), flags)
    }

    /// Stream of incoming messages, ending after the first error.
    pub fn incoming(&self) -> impl Stream<Item = Result<Multipart>> + '_ {
        futures::stream::unfold(Some(self), |socket| async move {
            let socket = socket?;
            match socket.recv_multipart(RecvFlags::empty()).await {
                Ok(msg) => Some((Ok(msg), Some(socket))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Returns `true` while a multipart operation owns `direction`.
    #[must_use]
    pub fn is_busy(&self, direction: Direction) -> bool { self.core.multipart_in_progress(direction) }

    /// The transport's socket type.
    #[must_use]
    pub fn socket_type(&self) -> SocketType { self.core.raw().socket_type() }

    /// Bind to a local endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn bind(&self, endpoint: &str) -> Result<()> {
        self.core.raw().bind(endpoint).map_err(SocketError::Config)
    }

    /// Remove a binding.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn unbind(&self, endpoint: &str) -> Result<()> {
        self.core.raw().unbind(endpoint).map_err(SocketError::Config)
    }

    /// Connect to a remote endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn connect(&self, endpoint: &str) -> Result<()> {
        self.core.raw().connect(endpoint).map_err(SocketError::Config)
    }

    /// Drop a connection.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn disconnect(&self, endpoint: &str) -> Result<()> {
        self.core
            .raw()
            .disconnect(endpoint)
            .map_err(SocketError::Config)
    }

    /// Close the transport handle. Later operations fail with
    /// [`SocketError::NullSocket`].
    pub fn close(&self) { self.core.raw().close(); }

    /// Read a socket option.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn get(&self, option: SocketOption) -> Result<OptionValue> {
        self.core.raw().get(option).map_err(SocketError::Config)
    }

    /// Write a socket option.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn set(&self, option: SocketOption, value: impl Into<OptionValue>) -> Result<()> {
        self.core
            .raw()
            .set(option, value.into())
            .map_err(SocketError::Config)
    }

    /// Write every option `config` sets, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn apply(&self, config: &SocketConfig) -> Result<()> {
        for (option, value) in config.option_writes() {
            self.set(option, value)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AsyncSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSocket")
            .field("socket_type", &self.socket_type())
            .field("watcher", self.core.watcher())
            .finish_non_exhaustive()
    }
}
