//! Facade specialised on a compile-time socket role.

use std::{marker::PhantomData, sync::Arc};

use super::AsyncSocket;
use crate::{
    error::{Result, SocketError},
    flags::{RecvFlags, SendFlags},
    frame::Frame,
    multipart::Multipart,
    operation::{RecvMultipartSender, RecvSender, SendMultipartSender, SendSender},
    options::{OptionValue, SocketConfig, SocketOption},
    reactor::Reactor,
    socket_type::role::{AsyncRole, MultipartRole},
    transport::RawSocket,
};

/// [`AsyncSocket`] whose role `R` is fixed at compile time.
///
/// Only roles with a pollable descriptor implement [`AsyncRole`], and the
/// multipart operations exist only for [`MultipartRole`]s, so misuse is a
/// compile error rather than a runtime one.
///
/// ```compile_fail
/// use zmq_async::{TypedSocket, socket_type::role::Server};
///
/// fn server(_: TypedSocket<Server>) {}
/// ```
pub struct TypedSocket<R: AsyncRole> {
    inner: AsyncSocket,
    _role: PhantomData<R>,
}

impl<R: AsyncRole> TypedSocket<R> {
    /// Wrap `raw`, checking that its runtime type matches `R`.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] if `raw` is not an `R` socket, or any
    /// error of [`AsyncSocket::new`].
    pub fn new(raw: impl RawSocket, reactor: Arc<dyn Reactor>) -> Result<Self> {
        let actual = raw.socket_type();
        if actual != R::TYPE {
            return Err(SocketError::Config(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("expected a {} socket, got {actual}", R::TYPE),
            )));
        }
        Ok(Self {
            inner: AsyncSocket::new(raw, reactor)?,
            _role: PhantomData,
        })
    }

    /// See [`AsyncSocket::send`].
    pub fn send(&self, frame: impl Into<Frame>, flags: SendFlags) -> SendSender<'_> {
        self.inner.send(frame, flags)
    }

    /// See [`AsyncSocket::recv`].
    pub fn recv(&self, flags: RecvFlags) -> RecvSender<'_> { self.inner.recv(flags) }

    /// See [`AsyncSocket::bind`].
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn bind(&self, endpoint: &str) -> Result<()> { self.inner.bind(endpoint) }

    /// See [`AsyncSocket::unbind`].
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn unbind(&self, endpoint: &str) -> Result<()> { self.inner.unbind(endpoint) }

    /// See [`AsyncSocket::connect`].
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn connect(&self, endpoint: &str) -> Result<()> { self.inner.connect(endpoint) }

    /// See [`AsyncSocket::disconnect`].
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn disconnect(&self, endpoint: &str) -> Result<()> { self.inner.disconnect(endpoint) }

    /// See [`AsyncSocket::close`].
    pub fn close(&self) { self.inner.close(); }

    /// See [`AsyncSocket::get`].
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn get(&self, option: SocketOption) -> Result<OptionValue> { self.inner.get(option) }

    /// See [`AsyncSocket::set`].
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn set(&self, option: SocketOption, value: impl Into<OptionValue>) -> Result<()> {
        self.inner.set(option, value)
    }

    /// See [`AsyncSocket::apply`].
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Config`] with the transport's failure.
    pub fn apply(&self, config: &SocketConfig) -> Result<()> { self.inner.apply(config) }

    /// Borrow the type-erased facade, for example to pass it to
    /// [`proxy`](crate::proxy::proxy).
    #[must_use]
    pub fn as_dyn(&self) -> &AsyncSocket { &self.inner }

    /// Give up the compile-time role.
    #[must_use]
    pub fn into_dyn(self) -> AsyncSocket { self.inner }
}

impl<R: MultipartRole> TypedSocket<R> {
    /// See [`AsyncSocket::send_multipart`].
    pub fn send_multipart(&self, message: impl Into<Multipart>, flags: SendFlags) -> SendMultipartSender<'_> {
        self.inner.send_multipart(message, flags)
    }

    /// See [`AsyncSocket::recv_multipart`].
    pub fn recv_multipart(&self, flags: RecvFlags) -> RecvMultipartSender<'_> {
        self.inner.recv_multipart(flags)
    }
}

impl<R: AsyncRole> From<TypedSocket<R>> for AsyncSocket {
    fn from(socket: TypedSocket<R>) -> Self { socket.into_dyn() }
}

impl<R: AsyncRole> std::fmt::Debug for TypedSocket<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedSocket")
            .field("role", &R::TYPE)
            .field("inner", &self.inner)
            .finish()
    }
}
