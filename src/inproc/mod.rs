//! In-process transport.
//!
//! A [`Context`] is a namespace of `inproc://` endpoints. Sockets created by
//! the same context can bind and connect to each other in any order, and
//! exchange whole messages through bounded pipes. Readiness is reported
//! through [`InprocReactor`], so the sockets plug straight into
//! [`AsyncSocket`].
//!
//! Supported patterns: `PAIR`, `PUSH`/`PULL`, `DEALER`/`ROUTER`,
//! `REQ`/`REP` and `PUB`/`SUB`. `XPUB`, `XSUB` and the draft types are
//! rejected with [`io::ErrorKind::Unsupported`].
//!
//! [`Context::actor`] spawns a task talking to its creator over a linked
//! `PAIR`.

mod actor;
mod pipe;
mod reactor;
mod socket;

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering},
    },
};

use bytes::{BufMut, Bytes, BytesMut};
use dashmap::DashMap;
use tokio::runtime::Handle;

pub use self::{actor::Actor, reactor::InprocReactor, socket::InprocSocket};
use self::socket::{Endpoint, SocketShared};
use crate::{
    error::{Result, SocketError},
    reactor::Reactor,
    socket::{AsyncSocket, TypedSocket},
    socket_type::{SocketType, role::AsyncRole},
    transport::{Descriptor, RawSocket},
};

pub(crate) struct ContextInner {
    endpoints: DashMap<String, Endpoint>,
    reactor: Arc<InprocReactor>,
    next_descriptor: AtomicI64,
    next_key: AtomicU64,
    next_routing_id: AtomicU32,
}

impl ContextInner {
    fn next_key(&self) -> u64 { self.next_key.fetch_add(1, Ordering::Relaxed) }

    /// Five-byte identity: a zero byte then a big-endian counter.
    fn generate_routing_id(&self) -> Bytes {
        let mut id = BytesMut::with_capacity(5);
        id.put_u8(0);
        id.put_u32(self.next_routing_id.fetch_add(1, Ordering::Relaxed));
        id.freeze()
    }
}

/// Namespace of in-process endpoints with its own reactor.
///
/// Cloning a context is cheap and yields a handle to the same namespace.
///
/// # Examples
///
/// ```
/// use zmq_async::{SocketType, inproc::Context, transport::RawSocket};
///
/// let ctx = Context::new();
/// let (a, b) = ctx.linked_pair().expect("pair");
/// assert_eq!(a.socket_type(), SocketType::Pair);
/// assert_eq!(b.socket_type(), SocketType::Pair);
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Create an empty namespace.
    ///
    /// When called inside a Tokio runtime, readiness callbacks are spawned
    /// onto it; otherwise they run on the thread that changed the socket.
    #[must_use]
    pub fn new() -> Self {
        let runtime = Handle::try_current().ok();
        Self {
            inner: Arc::new(ContextInner {
                endpoints: DashMap::new(),
                reactor: Arc::new(InprocReactor::new(runtime)),
                next_descriptor: AtomicI64::new(1),
                next_key: AtomicU64::new(1),
                next_routing_id: AtomicU32::new(1),
            }),
        }
    }

    /// The reactor watching this context's sockets.
    #[must_use]
    pub fn reactor(&self) -> Arc<InprocReactor> { Arc::clone(&self.inner.reactor) }

    /// Create a raw socket of type `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::Unsupported`] for `XPUB`, `XSUB` and the
    /// draft socket types.
    pub fn socket(&self, kind: SocketType) -> io::Result<InprocSocket> {
        match kind {
            SocketType::Pair
            | SocketType::Pub
            | SocketType::Sub
            | SocketType::Req
            | SocketType::Rep
            | SocketType::Dealer
            | SocketType::Router
            | SocketType::Pull
            | SocketType::Push => {}
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("{other} sockets are not available in-process"),
                ));
            }
        }
        let descriptor = Descriptor::new(self.inner.next_descriptor.fetch_add(1, Ordering::Relaxed));
        let signal = self.inner.reactor.create_signal(descriptor);
        let shared = SocketShared::new(kind, descriptor, signal, Arc::clone(&self.inner));
        Ok(InprocSocket::from_shared(Arc::new(shared)))
    }

    /// Create an [`AsyncSocket`] of type `kind` watched by this context's
    /// reactor.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Unsupported`] for socket types the in-process
    /// transport does not implement.
    pub fn async_socket(&self, kind: SocketType) -> Result<AsyncSocket> {
        let raw = self
            .socket(kind)
            .map_err(|_| SocketError::Unsupported(kind))?;
        AsyncSocket::new(raw, self.reactor() as Arc<dyn Reactor>)
    }

    /// Create a [`TypedSocket`] for role `R`.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Unsupported`] for roles the in-process
    /// transport does not implement.
    pub fn typed_socket<R: AsyncRole>(&self) -> Result<TypedSocket<R>> {
        let raw = self
            .socket(R::TYPE)
            .map_err(|_| SocketError::Unsupported(R::TYPE))?;
        TypedSocket::new(raw, self.reactor() as Arc<dyn Reactor>)
    }

    /// Two `PAIR` sockets already connected to each other.
    ///
    /// # Errors
    ///
    /// Propagates bind or connect failures.
    pub fn linked_pair(&self) -> io::Result<(InprocSocket, InprocSocket)> {
        let a = self.socket(SocketType::Pair)?;
        let b = self.socket(SocketType::Pair)?;
        let endpoint = format!("inproc://linked-pair-{}", self.inner.next_key());
        a.bind(&endpoint)?;
        b.connect(&endpoint)?;
        Ok((a, b))
    }
}

impl Default for Context {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("endpoints", &self.inner.endpoints.len())
            .finish_non_exhaustive()
    }
}
