//! The event substrate consumed by readiness watchers.
//!
//! A [`Reactor`] turns "this descriptor became active" notifications into a
//! single deferred callback per registered watch. It never touches the
//! socket itself and never closes the descriptors it watches.
//!
//! Two implementations ship with the crate: [`AsyncFdReactor`] (unix) for
//! transports exposing a real OS descriptor, and
//! [`InprocReactor`](crate::inproc::InprocReactor) for the in-process
//! transport.

#[cfg(unix)]
mod async_fd;

use std::{fmt, io};

#[cfg(unix)]
pub use async_fd::AsyncFdReactor;

use crate::transport::Descriptor;

/// Readiness condition a watch waits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interest {
    /// The descriptor reports inbound activity.
    Readable,
    /// The descriptor reports outbound capacity.
    Writable,
}

/// Continuation invoked once when a watch resolves.
///
/// An `Err` status reports a reactor failure. A watch that was cancelled may
/// be resolved with [`io::ErrorKind::Interrupted`] or dropped uninvoked.
pub type ReadyCallback = Box<dyn FnOnce(io::Result<()>) + Send + 'static>;

/// Identifies one pending watch so it can be cancelled individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchToken(u64);

impl WatchToken {
    /// Wrap a reactor-assigned token value.
    #[must_use]
    pub const fn new(raw: u64) -> Self { Self(raw) }

    /// Return the token value.
    #[must_use]
    pub const fn as_u64(self) -> u64 { self.0 }
}

impl fmt::Display for WatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "watch#{}", self.0) }
}

/// Readiness notification substrate.
pub trait Reactor: Send + Sync + 'static {
    /// Start tracking `descriptor`. Called once per watcher.
    ///
    /// # Errors
    ///
    /// Fails if the descriptor cannot be watched.
    fn register(&self, descriptor: Descriptor) -> io::Result<()>;

    /// Invoke `on_ready` once, when `descriptor` is active for `interest`.
    ///
    /// # Errors
    ///
    /// Fails if the descriptor is not registered. The callback is dropped
    /// uninvoked in that case.
    fn watch(
        &self,
        descriptor: Descriptor,
        interest: Interest,
        on_ready: ReadyCallback,
    ) -> io::Result<WatchToken>;

    /// Abort a pending watch. Cancelling a resolved watch is a no-op.
    fn cancel_watch(&self, descriptor: Descriptor, token: WatchToken);

    /// Stop tracking `descriptor`, dropping its pending watches. The
    /// descriptor stays open.
    fn deregister(&self, descriptor: Descriptor);
}

pub(crate) fn not_registered(descriptor: Descriptor) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{descriptor} is not registered with the reactor"),
    )
}
