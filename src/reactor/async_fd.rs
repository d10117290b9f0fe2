//! Reactor backed by Tokio's `AsyncFd`.
//!
//! Each registered descriptor is wrapped in an [`AsyncFd`] that borrows the
//! raw fd: dropping the registration removes it from the runtime's poller
//! but never closes it. Each watch is a small task awaiting readiness; its
//! abort handle is the cancellation registration.

use std::{
    collections::HashMap,
    io,
    os::fd::{AsRawFd, RawFd},
    sync::{
        Arc,
        Mutex,
        PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use tokio::{
    io::{Interest as TokioInterest, unix::AsyncFd},
    runtime::Handle,
    task::AbortHandle,
};
use tracing::trace;

use super::{Interest, Reactor, ReadyCallback, WatchToken, not_registered};
use crate::transport::Descriptor;

/// Raw fd borrowed from the transport. Dropping it does not close the fd.
struct BorrowedDescriptor(RawFd);

impl AsRawFd for BorrowedDescriptor {
    fn as_raw_fd(&self) -> RawFd { self.0 }
}

struct Registration {
    fd: AsyncFd<BorrowedDescriptor>,
    watches: Mutex<HashMap<WatchToken, AbortHandle>>,
}

impl Registration {
    fn forget(&self, token: WatchToken) -> Option<AbortHandle> {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&token)
    }
}

/// [`Reactor`] for transports exposing a real unix file descriptor.
///
/// # Examples
///
/// ```no_run
/// use zmq_async::reactor::AsyncFdReactor;
///
/// # async fn demo() -> std::io::Result<()> {
/// let reactor = AsyncFdReactor::new()?;
/// # drop(reactor);
/// # Ok(())
/// # }
/// ```
pub struct AsyncFdReactor {
    handle: Handle,
    registrations: DashMap<Descriptor, Arc<Registration>>,
    next_token: AtomicU64,
}

impl AsyncFdReactor {
    /// Create a reactor bound to the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails when called outside a Tokio runtime.
    pub fn new() -> io::Result<Self> {
        let handle = Handle::try_current().map_err(io::Error::other)?;
        Ok(Self::with_handle(handle))
    }

    /// Create a reactor bound to an explicit runtime handle.
    #[must_use]
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle,
            registrations: DashMap::new(),
            next_token: AtomicU64::new(0),
        }
    }
}

impl Reactor for AsyncFdReactor {
    fn register(&self, descriptor: Descriptor) -> io::Result<()> {
        let raw = RawFd::try_from(descriptor.as_raw())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let _runtime = self.handle.enter();
        let fd = AsyncFd::with_interest(
            BorrowedDescriptor(raw),
            TokioInterest::READABLE | TokioInterest::WRITABLE,
        )?;
        self.registrations.insert(
            descriptor,
            Arc::new(Registration {
                fd,
                watches: Mutex::new(HashMap::new()),
            }),
        );
        trace!(%descriptor, "descriptor registered");
        Ok(())
    }

    fn watch(
        &self,
        descriptor: Descriptor,
        interest: Interest,
        on_ready: ReadyCallback,
    ) -> io::Result<WatchToken> {
        let registration = self
            .registrations
            .get(&descriptor)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| not_registered(descriptor))?;
        let token = WatchToken::new(self.next_token.fetch_add(1, Ordering::Relaxed));

        // Hold the map lock across the spawn so the task cannot forget its
        // token before it has been recorded.
        let mut watches = registration
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let task_registration = Arc::clone(&registration);
        let task = self.handle.spawn(async move {
            let status = match interest {
                Interest::Readable => task_registration
                    .fd
                    .readable()
                    .await
                    .map(|mut guard| guard.clear_ready()),
                Interest::Writable => task_registration
                    .fd
                    .writable()
                    .await
                    .map(|mut guard| guard.clear_ready()),
            };
            task_registration.forget(token);
            on_ready(status);
        });
        watches.insert(token, task.abort_handle());
        Ok(token)
    }

    fn cancel_watch(&self, descriptor: Descriptor, token: WatchToken) {
        let Some(registration) = self
            .registrations
            .get(&descriptor)
            .map(|entry| Arc::clone(entry.value()))
        else {
            return;
        };
        if let Some(task) = registration.forget(token) {
            task.abort();
            trace!(%descriptor, %token, "watch cancelled");
        }
    }

    fn deregister(&self, descriptor: Descriptor) {
        if let Some((_, registration)) = self.registrations.remove(&descriptor) {
            let watches = std::mem::take(
                &mut *registration
                    .watches
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            for task in watches.into_values() {
                task.abort();
            }
            trace!(%descriptor, "descriptor deregistered");
        }
    }
}
