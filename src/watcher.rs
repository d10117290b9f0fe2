//! Readiness watcher bound to one socket descriptor.
//!
//! A [`Watcher`] pairs a reactor with the descriptor of exactly one socket
//! for the socket's whole lifetime. It turns "the descriptor is readable /
//! writable" into a single deferred invocation per [`Watcher::wait_for`]
//! call. Dropping the watcher deregisters the descriptor without closing
//! it; the transport owns the descriptor.

use std::{io, sync::Arc};

use tracing::trace;

use crate::{
    reactor::{Interest, Reactor, ReadyCallback, WatchToken},
    transport::Descriptor,
};

/// One-shot readiness waits on a single descriptor.
pub struct Watcher {
    reactor: Arc<dyn Reactor>,
    descriptor: Descriptor,
}

impl Watcher {
    /// Register `descriptor` with `reactor`.
    ///
    /// # Errors
    ///
    /// Propagates the reactor's registration failure.
    pub fn new(reactor: Arc<dyn Reactor>, descriptor: Descriptor) -> io::Result<Self> {
        reactor.register(descriptor)?;
        Ok(Self {
            reactor,
            descriptor,
        })
    }

    /// The watched descriptor.
    #[must_use]
    pub fn descriptor(&self) -> Descriptor { self.descriptor }

    /// Invoke `on_ready` once, when the descriptor becomes active for
    /// `interest`. The wait must be re-issued for further notifications.
    ///
    /// # Errors
    ///
    /// Fails if the reactor rejects the watch; `on_ready` is not invoked.
    pub fn wait_for(
        &self,
        interest: Interest,
        on_ready: impl FnOnce(io::Result<()>) + Send + 'static,
    ) -> io::Result<WatchToken> {
        let callback: ReadyCallback = Box::new(on_ready);
        let token = self.reactor.watch(self.descriptor, interest, callback)?;
        trace!(descriptor = %self.descriptor, ?interest, %token, "readiness wait registered");
        Ok(token)
    }

    /// Abort a pending wait.
    ///
    /// The reactor decides whether the callback is dropped or invoked with an
    /// interrupted status; callers treat both as "no further progress".
    pub fn cancel(&self, token: WatchToken) { self.reactor.cancel_watch(self.descriptor, token); }
}

impl Drop for Watcher {
    fn drop(&mut self) { self.reactor.deregister(self.descriptor); }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
