//! State shared between a socket facade and its in-flight operations.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::trace;

use crate::{
    error::SocketError,
    flags::Events,
    metrics::Direction,
    transport::RawSocket,
    watcher::Watcher,
};

/// Transport handle, its watcher and the multipart exclusivity flags.
///
/// Operations hold this through an `Arc` so continuations running on other
/// threads can reach the socket after the issuing call has returned.
pub(crate) struct SocketCore {
    // Declared before `raw` so the descriptor is deregistered before the
    // transport handle is dropped.
    watcher: Watcher,
    raw: Box<dyn RawSocket>,
    send_busy: AtomicBool,
    recv_busy: AtomicBool,
}

impl SocketCore {
    pub(crate) fn new(raw: Box<dyn RawSocket>, watcher: Watcher) -> Self {
        Self {
            watcher,
            raw,
            send_busy: AtomicBool::new(false),
            recv_busy: AtomicBool::new(false),
        }
    }

    pub(crate) fn raw(&self) -> &dyn RawSocket { &*self.raw }

    pub(crate) fn watcher(&self) -> &Watcher { &self.watcher }

    pub(crate) fn events(&self) -> Events { self.raw.events() }

    fn busy_flag(&self, direction: Direction) -> &AtomicBool {
        match direction {
            Direction::Send => &self.send_busy,
            Direction::Recv => &self.recv_busy,
        }
    }

    /// Returns `true` while a multipart operation owns `direction`.
    pub(crate) fn multipart_in_progress(&self, direction: Direction) -> bool {
        self.busy_flag(direction).load(Ordering::Acquire)
    }

    /// Take the exclusivity flag for `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::SocketBusy`] if another multipart operation
    /// already owns the direction.
    pub(crate) fn acquire(self: &Arc<Self>, direction: Direction) -> Result<ExclusiveGuard, SocketError> {
        self.busy_flag(direction)
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SocketError::SocketBusy(direction))?;
        trace!(%direction, "multipart exclusivity acquired");
        Ok(ExclusiveGuard {
            core: Arc::clone(self),
            direction,
        })
    }
}

/// RAII ownership of one direction's exclusivity flag.
///
/// Dropping the guard clears the flag, so every exit path of a multipart
/// operation releases it.
pub(crate) struct ExclusiveGuard {
    core: Arc<SocketCore>,
    direction: Direction,
}

impl Drop for ExclusiveGuard {
    fn drop(&mut self) {
        self.core
            .busy_flag(self.direction)
            .store(false, Ordering::Release);
        trace!(direction = %self.direction, "multipart exclusivity released");
    }
}
