//! Single-frame send/receive state machine.
//!
//! A [`FrameOp`] is started once. It first tries the transport directly
//! when the socket already reports readiness. Otherwise it parks a one-shot
//! readiness wait and retries from the watcher's callback until the
//! transport accepts the call, fails hard, or a stop request wins.
//!
//! Completion is guarded by a [`CompletionGate`]. Whoever claims it (the
//! direct attempt, a readiness callback, or the stop path) is the only party
//! allowed to touch the transport or deliver the outcome. A readiness
//! callback that claims the gate but meets a would-block hands it back
//! before re-waiting, unless a stop arrived meanwhile, in which case it
//! finishes the operation as stopped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use super::{
    completion::{Completion, CompletionSlot, Operation, StopRegistration},
    mode::{Attempt, Mode},
};
use crate::{
    error::SocketError,
    metrics,
    reactor::WatchToken,
    socket::core::SocketCore,
    sync::CompletionGate,
};

/// Who issued the frame operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Owner {
    /// A caller of the socket facade.
    Facade,
    /// A multipart operation holding the direction's exclusivity flag.
    Multipart,
}

/// The most recent readiness wait.
///
/// A watch may resolve (even inline, inside `wait_for`) before its token is
/// stored; the generation stops a late store from clobbering the token of a
/// newer wait.
#[derive(Default)]
struct WatchSlot {
    generation: u64,
    token: Option<WatchToken>,
    resolved: bool,
}

pub(crate) struct FrameOp<M: Mode> {
    core: Arc<SocketCore>,
    flags: M::Flags,
    owner: Owner,
    payload: Mutex<M::Payload>,
    gate: CompletionGate,
    watch: Mutex<WatchSlot>,
    slot: CompletionSlot<M::Output>,
}

impl<M: Mode> FrameOp<M> {
    pub(crate) fn new(
        core: Arc<SocketCore>,
        payload: M::Payload,
        flags: M::Flags,
        owner: Owner,
        completion: Completion<M::Output>,
    ) -> Arc<Self> {
        Arc::new(Self {
            core,
            flags,
            owner,
            payload: Mutex::new(payload),
            gate: CompletionGate::new(),
            watch: Mutex::new(WatchSlot::default()),
            slot: CompletionSlot::new(completion),
        })
    }

    /// A facade operation may not use the fast path while a multipart
    /// operation owns the same direction.
    fn fast_path_allowed(&self) -> bool {
        self.owner == Owner::Multipart || !self.core.multipart_in_progress(M::DIRECTION)
    }

    fn watch_slot(&self) -> MutexGuard<'_, WatchSlot> { self.watch.lock().unwrap_or_else(PoisonError::into_inner) }

    fn attempt(&self) -> Attempt<M::Output> {
        let mut payload = self.payload.lock().unwrap_or_else(PoisonError::into_inner);
        M::attempt(self.core.raw(), &mut payload, self.flags)
    }

    /// Retry the transport if it reports readiness, otherwise park a wait.
    ///
    /// Each invocation makes at most one transport call.
    fn drive(self: &Arc<Self>) {
        if !M::is_ready(self.core.events()) {
            self.wait();
            return;
        }
        if !self.gate.claim() {
            return;
        }
        match self.attempt() {
            Attempt::Done(output) => self.finish(Ok(output)),
            Attempt::Failed(e) => self.finish(Err(e)),
            Attempt::WouldBlock => {
                if self.gate.release_unless_stopped() {
                    self.finish(Err(SocketError::Cancelled));
                } else {
                    self.wait();
                }
            }
        }
    }

    fn wait(self: &Arc<Self>) {
        let generation = {
            let mut slot = self.watch_slot();
            slot.generation += 1;
            slot.token = None;
            slot.resolved = false;
            slot.generation
        };
        let op = Arc::clone(self);
        match self
            .core
            .watcher()
            .wait_for(M::INTEREST, move |status| op.on_ready(generation, status))
        {
            Ok(token) => {
                {
                    let mut slot = self.watch_slot();
                    if slot.generation == generation && !slot.resolved {
                        slot.token = Some(token);
                    }
                }
                // A stop request may have completed the operation while the
                // wait was being registered.
                if self.gate.is_claimed() {
                    self.cancel_pending_watch();
                }
            }
            Err(e) => {
                if self.gate.claim() {
                    self.finish(Err(SocketError::Io(e)));
                }
            }
        }
    }

    fn on_ready(self: Arc<Self>, generation: u64, status: std::io::Result<()>) {
        {
            let mut slot = self.watch_slot();
            if slot.generation == generation {
                slot.resolved = true;
                slot.token = None;
            }
        }
        match status {
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                if self.gate.claim() {
                    self.finish(Err(SocketError::Io(e)));
                }
            }
            Ok(()) if self.core.raw().is_closed() => {
                if self.gate.claim() {
                    self.finish(Err(SocketError::NullSocket));
                }
            }
            Ok(()) if self.gate.stop_requested() => {
                if self.gate.claim() {
                    self.finish(Err(SocketError::Cancelled));
                }
            }
            Ok(()) => self.drive(),
        }
    }

    fn cancel_pending_watch(&self) {
        let token = self.watch_slot().token.take();
        if let Some(token) = token {
            self.core.watcher().cancel(token);
        }
    }

    fn finish(&self, result: Result<M::Output, SocketError>) {
        let direction = M::DIRECTION;
        match &result {
            Ok(_) => {
                metrics::inc_frames(direction);
                trace!(%direction, "frame operation completed");
            }
            Err(SocketError::Cancelled) => {
                metrics::inc_cancelled(direction);
                trace!(%direction, "frame operation stopped");
            }
            Err(e) => {
                metrics::inc_errors(direction);
                trace!(%direction, error = %e, "frame operation failed");
            }
        }
        self.slot.complete(result);
    }
}

impl<M: Mode> Operation for FrameOp<M> {
    fn start(self: Arc<Self>) {
        if self.core.raw().is_closed() {
            if self.gate.claim() {
                self.finish(Err(SocketError::NullSocket));
            }
            return;
        }
        if self.gate.stop_requested() {
            if self.gate.claim() {
                self.finish(Err(SocketError::Cancelled));
            }
            return;
        }
        if self.fast_path_allowed() {
            self.drive();
        } else {
            self.wait();
        }
    }

    fn request_stop(&self) {
        if !self.gate.request_stop() {
            return;
        }
        self.cancel_pending_watch();
        self.finish(Err(SocketError::Cancelled));
    }

    fn attach_stop(&self, registration: StopRegistration) { self.slot.attach_stop(registration); }
}
