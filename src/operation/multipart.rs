//! Multipart send/receive driver.
//!
//! A multipart operation takes its direction's exclusivity flag and then
//! issues one [`FrameOp`] per frame, each started from the previous frame's
//! completion. Frames that complete synchronously are handled by a
//! trampoline loop instead of recursion, so long messages never grow the
//! stack.
//!
//! The driver keeps itself alive through the frame operations'
//! continuations. Dropping every handle to it therefore does not abandon a
//! message half way through.
//!
//! Stop requests are honoured only before the first frame crosses the
//! transport. After that the driver finishes the message (sending the
//! remaining frames, or draining the remaining parts) and only then reports
//! [`SocketError::Cancelled`].

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, trace};

use super::{
    completion::{Completion, CompletionSlot, Operation, StopRegistration},
    frame_op::{FrameOp, Owner},
    mode::{Mode, RecvMode, SendMode},
};
use crate::{
    error::SocketError,
    flags::{RecvFlags, SendFlags},
    frame::Frame,
    multipart::Multipart,
    sealed::Sealed,
    socket::core::{ExclusiveGuard, SocketCore},
    sync::OneShot,
};

/// Direction-specific progress of a multipart operation.
///
/// Sealed; implemented by the send and receive sequences only.
pub trait Sequence: Sealed + Send + 'static {
    type Mode: Mode;
    type Output: Send + 'static;

    /// Nothing to transfer; completes without touching the socket.
    fn is_empty(&self) -> bool;

    /// Payload and flags for the next frame.
    fn next_frame(
        &mut self,
        flags: <Self::Mode as Mode>::Flags,
    ) -> (<Self::Mode as Mode>::Payload, <Self::Mode as Mode>::Flags);

    /// Record a transferred frame. Returns `true` once the message is
    /// complete.
    fn absorb(&mut self, output: <Self::Mode as Mode>::Output) -> bool;

    fn finish(self) -> Self::Output;
}

/// Frames still to be handed to the transport.
pub struct SendSequence {
    frames: VecDeque<Frame>,
}

impl SendSequence {
    pub(crate) fn new(message: Multipart) -> Self {
        Self {
            frames: message.into_frames().collect(),
        }
    }
}

impl Sealed for SendSequence {}

impl Sequence for SendSequence {
    type Mode = SendMode;
    type Output = ();

    fn is_empty(&self) -> bool { self.frames.is_empty() }

    fn next_frame(&mut self, flags: SendFlags) -> (Option<Frame>, SendFlags) {
        let frame = self.frames.pop_front();
        let flags = if self.frames.is_empty() {
            flags
        } else {
            flags | SendFlags::SNDMORE
        };
        (frame, flags)
    }

    fn absorb(&mut self, (): ()) -> bool { self.frames.is_empty() }

    fn finish(self) {}
}

/// Parts received so far.
#[derive(Default)]
pub struct RecvSequence {
    parts: Multipart,
}

impl Sealed for RecvSequence {}

impl Sequence for RecvSequence {
    type Mode = RecvMode;
    type Output = Multipart;

    fn is_empty(&self) -> bool { false }

    fn next_frame(&mut self, flags: RecvFlags) -> ((), RecvFlags) { ((), flags) }

    fn absorb(&mut self, frame: Frame) -> bool {
        let last = !frame.more();
        self.parts.add(frame);
        last
    }

    fn finish(self) -> Multipart { self.parts }
}

type FrameResult<S> = Result<<<S as Sequence>::Mode as Mode>::Output, SocketError>;

struct Progress<S: Sequence> {
    sequence: Option<S>,
    guard: Option<ExclusiveGuard>,
    current: Option<Arc<FrameOp<S::Mode>>>,
    /// At least one frame has crossed the transport.
    committed: bool,
    /// A frame operation is being started on this thread; its outcome is
    /// parked in `parked` for the trampoline to pick up.
    stepping: bool,
    parked: Option<FrameResult<S>>,
}

pub(crate) struct MultipartOp<S: Sequence> {
    core: Arc<SocketCore>,
    flags: <S::Mode as Mode>::Flags,
    progress: Mutex<Progress<S>>,
    stop_requested: AtomicBool,
    finished: OneShot,
    slot: CompletionSlot<S::Output>,
}

impl<S: Sequence> MultipartOp<S> {
    pub(crate) fn new(
        core: Arc<SocketCore>,
        sequence: S,
        flags: <S::Mode as Mode>::Flags,
        completion: Completion<S::Output>,
    ) -> Arc<Self> {
        Arc::new(Self {
            core,
            flags,
            progress: Mutex::new(Progress {
                sequence: Some(sequence),
                guard: None,
                current: None,
                committed: false,
                stepping: false,
                parked: None,
            }),
            stop_requested: AtomicBool::new(false),
            finished: OneShot::new(),
            slot: CompletionSlot::new(completion),
        })
    }

    fn progress(&self) -> MutexGuard<'_, Progress<S>> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_pending(&self) -> bool { self.stop_requested.load(Ordering::Acquire) }

    /// Start frame operations until one completes asynchronously.
    fn step(self: &Arc<Self>) {
        loop {
            let frame_op = {
                let mut progress = self.progress();
                if !progress.committed && self.stop_pending() {
                    drop(progress);
                    self.finish(Err(SocketError::Cancelled));
                    return;
                }
                let Some(sequence) = progress.sequence.as_mut() else {
                    return;
                };
                let (payload, flags) = sequence.next_frame(self.flags);
                let driver = Arc::clone(self);
                let frame_op = FrameOp::<S::Mode>::new(
                    Arc::clone(&self.core),
                    payload,
                    flags,
                    Owner::Multipart,
                    Box::new(move |result| driver.on_frame_done(result)),
                );
                progress.current = Some(Arc::clone(&frame_op));
                progress.stepping = true;
                frame_op
            };
            frame_op.start();
            let result = {
                let mut progress = self.progress();
                progress.stepping = false;
                match progress.parked.take() {
                    Some(result) => result,
                    None => return,
                }
            };
            if !self.absorb(result) {
                return;
            }
        }
    }

    fn on_frame_done(self: &Arc<Self>, result: FrameResult<S>) {
        {
            let mut progress = self.progress();
            if progress.stepping {
                progress.parked = Some(result);
                return;
            }
        }
        if self.absorb(result) {
            self.step();
        }
    }

    /// Fold one frame outcome into the message. Returns `true` when the next
    /// frame should be started.
    fn absorb(&self, result: FrameResult<S>) -> bool {
        let mut progress = self.progress();
        progress.current = None;
        match result {
            Ok(output) => {
                progress.committed = true;
                let done = progress
                    .sequence
                    .as_mut()
                    .is_none_or(|sequence| sequence.absorb(output));
                if !done {
                    return true;
                }
                let sequence = progress.sequence.take();
                drop(progress);
                if self.stop_pending() {
                    debug!(
                        direction = %<S::Mode as Mode>::DIRECTION,
                        "multipart completed before honouring stop request"
                    );
                    self.finish(Err(SocketError::Cancelled));
                } else if let Some(sequence) = sequence {
                    self.finish(Ok(sequence.finish()));
                }
                false
            }
            Err(e) => {
                drop(progress);
                self.finish(Err(e));
                false
            }
        }
    }

    /// Release exclusivity, then deliver the outcome.
    fn finish(&self, result: Result<S::Output, SocketError>) {
        if !self.finished.claim() {
            return;
        }
        let guard = {
            let mut progress = self.progress();
            progress.sequence = None;
            progress.guard.take()
        };
        drop(guard);
        trace!(
            direction = %<S::Mode as Mode>::DIRECTION,
            ok = result.is_ok(),
            "multipart operation finished"
        );
        self.slot.complete(result);
    }
}

impl<S: Sequence> Operation for MultipartOp<S> {
    fn start(self: Arc<Self>) {
        if self.core.raw().is_closed() {
            self.finish(Err(SocketError::NullSocket));
            return;
        }
        let empty = {
            let mut progress = self.progress();
            if progress.sequence.as_ref().is_some_and(S::is_empty) {
                progress.sequence.take()
            } else {
                None
            }
        };
        if let Some(sequence) = empty {
            self.finish(Ok(sequence.finish()));
            return;
        }
        match self.core.acquire(<S::Mode as Mode>::DIRECTION) {
            Ok(guard) => self.progress().guard = Some(guard),
            Err(e) => {
                self.finish(Err(e));
                return;
            }
        }
        self.step();
    }

    fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        let current = {
            let progress = self.progress();
            if progress.committed {
                None
            } else {
                progress.current.clone()
            }
        };
        if let Some(frame_op) = current {
            frame_op.request_stop();
        }
    }

    fn attach_stop(&self, registration: StopRegistration) { self.slot.attach_stop(registration); }
}
