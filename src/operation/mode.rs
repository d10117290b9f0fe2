//! Direction-specific behaviour of the single-frame state machine.

use crate::{
    error::SocketError,
    flags::{Events, RecvFlags, SendFlags},
    frame::Frame,
    metrics::Direction,
    reactor::Interest,
    sealed::Sealed,
    transport::{RawSocket, TryRecvError, TrySendError},
};

/// Outcome of one non-blocking transport call.
pub enum Attempt<T> {
    Done(T),
    WouldBlock,
    Failed(SocketError),
}

/// Send or receive: the only thing that differs between the two frame
/// operations.
///
/// Sealed; implemented by [`SendMode`] and [`RecvMode`].
pub trait Mode: Sealed + Send + Sync + 'static {
    /// Per-operation input held until the transport accepts it.
    type Payload: Send + 'static;
    /// Caller-supplied flags.
    type Flags: Copy + Send + Sync + 'static;
    /// Value the operation completes with.
    type Output: Send + 'static;

    /// Readiness condition waited for.
    const INTEREST: Interest;
    /// Direction used for exclusivity, logs and metrics.
    const DIRECTION: Direction;

    #[doc(hidden)]
    fn is_ready(events: Events) -> bool;

    /// Perform one non-blocking transport call.
    ///
    /// Would-block leaves `payload` able to retry.
    #[doc(hidden)]
    fn attempt(
        raw: &dyn RawSocket,
        payload: &mut Self::Payload,
        flags: Self::Flags,
    ) -> Attempt<Self::Output>;
}

/// Marker for frame sends.
#[derive(Debug)]
pub struct SendMode;

/// Marker for frame receives.
#[derive(Debug)]
pub struct RecvMode;

impl Sealed for SendMode {}
impl Sealed for RecvMode {}

impl Mode for SendMode {
    type Payload = Option<Frame>;
    type Flags = SendFlags;
    type Output = ();

    const INTEREST: Interest = Interest::Writable;
    const DIRECTION: Direction = Direction::Send;

    fn is_ready(events: Events) -> bool { events.can_send() }

    fn attempt(raw: &dyn RawSocket, payload: &mut Option<Frame>, flags: SendFlags) -> Attempt<()> {
        let Some(frame) = payload.take() else {
            return Attempt::Done(());
        };
        match raw.try_send(frame, flags | SendFlags::DONTWAIT) {
            Ok(()) => Attempt::Done(()),
            Err(TrySendError::WouldBlock(frame)) => {
                *payload = Some(frame);
                Attempt::WouldBlock
            }
            Err(TrySendError::Failed(e)) => Attempt::Failed(SocketError::Send(e)),
        }
    }
}

impl Mode for RecvMode {
    type Payload = ();
    type Flags = RecvFlags;
    type Output = Frame;

    const INTEREST: Interest = Interest::Readable;
    const DIRECTION: Direction = Direction::Recv;

    fn is_ready(events: Events) -> bool { events.can_recv() }

    fn attempt(raw: &dyn RawSocket, _payload: &mut (), flags: RecvFlags) -> Attempt<Frame> {
        match raw.try_recv(flags | RecvFlags::DONTWAIT) {
            Ok(frame) => Attempt::Done(frame),
            Err(TryRecvError::WouldBlock) => Attempt::WouldBlock,
            Err(TryRecvError::Failed(e)) => Attempt::Failed(SocketError::Recv(e)),
        }
    }
}
