//! Lazy operation descriptions returned by the socket facade.
//!
//! Nothing touches the socket until a sender is awaited or connected and
//! started.

use std::{future::IntoFuture, marker::PhantomData, sync::Arc};

use super::{
    completion::{Completion, Operation},
    frame_op::{FrameOp, Owner},
    future::OperationFuture,
    mode::{Mode, RecvMode, SendMode},
    multipart::{MultipartOp, RecvSequence, SendSequence, Sequence},
    receiver::{OperationState, Receiver, completion_for},
};
use crate::{
    error::Result,
    flags::{RecvFlags, SendFlags},
    multipart::Multipart,
    sealed::Sealed,
    socket::core::SocketCore,
};

/// Something that can be turned into a running operation.
///
/// Sealed; implemented by the senders returned from
/// [`AsyncSocket`](crate::AsyncSocket).
pub trait Sender: Sealed + Sized {
    /// Value delivered on success.
    type Value: Send + 'static;

    #[doc(hidden)]
    fn into_operation(self, completion: Completion<Self::Value>) -> Arc<dyn Operation>;

    /// Connect the sender to a continuation receiver.
    fn connect<R>(self, receiver: R) -> OperationState
    where
        R: Receiver<Self::Value>,
    {
        let stop_token = receiver.stop_token();
        let op = self.into_operation(completion_for(receiver));
        OperationState::new(op, stop_token)
    }
}

/// Single-frame send or receive.
#[must_use = "senders do nothing unless awaited or connected"]
pub struct FrameSender<'a, M: Mode> {
    core: Arc<SocketCore>,
    payload: M::Payload,
    flags: M::Flags,
    _socket: PhantomData<&'a ()>,
}

/// Sender returned by [`AsyncSocket::send`](crate::AsyncSocket::send).
pub type SendSender<'a> = FrameSender<'a, SendMode>;
/// Sender returned by [`AsyncSocket::recv`](crate::AsyncSocket::recv).
pub type RecvSender<'a> = FrameSender<'a, RecvMode>;

impl<M: Mode> FrameSender<'_, M> {
    pub(crate) fn new(core: Arc<SocketCore>, payload: M::Payload, flags: M::Flags) -> Self {
        Self {
            core,
            payload,
            flags,
            _socket: PhantomData,
        }
    }
}

impl<M: Mode> Sealed for FrameSender<'_, M> {}

impl<M: Mode> Sender for FrameSender<'_, M> {
    type Value = M::Output;

    fn into_operation(self, completion: Completion<M::Output>) -> Arc<dyn Operation> {
        FrameOp::<M>::new(self.core, self.payload, self.flags, Owner::Facade, completion)
    }
}

impl<'a, M: Mode> IntoFuture for FrameSender<'a, M> {
    type Output = Result<M::Output>;
    type IntoFuture = OperationFuture<'a, M::Output>;

    fn into_future(self) -> Self::IntoFuture {
        OperationFuture::new(|completion| self.into_operation(completion))
    }
}

/// Whole-message send or receive.
#[must_use = "senders do nothing unless awaited or connected"]
pub struct MultipartSender<'a, S: Sequence> {
    core: Arc<SocketCore>,
    sequence: S,
    flags: <S::Mode as Mode>::Flags,
    _socket: PhantomData<&'a ()>,
}

/// Sender returned by
/// [`AsyncSocket::send_multipart`](crate::AsyncSocket::send_multipart).
pub type SendMultipartSender<'a> = MultipartSender<'a, SendSequence>;
/// Sender returned by
/// [`AsyncSocket::recv_multipart`](crate::AsyncSocket::recv_multipart).
pub type RecvMultipartSender<'a> = MultipartSender<'a, RecvSequence>;

impl MultipartSender<'_, SendSequence> {
    /// `SNDMORE` is owned by the driver and stripped from `flags`.
    pub(crate) fn send(core: Arc<SocketCore>, message: Multipart, flags: SendFlags) -> Self {
        Self {
            core,
            sequence: SendSequence::new(message),
            flags: flags - SendFlags::SNDMORE,
            _socket: PhantomData,
        }
    }
}

impl MultipartSender<'_, RecvSequence> {
    pub(crate) fn recv(core: Arc<SocketCore>, flags: RecvFlags) -> Self {
        Self {
            core,
            sequence: RecvSequence::default(),
            flags,
            _socket: PhantomData,
        }
    }
}

impl<S: Sequence> Sealed for MultipartSender<'_, S> {}

impl<S: Sequence> Sender for MultipartSender<'_, S> {
    type Value = S::Output;

    fn into_operation(self, completion: Completion<S::Output>) -> Arc<dyn Operation> {
        MultipartOp::new(self.core, self.sequence, self.flags, completion)
    }
}

impl<'a, S: Sequence> IntoFuture for MultipartSender<'a, S> {
    type Output = Result<S::Output>;
    type IntoFuture = OperationFuture<'a, S::Output>;

    fn into_future(self) -> Self::IntoFuture {
        OperationFuture::new(|completion| self.into_operation(completion))
    }
}
