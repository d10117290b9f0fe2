//! Asynchronous socket operations.
//!
//! Every operation is a small state machine shared between the issuing
//! caller, the readiness watcher and a stop source. Two front-ends drive the
//! same machines:
//!
//! - awaiting a sender ([`OperationFuture`]), and
//! - connecting it to a [`Receiver`] and starting the resulting
//!   [`OperationState`].

mod completion;
mod frame_op;
mod future;
mod mode;
mod multipart;
mod receiver;
mod sender;

pub use completion::{Completion, Operation, StopRegistration};
pub use future::OperationFuture;
pub use mode::{Mode, RecvMode, SendMode};
pub use receiver::{OperationState, Receiver};
pub use sender::{
    FrameSender,
    MultipartSender,
    RecvMultipartSender,
    RecvSender,
    SendMultipartSender,
    SendSender,
    Sender,
};
