//! Continuation-style front-end.
//!
//! A sender is connected to a [`Receiver`], producing an
//! [`OperationState`]. Starting the state runs the operation; exactly one of
//! the receiver's three channels is invoked once it resolves, possibly on a
//! reactor thread.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio_util::sync::CancellationToken;

use super::completion::{Completion, Operation, StopRegistration};
use crate::error::SocketError;

/// Consumer of an operation's outcome.
///
/// # Examples
///
/// ```
/// use zmq_async::{Frame, SocketError, operation::Receiver};
///
/// struct Print;
///
/// impl Receiver<Frame> for Print {
///     fn set_value(self, frame: Frame) { println!("{frame:?}"); }
///     fn set_error(self, error: SocketError) { eprintln!("{error}"); }
///     fn set_stopped(self) {}
/// }
/// ```
pub trait Receiver<T>: Send + 'static {
    /// The operation succeeded.
    fn set_value(self, value: T);

    /// The operation failed.
    fn set_error(self, error: SocketError);

    /// The operation honoured a stop request.
    fn set_stopped(self);

    /// Token whose cancellation requests a stop. `None` means the operation
    /// cannot be stopped through the receiver.
    fn stop_token(&self) -> Option<CancellationToken> { None }
}

pub(crate) fn completion_for<T, R>(receiver: R) -> Completion<T>
where
    R: Receiver<T>,
{
    Box::new(move |result| match result {
        Ok(value) => receiver.set_value(value),
        Err(SocketError::Cancelled) => receiver.set_stopped(),
        Err(e) => receiver.set_error(e),
    })
}

/// A connected, not yet started operation.
///
/// The state keeps the socket core alive; the socket facade may be dropped
/// while the operation is outstanding.
#[must_use = "operations do nothing until started"]
pub struct OperationState {
    op: Arc<dyn Operation>,
    stop_token: Option<CancellationToken>,
    started: AtomicBool,
}

impl OperationState {
    pub(crate) fn new(op: Arc<dyn Operation>, stop_token: Option<CancellationToken>) -> Self {
        Self {
            op,
            stop_token,
            started: AtomicBool::new(false),
        }
    }

    /// Run the operation. Further calls are ignored.
    ///
    /// When the socket is already ready the receiver is completed before this
    /// returns. A receiver whose stop token is already cancelled is completed
    /// as stopped unless that direct attempt succeeded.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        Arc::clone(&self.op).start();
        let Some(token) = &self.stop_token else {
            return;
        };
        if token.is_cancelled() {
            self.op.request_stop();
        } else if let Some(registration) =
            StopRegistration::watch(token.clone(), Arc::downgrade(&self.op))
        {
            self.op.attach_stop(registration);
        }
    }

    /// Ask the operation to stop.
    pub fn request_stop(&self) { self.op.request_stop(); }
}

impl std::fmt::Debug for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationState")
            .field("started", &self.started.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
