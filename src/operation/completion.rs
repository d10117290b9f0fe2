//! Completion delivery and stop-callback bookkeeping shared by every
//! operation state machine.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::{runtime::Handle, task::AbortHandle};
use tokio_util::sync::CancellationToken;

use crate::error::SocketError;

/// Continuation receiving an operation's single outcome.
pub type Completion<T> = Box<dyn FnOnce(Result<T, SocketError>) + Send + 'static>;

/// A startable, stoppable operation.
///
/// Both front-ends drive operations exclusively through this trait.
pub trait Operation: Send + Sync + 'static {
    /// Begin the operation. Called at most once.
    fn start(self: Arc<Self>);

    /// Ask the operation to stop. Honoured only if it has not completed or
    /// passed the point where stopping would lose data.
    fn request_stop(&self);

    /// Keep `registration` alive until the operation completes.
    fn attach_stop(&self, registration: StopRegistration);
}

/// Stop callback subscribed to a cancellation token.
///
/// Dropping the registration unsubscribes the callback.
#[derive(Debug)]
pub struct StopRegistration(AbortHandle);

impl StopRegistration {
    /// Subscribe `op` to `token`.
    ///
    /// Returns `None` when no Tokio runtime is available to watch the token.
    pub(crate) fn watch(token: CancellationToken, op: Weak<dyn Operation>) -> Option<Self> {
        let handle = Handle::try_current().ok()?;
        let task = handle.spawn(async move {
            token.cancelled().await;
            if let Some(op) = op.upgrade() {
                op.request_stop();
            }
        });
        Some(Self(task.abort_handle()))
    }
}

impl Drop for StopRegistration {
    fn drop(&mut self) { self.0.abort(); }
}

#[derive(Default)]
struct StopSlot {
    finished: bool,
    registration: Option<StopRegistration>,
}

/// Holds the continuation and stop registration of one operation.
pub(crate) struct CompletionSlot<T> {
    completion: Mutex<Option<Completion<T>>>,
    stop: Mutex<StopSlot>,
}

impl<T> CompletionSlot<T> {
    pub(crate) fn new(completion: Completion<T>) -> Self {
        Self {
            completion: Mutex::new(Some(completion)),
            stop: Mutex::new(StopSlot::default()),
        }
    }

    /// Store `registration` unless the operation already completed, in which
    /// case it is dropped at once.
    pub(crate) fn attach_stop(&self, registration: StopRegistration) {
        let mut stop = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        if !stop.finished {
            stop.registration = Some(registration);
        }
    }

    /// Deliver `result`. Later calls are ignored.
    ///
    /// The stop registration is reset before the continuation runs, and no
    /// lock is held while it does.
    pub(crate) fn complete(&self, result: Result<T, SocketError>) {
        let registration = {
            let mut stop = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
            stop.finished = true;
            stop.registration.take()
        };
        drop(registration);
        let completion = self
            .completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(completion) = completion {
            completion(result);
        }
    }
}
