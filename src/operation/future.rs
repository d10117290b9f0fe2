//! Awaitable front-end.

use std::{
    future::Future,
    marker::PhantomData,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tokio::sync::oneshot;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use super::completion::{Completion, Operation};
use crate::error::{Result, SocketError};

/// Future resolving to an operation's outcome.
///
/// The operation starts on first poll. Dropping the future before it
/// resolves requests a stop; a multipart operation past its first frame
/// still completes the message on the wire.
///
/// The future borrows the socket it was issued on, so the socket outlives
/// every await.
#[must_use = "futures do nothing unless polled"]
pub struct OperationFuture<'a, T> {
    op: Arc<dyn Operation>,
    rx: oneshot::Receiver<Result<T>>,
    cancel: Option<Pin<Box<WaitForCancellationFutureOwned>>>,
    started: bool,
    stop_sent: bool,
    done: bool,
    _socket: PhantomData<&'a ()>,
}

impl<'a, T: Send + 'static> OperationFuture<'a, T> {
    pub(crate) fn new(build: impl FnOnce(Completion<T>) -> Arc<dyn Operation>) -> Self {
        let (tx, rx) = oneshot::channel();
        let op = build(Box::new(move |result| {
            let _ = tx.send(result);
        }));
        Self {
            op,
            rx,
            cancel: None,
            started: false,
            stop_sent: false,
            done: false,
            _socket: PhantomData,
        }
    }

    /// Request a stop when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(Box::pin(token.cancelled_owned()));
        self
    }
}

impl<T> Future for OperationFuture<'_, T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        if this.done {
            return Poll::Ready(Err(SocketError::Cancelled));
        }
        if !this.started {
            this.started = true;
            Arc::clone(&this.op).start();
        }
        if !this.stop_sent
            && let Some(cancel) = this.cancel.as_mut()
            && cancel.as_mut().poll(cx).is_ready()
        {
            this.stop_sent = true;
            this.op.request_stop();
        }
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(result) => {
                this.done = true;
                // A dropped completion means the operation was abandoned with
                // its reactor.
                Poll::Ready(result.unwrap_or(Err(SocketError::Cancelled)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for OperationFuture<'_, T> {
    fn drop(&mut self) {
        if self.started && !self.done {
            self.op.request_stop();
        }
    }
}

impl<T> std::fmt::Debug for OperationFuture<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationFuture")
            .field("started", &self.started)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
