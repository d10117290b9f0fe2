//! Tasks wired to their creator through a linked `PAIR`.
//!
//! An [`Actor`] runs a future on the current Tokio runtime. The future
//! receives one end of a freshly linked socket pair; the caller keeps the
//! other end as the actor's [`link`](Actor::link). No startup or shutdown
//! handshake is imposed on the link.

use std::{future::Future, io, sync::Arc};

use tokio::{
    runtime::Handle,
    task::{JoinError, JoinHandle},
};
use tracing::debug;

use super::Context;
use crate::{
    error::{Result, SocketError},
    reactor::Reactor,
    socket::AsyncSocket,
};

/// A spawned task and the caller's end of its link.
pub struct Actor<T> {
    link: AsyncSocket,
    task: JoinHandle<T>,
}

impl<T> Actor<T> {
    /// The caller's end of the link.
    #[must_use]
    pub fn link(&self) -> &AsyncSocket { &self.link }

    /// Returns `true` once the actor's future has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool { self.task.is_finished() }

    /// Wait for the actor's future to complete, closing the link first.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the actor panicked or was aborted.
    pub async fn join(self) -> std::result::Result<T, JoinError> {
        drop(self.link);
        self.task.await
    }

    /// Abort the actor and close the link.
    pub fn abort(self) { self.task.abort(); }
}

impl Context {
    /// Spawn `f` on the current Tokio runtime with one end of a linked
    /// `PAIR`, returning the other end together with the task.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Io`] when called outside a Tokio runtime, or
    /// propagates failures linking the pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use zmq_async::{RecvFlags, SendFlags, inproc::Context};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> zmq_async::Result<()> {
    /// let ctx = Context::new();
    /// let actor = ctx.actor(|pipe| async move {
    ///     let frame = pipe.recv(RecvFlags::empty()).await?;
    ///     pipe.send(frame.data().clone(), SendFlags::empty()).await
    /// })?;
    /// actor.link().send("echo", SendFlags::empty()).await?;
    /// let reply = actor.link().recv(RecvFlags::empty()).await?;
    /// assert_eq!(reply.as_ref(), b"echo");
    /// # Ok(())
    /// # }
    /// ```
    pub fn actor<F, Fut>(&self, f: F) -> Result<Actor<Fut::Output>>
    where
        F: FnOnce(AsyncSocket) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|e| SocketError::Io(io::Error::other(e)))?;
        let (near, far) = self.linked_pair().map_err(SocketError::Config)?;
        let reactor = self.reactor() as Arc<dyn Reactor>;
        let link = AsyncSocket::new(near, Arc::clone(&reactor))?;
        let pipe = AsyncSocket::new(far, reactor)?;
        let task = runtime.spawn(f(pipe));
        debug!("actor spawned");
        Ok(Actor { link, task })
    }
}

impl<T> std::fmt::Debug for Actor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("link", &self.link)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
