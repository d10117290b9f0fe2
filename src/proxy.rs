//! Bidirectional message forwarding between two sockets.
//!
//! The proxy runs two loops, front→back and back→front, each receiving a
//! whole multipart message and sending it on. Whichever loop finishes first
//! decides the result; the other loop's pending operations are dropped,
//! which stops them (a multipart send already on the wire still completes).

use futures::future::{self, Either};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::Result,
    flags::{RecvFlags, SendFlags},
    socket::AsyncSocket,
};

async fn forward(from: &AsyncSocket, to: &AsyncSocket) -> Result<()> {
    loop {
        let message = from.recv_multipart(RecvFlags::empty()).await?;
        to.send_multipart(message, SendFlags::empty()).await?;
    }
}

/// Forward messages between `front` and `back` until either direction
/// fails.
///
/// # Errors
///
/// Returns the first error raised by either forwarding loop.
///
/// # Examples
///
/// ```no_run
/// use zmq_async::{SocketType, inproc::Context, proxy::proxy};
///
/// # async fn demo() -> zmq_async::Result<()> {
/// let ctx = Context::new();
/// let front = ctx.async_socket(SocketType::Router)?;
/// let back = ctx.async_socket(SocketType::Dealer)?;
/// front.bind("inproc://front")?;
/// back.bind("inproc://back")?;
/// proxy(&front, &back).await
/// # }
/// ```
pub async fn proxy(front: &AsyncSocket, back: &AsyncSocket) -> Result<()> {
    let upstream = std::pin::pin!(forward(front, back));
    let downstream = std::pin::pin!(forward(back, front));
    match future::select(upstream, downstream).await {
        Either::Left((result, _)) => {
            debug!("proxy front-to-back loop finished first");
            result
        }
        Either::Right((result, _)) => {
            debug!("proxy back-to-front loop finished first");
            result
        }
    }
}

/// As [`proxy`], but also returns `Ok(())` once `shutdown` is cancelled.
///
/// # Errors
///
/// Returns the first error raised by either forwarding loop.
pub async fn proxy_until(
    front: &AsyncSocket,
    back: &AsyncSocket,
    shutdown: CancellationToken,
) -> Result<()> {
    let run = std::pin::pin!(proxy(front, back));
    let stop = std::pin::pin!(shutdown.cancelled());
    match future::select(run, stop).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => {
            debug!("proxy shut down");
            Ok(())
        }
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    use super::proxy_until;
    use crate::{inproc::Context, socket_type::SocketType};

    /// A cancelled shutdown token ends the proxy cleanly and says so.
    #[traced_test]
    #[tokio::test]
    async fn shutdown_is_logged() {
        let ctx = Context::new();
        let front = ctx.async_socket(SocketType::Router).expect("router");
        let back = ctx.async_socket(SocketType::Dealer).expect("dealer");
        front.bind("inproc://proxy-shutdown-front").expect("bind front");
        back.bind("inproc://proxy-shutdown-back").expect("bind back");

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        proxy_until(&front, &back, shutdown)
            .await
            .expect("proxy should stop cleanly");

        assert!(logs_contain("proxy shut down"));
    }
}
