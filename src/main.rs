//! Demo binary for `zmq_async`.
//!
//! Wires REQ clients to a REP worker through a ROUTER/DEALER proxy, all on
//! the in-process transport, and prints each reply.

mod cli;

use std::future::IntoFuture;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use zmq_async::{
    AsyncSocket,
    RecvFlags,
    SendFlags,
    SocketConfig,
    SocketType,
    inproc::Context,
    proxy::proxy_until,
};

async fn worker(socket: AsyncSocket, shutdown: CancellationToken) -> zmq_async::Result<()> {
    loop {
        let request = socket
            .recv(RecvFlags::empty())
            .into_future()
            .with_cancellation(shutdown.clone())
            .await;
        let request = match request {
            Ok(frame) => frame,
            Err(e) if e.is_cancelled() => return Ok(()),
            Err(e) => return Err(e),
        };
        let reply = format!("echo: {}", String::from_utf8_lossy(request.as_ref()));
        socket.send(reply, SendFlags::empty()).await?;
    }
}

async fn client(ctx: Context, frontend: String, id: usize, requests: usize) -> zmq_async::Result<()> {
    let socket = ctx.async_socket(SocketType::Req)?;
    socket.apply(&SocketConfig::default().linger(0))?;
    socket.connect(&frontend)?;
    for n in 0..requests {
        socket
            .send(format!("client {id} request {n}"), SendFlags::empty())
            .await?;
        let reply = socket.recv(RecvFlags::empty()).await?;
        println!("{}", String::from_utf8_lossy(reply.as_ref()));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let ctx = Context::new();

    let frontend = ctx.async_socket(SocketType::Router)?;
    let backend = ctx.async_socket(SocketType::Dealer)?;
    frontend.bind(&cli.frontend)?;
    backend.bind(&cli.backend)?;

    let shutdown = CancellationToken::new();
    let rep = ctx.async_socket(SocketType::Rep)?;
    rep.connect(&cli.backend)?;
    let worker_task = tokio::spawn(worker(rep, shutdown.clone()));

    let clients: Vec<_> = (0..cli.clients)
        .map(|id| tokio::spawn(client(ctx.clone(), cli.frontend.clone(), id, cli.requests)))
        .collect();

    let proxy_shutdown = shutdown.clone();
    let run_clients = async move {
        let mut result: zmq_async::Result<()> = Ok(());
        for handle in clients {
            let outcome = handle.await?;
            if result.is_ok() {
                result = outcome;
            }
        }
        proxy_shutdown.cancel();
        Ok::<_, tokio::task::JoinError>(result)
    };

    let (proxied, served) = tokio::join!(proxy_until(&frontend, &backend, shutdown.clone()), run_clients);
    proxied?;
    served??;
    worker_task.await??;
    info!(clients = cli.clients, requests = cli.requests, "demo finished");
    Ok(())
}
