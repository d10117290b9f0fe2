//! `rstest` fixtures producing in-process contexts and socket pairs.

use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::fixture;
use zmq_async::{AsyncSocket, Result, SocketType, inproc::Context};

/// A fresh in-process context.
///
/// Built inside the test's runtime when one is active, so readiness
/// callbacks run as runtime tasks.
#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn context() -> Context { Context::new() }

/// An `inproc://` endpoint no other test uses.
#[must_use]
pub fn unique_endpoint(prefix: &str) -> String {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    format!("inproc://{prefix}-{}", NEXT.fetch_add(1, Ordering::Relaxed))
}

/// Bind a `bound` socket and connect a `connecting` socket to it, both
/// created from `ctx`.
///
/// # Errors
///
/// Propagates socket creation or endpoint failures.
pub fn pair(ctx: &Context, bound: SocketType, connecting: SocketType) -> Result<(AsyncSocket, AsyncSocket)> {
    let endpoint = unique_endpoint(&format!("{bound}-{connecting}").to_lowercase());
    let server = ctx.async_socket(bound)?;
    let client = ctx.async_socket(connecting)?;
    server.bind(&endpoint)?;
    client.connect(&endpoint)?;
    Ok((server, client))
}

/// As [`pair`], on a fresh context that is returned alongside the sockets.
///
/// # Errors
///
/// Propagates socket creation or endpoint failures.
pub fn connected_pair(bound: SocketType, connecting: SocketType) -> Result<(Context, AsyncSocket, AsyncSocket)> {
    let ctx = Context::new();
    let (server, client) = pair(&ctx, bound, connecting)?;
    Ok((ctx, server, client))
}
