#![cfg(not(loom))]
//! Compile-time specialised socket facades.

use std::sync::Arc;

use rstest::rstest;
use zmq_async::{
    RecvFlags,
    SendFlags,
    SocketError,
    SocketType,
    TypedSocket,
    inproc::Context,
    reactor::Reactor,
    socket_type::role,
};
use zmq_async_testing::{ManualReactor, ScriptedSocket, TestResult, context, unique_endpoint};

#[rstest]
#[tokio::test]
async fn typed_pair_exchanges_multipart_messages(context: Context) -> TestResult {
    let endpoint = unique_endpoint("typed");
    let server: TypedSocket<role::Pair> = context.typed_socket()?;
    let client = context.typed_socket::<role::Pair>()?;
    server.bind(&endpoint)?;
    client.connect(&endpoint)?;

    client.send_multipart(["a", "b"], SendFlags::empty()).await?;
    let msg = server.recv_multipart(RecvFlags::empty()).await?;
    assert_eq!(msg.len(), 2);
    assert_eq!(server.as_dyn().socket_type(), SocketType::Pair);
    Ok(())
}

#[test]
fn typed_facade_rejects_mismatched_transport() {
    let reactor: Arc<dyn Reactor> = ManualReactor::new();
    let raw = ScriptedSocket::new(SocketType::Push);
    let result = TypedSocket::<role::Pull>::new(raw, reactor);
    assert!(matches!(result, Err(SocketError::Config(_))));
}

#[rstest]
#[case(SocketType::Server)]
#[case(SocketType::Client)]
#[case(SocketType::Radio)]
#[case(SocketType::Dish)]
fn draft_types_are_rejected_at_runtime(#[case] kind: SocketType) {
    let reactor: Arc<dyn Reactor> = ManualReactor::new();
    let result = zmq_async::AsyncSocket::new(ScriptedSocket::new(kind), reactor);
    assert!(matches!(result, Err(SocketError::Unsupported(k)) if k == kind));
}

#[test]
fn missing_descriptor_is_an_io_error() {
    let reactor: Arc<dyn Reactor> = ManualReactor::new();
    let raw = ScriptedSocket::without_descriptor(SocketType::Pair);
    let result = zmq_async::AsyncSocket::new(raw, reactor);
    assert!(matches!(result, Err(SocketError::Io(_))));
}

#[test]
fn into_dyn_keeps_the_socket() -> TestResult {
    let reactor: Arc<dyn Reactor> = ManualReactor::new();
    let typed = TypedSocket::<role::Dealer>::new(ScriptedSocket::new(SocketType::Dealer), reactor)?;
    let socket = typed.into_dyn();
    assert_eq!(socket.socket_type(), SocketType::Dealer);
    Ok(())
}
