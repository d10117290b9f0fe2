//! Integration coverage for the shared socket fixtures.

use zmq_async::{RecvFlags, SendFlags, SocketType, metrics::Direction};
use zmq_async_testing::{
    CounterProbe,
    TestResult,
    assert_parts,
    connected_pair,
    recv_expect,
    send_expect,
    unique_endpoint,
};

#[test]
fn unique_endpoints_do_not_repeat() {
    let a = unique_endpoint("x");
    let b = unique_endpoint("x");
    assert_ne!(a, b);
    assert!(a.starts_with("inproc://x-"));
}

#[tokio::test]
async fn connected_pair_carries_messages() -> TestResult {
    let (_ctx, pull, push) = connected_pair(SocketType::Pull, SocketType::Push)?;
    send_expect!(push.send_multipart(["a", "b"], SendFlags::empty()));
    let msg = recv_expect!(pull.recv_multipart(RecvFlags::empty()));
    assert_parts!(msg, ["a", "b"]);
    Ok(())
}

#[test]
fn untouched_counters_read_zero() {
    let probe = CounterProbe::new();
    assert_eq!(probe.counter(zmq_async::metrics::FRAMES_TRANSFERRED, Direction::Send), 0);
}
