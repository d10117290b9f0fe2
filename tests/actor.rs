#![cfg(not(loom))]
//! Actors spawned on a linked `PAIR`.

use std::time::Duration;

use rstest::rstest;
use zmq_async::{RecvFlags, SendFlags, SocketError, SocketType, inproc::Context};
use zmq_async_testing::{TestResult, assert_parts, context};

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn actor_talks_over_its_link(context: Context) -> TestResult {
    let actor = context.actor(|pipe| async move {
        let mut served = 0_usize;
        loop {
            let mut msg = pipe.recv_multipart(RecvFlags::empty()).await?;
            if msg.pop_str().as_deref() == Some("$TERM") {
                return Ok::<_, SocketError>(served);
            }
            msg.push_str("ack");
            pipe.send_multipart(msg, SendFlags::empty()).await?;
            served += 1;
        }
    })?;
    assert_eq!(actor.link().socket_type(), SocketType::Pair);

    for job in ["a", "b"] {
        actor.link().send_multipart(["job", job], SendFlags::empty()).await?;
        let reply = actor.link().recv_multipart(RecvFlags::empty()).await?;
        assert_parts!(reply, ["ack", job]);
    }
    actor.link().send_multipart(["$TERM"], SendFlags::empty()).await?;

    let served = tokio::time::timeout(Duration::from_secs(5), actor.join()).await???;
    assert_eq!(served, 2);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn pending_actor_can_be_aborted(context: Context) -> TestResult {
    let actor = context.actor(|pipe| async move { pipe.recv(RecvFlags::empty()).await })?;
    let task_state = format!("{actor:?}");
    assert!(task_state.contains("finished: false"));
    actor.abort();
    Ok(())
}

#[test]
fn actor_needs_a_runtime() {
    let ctx = Context::new();
    let result = ctx.actor(|_pipe| async {});
    assert!(matches!(result, Err(SocketError::Io(_))));
}
