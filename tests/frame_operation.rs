#![cfg(not(loom))]
//! Single-frame operation behaviour against a scripted transport.
//!
//! The `ManualReactor` parks every readiness wait until the test fires
//! it, so each transition of the state machine is observed directly.

use std::{io, sync::Arc, thread};

use rstest::rstest;
use tokio_util::sync::CancellationToken;
use zmq_async::{
    Events,
    Frame,
    RecvFlags,
    SendFlags,
    SocketError,
    SocketType,
    operation::Sender,
    reactor::Interest,
    transport::RawSocket,
};
use zmq_async_testing::{
    Outcome,
    RecordingReceiver,
    RecvStep,
    SendStep,
    TestResult,
    scripted_socket,
};

#[test]
fn ready_send_completes_without_touching_the_reactor() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Push)?;
    let (receiver, recorded) = RecordingReceiver::new();

    socket.send("ping", SendFlags::empty()).connect(receiver).start();

    assert!(matches!(recorded.take(), Some(Outcome::Value(()))));
    assert_eq!(reactor.watch_calls(), 0);
    assert_eq!(raw.sent(), vec![(Frame::new("ping"), SendFlags::DONTWAIT)]);
    Ok(())
}

#[test]
fn recv_waits_for_readiness() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
    raw.set_events(Events::empty());
    let (receiver, recorded) = RecordingReceiver::new();

    let op = socket.recv(RecvFlags::empty()).connect(receiver);
    op.start();
    assert_eq!(reactor.pending_interests(), vec![Interest::Readable]);
    assert_eq!(raw.recv_calls(), 0);
    assert!(!recorded.is_complete());

    raw.queue_message(["ping"]);
    raw.set_events(Events::POLLIN);
    assert_eq!(reactor.fire(), 1);

    match recorded.take() {
        Some(Outcome::Value(frame)) => assert_eq!(frame.as_ref(), b"ping"),
        other => panic!("expected a frame, got {other:?}"),
    }
    assert_eq!(raw.recv_flags(), vec![RecvFlags::DONTWAIT]);
    Ok(())
}

#[test]
fn would_block_after_readiness_waits_again() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Push)?;
    raw.script_sends([SendStep::WouldBlock, SendStep::WouldBlock]);
    let (receiver, recorded) = RecordingReceiver::new();

    socket.send("x", SendFlags::empty()).connect(receiver).start();
    assert_eq!(raw.send_calls(), 1);
    assert_eq!(reactor.pending_interests(), vec![Interest::Writable]);

    // Spurious readiness: the transport still refuses the frame.
    assert_eq!(reactor.fire(), 1);
    assert_eq!(raw.send_calls(), 2);
    assert_eq!(reactor.pending(), 1);
    assert!(!recorded.is_complete());

    assert_eq!(reactor.fire(), 1);
    assert!(matches!(recorded.take(), Some(Outcome::Value(()))));
    assert_eq!(raw.send_calls(), 3);
    assert_eq!(raw.sent().len(), 1);
    Ok(())
}

#[test]
fn readiness_without_events_makes_no_transport_call() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
    raw.set_events(Events::POLLOUT);
    let (receiver, recorded) = RecordingReceiver::new();

    socket.recv(RecvFlags::empty()).connect(receiver).start();
    assert_eq!(reactor.fire(), 1);
    assert_eq!(raw.recv_calls(), 0);
    assert_eq!(reactor.pending(), 1);
    assert!(!recorded.is_complete());
    Ok(())
}

#[rstest]
#[case(io::ErrorKind::ConnectionReset)]
#[case(io::ErrorKind::BrokenPipe)]
fn send_failures_surface_as_send_errors(#[case] kind: io::ErrorKind) -> TestResult {
    let (socket, raw, _reactor) = scripted_socket(SocketType::Push)?;
    raw.script_sends([SendStep::Fail(kind)]);
    let (receiver, recorded) = RecordingReceiver::new();

    socket.send("x", SendFlags::empty()).connect(receiver).start();

    match recorded.take() {
        Some(Outcome::Error(SocketError::Send(e))) => assert_eq!(e.kind(), kind),
        other => panic!("expected a send error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn recv_failures_surface_as_recv_errors() -> TestResult {
    let (socket, raw, _reactor) = scripted_socket(SocketType::Pull)?;
    raw.script_recvs([RecvStep::Fail(io::ErrorKind::ConnectionAborted)]);
    let (receiver, recorded) = RecordingReceiver::new();

    socket.recv(RecvFlags::empty()).connect(receiver).start();

    assert!(matches!(
        recorded.take(),
        Some(Outcome::Error(SocketError::Recv(_)))
    ));
    Ok(())
}

#[test]
fn failed_operation_leaves_socket_usable() -> TestResult {
    let (socket, raw, _reactor) = scripted_socket(SocketType::Push)?;
    raw.script_sends([SendStep::Fail(io::ErrorKind::Other)]);

    let (receiver, recorded) = RecordingReceiver::new();
    socket.send("a", SendFlags::empty()).connect(receiver).start();
    assert!(matches!(recorded.take(), Some(Outcome::Error(_))));

    let (receiver, recorded) = RecordingReceiver::new();
    socket.send("b", SendFlags::empty()).connect(receiver).start();
    assert!(matches!(recorded.take(), Some(Outcome::Value(()))));
    Ok(())
}

#[test]
fn closed_socket_fails_before_any_transport_call() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pair)?;
    socket.close();
    let (receiver, recorded) = RecordingReceiver::new();

    socket.send("x", SendFlags::empty()).connect(receiver).start();

    assert!(matches!(
        recorded.take(),
        Some(Outcome::Error(SocketError::NullSocket))
    ));
    assert_eq!(raw.send_calls(), 0);
    assert_eq!(reactor.watch_calls(), 0);
    Ok(())
}

#[test]
fn socket_closed_while_waiting_reports_null_socket() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
    raw.set_events(Events::empty());
    let (receiver, recorded) = RecordingReceiver::new();

    socket.recv(RecvFlags::empty()).connect(receiver).start();
    socket.close();
    reactor.fire();

    assert!(matches!(
        recorded.take(),
        Some(Outcome::Error(SocketError::NullSocket))
    ));
    assert_eq!(raw.recv_calls(), 0);
    Ok(())
}

#[test]
fn rejected_watch_reports_io_error() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
    raw.set_events(Events::empty());
    reactor.reject_watches(true);
    let (receiver, recorded) = RecordingReceiver::new();

    socket.recv(RecvFlags::empty()).connect(receiver).start();

    assert!(matches!(
        recorded.take(),
        Some(Outcome::Error(SocketError::Io(_)))
    ));
    Ok(())
}

#[test]
fn reactor_error_status_reports_io_error() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
    raw.set_events(Events::empty());
    let (receiver, recorded) = RecordingReceiver::new();

    socket.recv(RecvFlags::empty()).connect(receiver).start();
    reactor.fire_with(|| Err(io::Error::other("poller failed")));

    match recorded.take() {
        Some(Outcome::Error(SocketError::Io(e))) => assert_eq!(e.to_string(), "poller failed"),
        other => panic!("expected an io error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn interrupted_status_is_no_progress() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
    raw.set_events(Events::empty());
    let (receiver, recorded) = RecordingReceiver::new();

    let op = socket.recv(RecvFlags::empty()).connect(receiver);
    op.start();
    reactor.fire_with(|| Err(io::Error::from(io::ErrorKind::Interrupted)));
    assert!(!recorded.is_complete());

    op.request_stop();
    assert!(matches!(recorded.take(), Some(Outcome::Stopped)));
    Ok(())
}

#[test]
fn stop_before_readiness_cancels_the_watch() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
    raw.set_events(Events::empty());
    let (receiver, recorded) = RecordingReceiver::new();

    let op = socket.recv(RecvFlags::empty()).connect(receiver);
    op.start();
    op.request_stop();

    assert!(matches!(recorded.take(), Some(Outcome::Stopped)));
    assert_eq!(reactor.cancellations(), 1);
    assert_eq!(reactor.pending(), 0);
    assert_eq!(raw.recv_calls(), 0);
    Ok(())
}

#[test]
fn stop_after_completion_is_ignored() -> TestResult {
    let (socket, _raw, _reactor) = scripted_socket(SocketType::Push)?;
    let (receiver, recorded) = RecordingReceiver::new();

    let op = socket.send("x", SendFlags::empty()).connect(receiver);
    op.start();
    op.request_stop();

    assert_eq!(recorded.deliveries(), 1);
    assert!(matches!(recorded.take(), Some(Outcome::Value(()))));
    Ok(())
}

#[test]
fn starting_twice_runs_once() -> TestResult {
    let (socket, raw, _reactor) = scripted_socket(SocketType::Push)?;
    let (receiver, recorded) = RecordingReceiver::new();

    let op = socket.send("x", SendFlags::empty()).connect(receiver);
    op.start();
    op.start();

    assert_eq!(raw.send_calls(), 1);
    assert_eq!(recorded.deliveries(), 1);
    Ok(())
}

#[rstest]
#[case::ready(Events::all(), true)]
#[case::not_ready(Events::empty(), false)]
fn cancelled_token_at_start(#[case] events: Events, #[case] delivered: bool) -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Push)?;
    raw.set_events(events);
    let token = CancellationToken::new();
    token.cancel();
    let (receiver, recorded) = RecordingReceiver::with_stop_token(token);

    socket.send("x", SendFlags::empty()).connect(receiver).start();

    match recorded.take() {
        Some(Outcome::Value(())) => assert!(delivered),
        Some(Outcome::Stopped) => {
            assert!(!delivered);
            assert_eq!(reactor.pending(), 0);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    Ok(())
}

#[test]
fn readiness_and_stop_race_completes_exactly_once() -> TestResult {
    for _ in 0..200 {
        let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
        raw.set_events(Events::empty());
        let (receiver, recorded) = RecordingReceiver::new();

        let op = Arc::new(socket.recv(RecvFlags::empty()).connect(receiver));
        op.start();
        raw.queue_message(["x"]);
        raw.set_events(Events::POLLIN);

        let callback = reactor.take_watches().pop().ok_or("no readiness wait parked")?;
        let stopper = {
            let op = Arc::clone(&op);
            thread::spawn(move || op.request_stop())
        };
        let waker = thread::spawn(move || callback(Ok(())));
        stopper.join().expect("stop thread panicked");
        waker.join().expect("readiness thread panicked");

        assert_eq!(recorded.deliveries(), 1);
        match recorded.take() {
            Some(Outcome::Value(frame)) => {
                assert_eq!(frame.as_ref(), b"x");
                assert_eq!(raw.recv_calls(), 1);
            }
            Some(Outcome::Stopped) => assert_eq!(raw.recv_calls(), 0),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn stop_cancels_the_wait_parked_by_an_inline_callback() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
    raw.set_events(Events::empty());
    reactor.resolve_inline(1);
    let (receiver, recorded) = RecordingReceiver::new();

    let op = socket.recv(RecvFlags::empty()).connect(receiver);
    op.start();
    // The first wait resolved inside `watch`; the retry parked a second one.
    assert_eq!(reactor.watch_calls(), 2);
    assert_eq!(reactor.pending(), 1);

    op.request_stop();
    assert!(matches!(recorded.take(), Some(Outcome::Stopped)));
    assert_eq!(reactor.cancellations(), 1);
    assert_eq!(reactor.pending(), 0);
    Ok(())
}

#[test]
fn stop_racing_a_would_block_retry_is_never_lost() -> TestResult {
    for _ in 0..200 {
        let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
        raw.set_events(Events::empty());
        let (receiver, recorded) = RecordingReceiver::new();

        let op = Arc::new(socket.recv(RecvFlags::empty()).connect(receiver));
        op.start();
        // Readiness is reported but the transport still has nothing.
        raw.set_events(Events::POLLIN);
        raw.script_recvs([RecvStep::WouldBlock]);

        let callback = reactor.take_watches().pop().ok_or("no readiness wait parked")?;
        let stopper = {
            let op = Arc::clone(&op);
            thread::spawn(move || op.request_stop())
        };
        let waker = thread::spawn(move || callback(Ok(())));
        stopper.join().expect("stop thread panicked");
        waker.join().expect("readiness thread panicked");

        assert!(matches!(recorded.take(), Some(Outcome::Stopped)));
        assert_eq!(reactor.pending(), 0, "a retry wait outlived the stop");
    }
    Ok(())
}

#[test]
fn multipart_in_progress_disables_foreign_fast_path() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pull)?;
    raw.script_recvs([RecvStep::Frame(Frame::with_more("a", true))]);

    let (mp_receiver, mp_recorded) = RecordingReceiver::new();
    socket
        .recv_multipart(RecvFlags::empty())
        .connect(mp_receiver)
        .start();
    assert_eq!(raw.recv_calls(), 2);
    assert!(socket.is_busy(zmq_async::Direction::Recv));

    let (receiver, recorded) = RecordingReceiver::new();
    socket.recv(RecvFlags::empty()).connect(receiver).start();
    // Readiness is reported, yet the foreign receive must not read.
    assert_eq!(raw.recv_calls(), 2);
    assert_eq!(reactor.pending(), 2);

    raw.script_recvs([RecvStep::Frame(Frame::new("b"))]);
    reactor.fire();

    match mp_recorded.take() {
        Some(Outcome::Value(msg)) => {
            let parts: Vec<_> = msg.iter().filter_map(Frame::to_str).collect();
            assert_eq!(parts, ["a", "b"]);
        }
        other => panic!("expected the whole message, got {other:?}"),
    }
    assert!(!recorded.is_complete());
    assert!(!socket.is_busy(zmq_async::Direction::Recv));
    Ok(())
}

#[test]
fn dropping_the_socket_deregisters_without_closing() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Pair)?;
    let descriptor = raw.descriptor()?;
    assert!(reactor.is_registered(descriptor));

    drop(socket);
    assert!(!reactor.is_registered(descriptor));
    assert!(!raw.is_closed());
    Ok(())
}
