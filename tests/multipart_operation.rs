#![cfg(not(loom))]
//! Multipart driver behaviour against a scripted transport: framing,
//! exclusivity, partial failure and deferred cancellation.

use std::io;

use zmq_async::{
    Direction,
    Events,
    Frame,
    Multipart,
    RecvFlags,
    SendFlags,
    SocketError,
    SocketType,
    operation::Sender,
};
use zmq_async_testing::{
    Outcome,
    RecordingReceiver,
    RecvStep,
    SendStep,
    TestResult,
    scripted_socket,
};

fn texts(msg: &Multipart) -> Vec<&str> { msg.iter().filter_map(Frame::to_str).collect() }

#[test]
fn every_frame_but_the_last_carries_sndmore() -> TestResult {
    let (socket, raw, _reactor) = scripted_socket(SocketType::Dealer)?;
    let (receiver, recorded) = RecordingReceiver::new();

    // Caller-supplied SNDMORE is ignored.
    socket
        .send_multipart(["Hi", "There"], SendFlags::SNDMORE)
        .connect(receiver)
        .start();

    assert!(matches!(recorded.take(), Some(Outcome::Value(()))));
    assert_eq!(
        raw.sent(),
        vec![
            (Frame::new("Hi"), SendFlags::SNDMORE | SendFlags::DONTWAIT),
            (Frame::new("There"), SendFlags::DONTWAIT),
        ]
    );
    assert!(!socket.is_busy(Direction::Send));
    Ok(())
}

#[test]
fn empty_message_is_a_no_op() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Dealer)?;
    raw.set_events(Events::empty());
    let (receiver, recorded) = RecordingReceiver::new();

    socket
        .send_multipart(Multipart::new(), SendFlags::empty())
        .connect(receiver)
        .start();

    assert!(matches!(recorded.take(), Some(Outcome::Value(()))));
    assert_eq!(raw.send_calls(), 0);
    assert_eq!(reactor.watch_calls(), 0);
    Ok(())
}

#[test]
fn second_send_multipart_is_rejected_while_busy() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Dealer)?;
    raw.set_events(Events::empty());

    let (first, first_recorded) = RecordingReceiver::new();
    socket
        .send_multipart(["a", "b"], SendFlags::empty())
        .connect(first)
        .start();
    assert!(socket.is_busy(Direction::Send));

    let (second, second_recorded) = RecordingReceiver::new();
    socket
        .send_multipart(["c"], SendFlags::empty())
        .connect(second)
        .start();
    assert!(matches!(
        second_recorded.take(),
        Some(Outcome::Error(SocketError::SocketBusy(Direction::Send)))
    ));

    // The receive direction is independent.
    let (recv, recv_recorded) = RecordingReceiver::new();
    socket
        .recv_multipart(RecvFlags::empty())
        .connect(recv)
        .start();
    assert!(!recv_recorded.is_complete());
    assert!(socket.is_busy(Direction::Recv));

    raw.set_events(Events::POLLOUT);
    reactor.fire();
    assert!(matches!(first_recorded.take(), Some(Outcome::Value(()))));
    assert!(!socket.is_busy(Direction::Send));
    assert_eq!(raw.sent().len(), 2);
    Ok(())
}

#[test]
fn stop_before_the_first_frame_is_prompt() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Dealer)?;
    raw.set_events(Events::empty());
    let (receiver, recorded) = RecordingReceiver::new();

    let op = socket
        .send_multipart(["a", "b", "c"], SendFlags::empty())
        .connect(receiver);
    op.start();
    op.request_stop();

    assert!(matches!(recorded.take(), Some(Outcome::Stopped)));
    assert!(raw.sent().is_empty());
    assert_eq!(reactor.pending(), 0);
    assert!(!socket.is_busy(Direction::Send));
    Ok(())
}

#[test]
fn stop_after_the_first_frame_finishes_the_message() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Dealer)?;
    raw.script_sends([SendStep::Accept, SendStep::WouldBlock]);
    let (receiver, recorded) = RecordingReceiver::new();

    let op = socket
        .send_multipart(["1", "2", "3", "4", "5"], SendFlags::empty())
        .connect(receiver);
    op.start();
    assert_eq!(raw.sent().len(), 1);

    op.request_stop();
    assert!(!recorded.is_complete());
    assert!(socket.is_busy(Direction::Send));

    reactor.fire();
    assert!(matches!(recorded.take(), Some(Outcome::Stopped)));
    let sent: Vec<_> = raw.sent().into_iter().map(|(frame, _)| frame).collect();
    assert_eq!(sent.len(), 5);
    assert_eq!(sent[4], Frame::new("5"));
    assert!(!socket.is_busy(Direction::Send));
    Ok(())
}

#[test]
fn stopped_receive_drains_the_rest_of_the_message() -> TestResult {
    let (socket, raw, reactor) = scripted_socket(SocketType::Dealer)?;
    raw.script_recvs([RecvStep::Frame(Frame::with_more("a", true))]);
    let (receiver, recorded) = RecordingReceiver::new();

    let op = socket.recv_multipart(RecvFlags::empty()).connect(receiver);
    op.start();
    op.request_stop();
    assert!(!recorded.is_complete());

    raw.script_recvs([
        RecvStep::Frame(Frame::with_more("b", true)),
        RecvStep::Frame(Frame::new("c")),
    ]);
    raw.queue_message(["next"]);
    reactor.fire();
    assert!(matches!(recorded.take(), Some(Outcome::Stopped)));

    let (receiver, recorded) = RecordingReceiver::new();
    socket
        .recv_multipart(RecvFlags::empty())
        .connect(receiver)
        .start();
    match recorded.take() {
        Some(Outcome::Value(msg)) => assert_eq!(texts(&msg), ["next"]),
        other => panic!("expected the next message intact, got {other:?}"),
    }
    Ok(())
}

#[test]
fn failure_mid_message_reports_the_error_and_releases_the_flag() -> TestResult {
    let (socket, raw, _reactor) = scripted_socket(SocketType::Dealer)?;
    raw.script_sends([
        SendStep::Accept,
        SendStep::Fail(io::ErrorKind::ConnectionReset),
    ]);
    let (receiver, recorded) = RecordingReceiver::new();

    socket
        .send_multipart(["a", "b", "c"], SendFlags::empty())
        .connect(receiver)
        .start();

    match recorded.take() {
        Some(Outcome::Error(SocketError::Send(e))) => {
            assert_eq!(e.kind(), io::ErrorKind::ConnectionReset);
        }
        other => panic!("expected a send error, got {other:?}"),
    }
    // The transmitted prefix cannot be recalled.
    assert_eq!(raw.sent().len(), 1);
    assert!(!socket.is_busy(Direction::Send));

    let (receiver, recorded) = RecordingReceiver::new();
    socket
        .send_multipart(["d"], SendFlags::empty())
        .connect(receiver)
        .start();
    assert!(matches!(recorded.take(), Some(Outcome::Value(()))));
    Ok(())
}

#[test]
fn receive_failure_mid_message_releases_the_flag() -> TestResult {
    let (socket, raw, _reactor) = scripted_socket(SocketType::Dealer)?;
    raw.script_recvs([
        RecvStep::Frame(Frame::with_more("a", true)),
        RecvStep::Fail(io::ErrorKind::UnexpectedEof),
    ]);
    let (receiver, recorded) = RecordingReceiver::new();

    socket
        .recv_multipart(RecvFlags::empty())
        .connect(receiver)
        .start();

    assert!(matches!(
        recorded.take(),
        Some(Outcome::Error(SocketError::Recv(_)))
    ));
    assert!(!socket.is_busy(Direction::Recv));
    Ok(())
}

#[test]
fn closed_socket_fails_without_taking_the_flag() -> TestResult {
    let (socket, _raw, _reactor) = scripted_socket(SocketType::Dealer)?;
    socket.close();
    let (receiver, recorded) = RecordingReceiver::new();

    socket
        .recv_multipart(RecvFlags::empty())
        .connect(receiver)
        .start();

    assert!(matches!(
        recorded.take(),
        Some(Outcome::Error(SocketError::NullSocket))
    ));
    assert!(!socket.is_busy(Direction::Recv));
    Ok(())
}

#[test]
fn long_synchronous_messages_do_not_recurse() -> TestResult {
    let (socket, raw, _reactor) = scripted_socket(SocketType::Dealer)?;
    let parts = 50_000;
    let (receiver, recorded) = RecordingReceiver::new();

    socket
        .send_multipart(
            (0..parts).map(|i| Frame::new(i.to_string())).collect::<Multipart>(),
            SendFlags::empty(),
        )
        .connect(receiver)
        .start();

    assert!(matches!(recorded.take(), Some(Outcome::Value(()))));
    assert_eq!(raw.sent().len(), parts);
    Ok(())
}
