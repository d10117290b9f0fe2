#![cfg(feature = "advanced-tests")]
//! Property-based checks of multipart transfer over in-process pipes.
//!
//! Random messages are sent through connected socket pairs and must arrive
//! complete and in order, whatever their shape.

use proptest::prelude::*;
use rstest::rstest;
use zmq_async::{Multipart, RecvFlags, SendFlags, SocketType};
use zmq_async_testing::connected_pair;

async fn transfer(messages: &[Vec<Vec<u8>>]) -> Vec<Multipart> {
    let (_ctx, server, client) =
        connected_pair(SocketType::Pull, SocketType::Push).expect("failed to connect pair");
    let mut received = Vec::new();
    for parts in messages {
        let msg: Multipart = parts.iter().cloned().map(Into::into).collect();
        client
            .send_multipart(msg, SendFlags::empty())
            .await
            .expect("send failed");
        if !parts.is_empty() {
            received.push(
                server
                    .recv_multipart(RecvFlags::empty())
                    .await
                    .expect("recv failed"),
            );
        }
    }
    received
}

fn expected_from(messages: &[Vec<Vec<u8>>]) -> Vec<Multipart> {
    messages
        .iter()
        .filter(|parts| !parts.is_empty())
        .map(|parts| parts.iter().cloned().map(Into::into).collect())
        .collect()
}

prop_compose! {
    fn messages_strategy()
        (
            messages in proptest::collection::vec(
                proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..16), 0..6),
                0..8,
            )
        ) -> Vec<Vec<Vec<u8>>> {
            messages
        }
}

proptest! {
    #[test]
    fn random_messages_arrive_intact(messages in messages_strategy()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build tokio runtime");

        rt.block_on(async {
            let out = transfer(&messages).await;
            let expected = expected_from(&messages);
            prop_assert_eq!(out, expected);
            Ok(())
        })?;
    }

    #[test]
    fn encoding_is_lossless(messages in messages_strategy()) {
        for parts in messages {
            let msg: Multipart = parts.into_iter().map(Into::into).collect();
            let decoded = Multipart::decode(msg.encode().expect("encode failed"))
                .expect("decode failed");
            prop_assert_eq!(decoded, msg);
        }
    }
}

#[rstest]
#[case::empty(Vec::new())]
#[case::empty_frames(vec![vec![Vec::new(), Vec::new()]])]
#[case::maximal((0u8..8).map(|n| vec![vec![n; 15]; 5]).collect())]
fn transfer_edge_cases(#[case] messages: Vec<Vec<Vec<u8>>>) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    let out = rt.block_on(transfer(&messages));
    assert_eq!(out, expected_from(&messages));
}
