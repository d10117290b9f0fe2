#![cfg(all(feature = "advanced-tests", loom))]
//! Model-checked races on the one-shot completion flag.
//!
//! Readiness callbacks, stop requests and direct attempts all race to claim
//! an operation's completion. `loom` explores every interleaving to confirm
//! exactly one party completes the operation, and that a stop request is
//! never lost while a would-block retry hands the completion back.

use loom::{
    model,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};
use zmq_async::sync::{CompletionGate, OneShot};

#[test]
fn exactly_one_claimant_wins() {
    model(|| {
        let flag = Arc::new(OneShot::new());
        let completions = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let flag = Arc::clone(&flag);
                let completions = Arc::clone(&completions);
                thread::spawn(move || {
                    if flag.claim() {
                        completions.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("claimant panicked");
        }

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(flag.is_claimed());
    });
}

#[test]
fn stop_racing_a_retry_handoff_is_honoured() {
    model(|| {
        let gate = Arc::new(CompletionGate::new());
        let cancelled = Arc::new(AtomicUsize::new(0));
        let parked = Arc::new(AtomicUsize::new(0));

        // A readiness callback claims the gate, meets a would-block and
        // either hands the gate back to re-wait or honours a pending stop.
        let retry = {
            let gate = Arc::clone(&gate);
            let cancelled = Arc::clone(&cancelled);
            let parked = Arc::clone(&parked);
            thread::spawn(move || {
                if gate.claim() {
                    if gate.release_unless_stopped() {
                        cancelled.fetch_add(1, Ordering::SeqCst);
                    } else {
                        parked.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        };
        let stopper = {
            let gate = Arc::clone(&gate);
            let cancelled = Arc::clone(&cancelled);
            thread::spawn(move || {
                if gate.request_stop() {
                    cancelled.fetch_add(1, Ordering::SeqCst);
                }
            })
        };
        retry.join().expect("retry thread panicked");
        stopper.join().expect("stop thread panicked");

        assert_eq!(cancelled.load(Ordering::SeqCst), 1, "stop request lost");
        assert!(gate.is_claimed());
        // A wait parked by the retry belongs to an operation the stop owns.
        assert!(parked.load(Ordering::SeqCst) <= 1);
    });
}
