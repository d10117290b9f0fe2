//! Synchronisation primitives shared by the operation state machines.
//!
//! Under `--cfg loom` the atomics come from `loom` so the model checker can
//! explore every interleaving of racing claimants.

#[cfg(loom)]
use loom::sync::atomic::{AtomicBool, AtomicU8, Ordering};
#[cfg(not(loom))]
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// One-shot completion flag.
///
/// Exactly one of several racing callers can [`claim`](Self::claim) the
/// flag; only that caller may perform the side-effecting completion of an
/// operation. The flag starts unclaimed and is only ever handed back through
/// [`release`](Self::release) by the current owner.
///
/// # Examples
///
/// ```
/// use zmq_async::sync::OneShot;
///
/// let flag = OneShot::new();
/// assert!(flag.claim());
/// assert!(!flag.claim());
/// ```
#[derive(Debug)]
pub struct OneShot(AtomicBool);

impl OneShot {
    /// Create an unclaimed flag.
    #[must_use]
    pub fn new() -> Self { Self(AtomicBool::new(false)) }

    /// Attempt to take ownership of the completion.
    ///
    /// Returns `true` for exactly one caller until the flag is released.
    pub fn claim(&self) -> bool { !self.0.swap(true, Ordering::AcqRel) }

    /// Hand ownership back so another party may claim it.
    ///
    /// Only the caller that last claimed the flag may release it.
    pub fn release(&self) { self.0.store(false, Ordering::Release); }

    /// Returns `true` while some caller owns the completion.
    #[must_use]
    pub fn is_claimed(&self) -> bool { self.0.load(Ordering::Acquire) }
}

impl Default for OneShot {
    fn default() -> Self { Self::new() }
}

const CLAIMED: u8 = 0b01;
const STOP: u8 = 0b10;

/// One-shot completion flag fused with a stop request.
///
/// Ownership and the stop bit live in one atomic, so a stop request racing
/// with an owner that gives the completion back is never lost: either the
/// owner sees the stop and keeps ownership, or the stop request claims the
/// released completion itself.
///
/// # Examples
///
/// ```
/// use zmq_async::sync::CompletionGate;
///
/// let gate = CompletionGate::new();
/// assert!(gate.claim());
/// // The stop arrives while the completion is owned.
/// assert!(!gate.request_stop());
/// // The owner meets a would-block and must honour the stop instead.
/// assert!(gate.release_unless_stopped());
/// ```
#[derive(Debug)]
pub struct CompletionGate(AtomicU8);

impl CompletionGate {
    /// An unclaimed gate with no stop requested.
    #[must_use]
    pub fn new() -> Self { Self(AtomicU8::new(0)) }

    /// Attempt to take ownership of the completion.
    pub fn claim(&self) -> bool { self.0.fetch_or(CLAIMED, Ordering::AcqRel) & CLAIMED == 0 }

    /// Record a stop request and try to take ownership of the completion.
    ///
    /// Returns `true` if the caller now owns the completion and must finish
    /// the operation as stopped.
    pub fn request_stop(&self) -> bool { self.0.fetch_or(CLAIMED | STOP, Ordering::AcqRel) & CLAIMED == 0 }

    /// Hand ownership back, unless a stop has been requested.
    ///
    /// Returns `true` when a stop is pending: the caller keeps ownership and
    /// must finish the operation as stopped.
    pub fn release_unless_stopped(&self) -> bool {
        let mut state = self.0.load(Ordering::Acquire);
        loop {
            if state & STOP != 0 {
                return true;
            }
            match self
                .0
                .compare_exchange(state, state & !CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return false,
                Err(actual) => state = actual,
            }
        }
    }

    /// Returns `true` once a stop has been requested.
    #[must_use]
    pub fn stop_requested(&self) -> bool { self.0.load(Ordering::Acquire) & STOP != 0 }

    /// Returns `true` while some caller owns the completion.
    #[must_use]
    pub fn is_claimed(&self) -> bool { self.0.load(Ordering::Acquire) & CLAIMED != 0 }
}

impl Default for CompletionGate {
    fn default() -> Self { Self::new() }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    use super::{CompletionGate, OneShot};

    #[test]
    fn only_one_of_many_threads_claims() {
        for _ in 0..64 {
            let flag = Arc::new(OneShot::new());
            let winners = Arc::new(AtomicUsize::new(0));
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let flag = Arc::clone(&flag);
                    let winners = Arc::clone(&winners);
                    thread::spawn(move || {
                        if flag.claim() {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().expect("claimant panicked");
            }
            assert_eq!(winners.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn released_flag_can_be_claimed_again() {
        let flag = OneShot::new();
        assert!(flag.claim());
        flag.release();
        assert!(!flag.is_claimed());
        assert!(flag.claim());
    }

    #[test]
    fn stop_claims_an_idle_gate() {
        let gate = CompletionGate::new();
        assert!(gate.request_stop());
        assert!(gate.stop_requested());
        assert!(!gate.claim());
    }

    #[test]
    fn release_without_stop_frees_the_gate() {
        let gate = CompletionGate::new();
        assert!(gate.claim());
        assert!(!gate.release_unless_stopped());
        assert!(!gate.is_claimed());
        assert!(gate.request_stop());
    }

    #[test]
    fn stop_during_ownership_is_handed_to_the_owner() {
        let gate = CompletionGate::new();
        assert!(gate.claim());
        assert!(!gate.request_stop());
        assert!(gate.release_unless_stopped());
        assert!(gate.is_claimed());
    }
}
