//! Readiness signalling for in-process sockets.
//!
//! Each socket owns a [`Signal`]: a latch per [`Interest`] raised whenever
//! something that could change the socket's readiness happens (a peer queued
//! a message, drained a full pipe, connected, or went away). A raise wakes
//! every parked watch and latches the edge for each interest nobody was
//! waiting on. Only a watch for the same interest consumes a latched edge,
//! so a readiness check or wait in one direction never swallows a change
//! the other direction needs. Stale edges cost one spurious wakeup.

use std::{
    io,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use tokio::runtime::Handle;

use crate::{
    reactor::{Interest, Reactor, ReadyCallback, WatchToken, not_registered},
    transport::Descriptor,
};

const INTERESTS: [Interest; 2] = [Interest::Readable, Interest::Writable];

fn latch_index(interest: Interest) -> usize {
    match interest {
        Interest::Readable => 0,
        Interest::Writable => 1,
    }
}

struct ParkedWatch {
    token: WatchToken,
    interest: Interest,
    callback: ReadyCallback,
}

#[derive(Default)]
struct SignalState {
    raised: [bool; 2],
    watches: Vec<ParkedWatch>,
}

/// Per-interest edge latches plus the watches parked on them.
pub(crate) struct Signal {
    state: Mutex<SignalState>,
    runtime: Option<Handle>,
}

impl Signal {
    fn new(runtime: Option<Handle>) -> Self {
        Self {
            state: Mutex::new(SignalState::default()),
            runtime,
        }
    }

    fn state(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake every parked watch and latch the edge for each interest that
    /// had none parked.
    pub(crate) fn raise(&self) {
        let watches = {
            let mut state = self.state();
            let watches = std::mem::take(&mut state.watches);
            for interest in INTERESTS {
                if !watches.iter().any(|w| w.interest == interest) {
                    state.raised[latch_index(interest)] = true;
                }
            }
            watches
        };
        for watch in watches {
            self.dispatch(watch.callback);
        }
    }

    fn watch(&self, token: WatchToken, interest: Interest, callback: ReadyCallback) {
        let mut state = self.state();
        if std::mem::take(&mut state.raised[latch_index(interest)]) {
            drop(state);
            self.dispatch(callback);
        } else {
            state.watches.push(ParkedWatch {
                token,
                interest,
                callback,
            });
        }
    }

    fn cancel(&self, token: WatchToken) -> Option<ReadyCallback> {
        let mut state = self.state();
        let index = state.watches.iter().position(|w| w.token == token)?;
        Some(state.watches.swap_remove(index).callback)
    }

    fn drop_watches(&self) -> Vec<ParkedWatch> { std::mem::take(&mut self.state().watches) }

    /// Run `callback` on the runtime when one is available, otherwise on
    /// the calling thread.
    fn dispatch(&self, callback: ReadyCallback) {
        match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => {
                runtime.spawn(async move { callback(Ok(())) });
            }
            None => callback(Ok(())),
        }
    }
}

/// [`Reactor`] for sockets created by an [`inproc::Context`](super::Context).
///
/// Parked watches on a socket resolve whenever the socket's signal is
/// raised, whatever their [`Interest`]; the operation re-checks the socket's
/// events and waits again if the change did not concern it.
pub struct InprocReactor {
    signals: DashMap<Descriptor, Arc<Signal>>,
    next_token: AtomicU64,
    runtime: Option<Handle>,
}

impl InprocReactor {
    pub(crate) fn new(runtime: Option<Handle>) -> Self {
        Self {
            signals: DashMap::new(),
            next_token: AtomicU64::new(0),
            runtime,
        }
    }

    pub(crate) fn create_signal(&self, descriptor: Descriptor) -> Arc<Signal> {
        let signal = Arc::new(Signal::new(self.runtime.clone()));
        self.signals.insert(descriptor, Arc::clone(&signal));
        signal
    }

    pub(crate) fn remove_signal(&self, descriptor: Descriptor) {
        if let Some((_, signal)) = self.signals.remove(&descriptor) {
            drop(signal.drop_watches());
        }
    }

    fn signal(&self, descriptor: Descriptor) -> io::Result<Arc<Signal>> {
        self.signals
            .get(&descriptor)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| not_registered(descriptor))
    }
}

impl Reactor for InprocReactor {
    fn register(&self, descriptor: Descriptor) -> io::Result<()> { self.signal(descriptor).map(drop) }

    fn watch(
        &self,
        descriptor: Descriptor,
        interest: Interest,
        on_ready: ReadyCallback,
    ) -> io::Result<WatchToken> {
        let signal = self.signal(descriptor)?;
        let token = WatchToken::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        signal.watch(token, interest, on_ready);
        Ok(token)
    }

    fn cancel_watch(&self, descriptor: Descriptor, token: WatchToken) {
        if let Ok(signal) = self.signal(descriptor) {
            drop(signal.cancel(token));
        }
    }

    fn deregister(&self, descriptor: Descriptor) {
        if let Ok(signal) = self.signal(descriptor) {
            drop(signal.drop_watches());
        }
    }
}

impl std::fmt::Debug for InprocReactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InprocReactor")
            .field("signals", &self.signals.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::InprocReactor;
    use crate::{
        reactor::{Interest, Reactor},
        transport::Descriptor,
    };

    fn counting_callback(hits: &Arc<AtomicUsize>) -> crate::reactor::ReadyCallback {
        let hits = Arc::clone(hits);
        Box::new(move |status| {
            assert!(status.is_ok());
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn raised_latch_fires_next_watch_immediately() {
        let reactor = InprocReactor::new(None);
        let signal = reactor.create_signal(Descriptor::new(1));
        let hits = Arc::new(AtomicUsize::new(0));

        signal.raise();
        reactor
            .watch(Descriptor::new(1), Interest::Readable, counting_callback(&hits))
            .expect("watch");
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // The latch was consumed by the first watch.
        reactor
            .watch(Descriptor::new(1), Interest::Readable, counting_callback(&hits))
            .expect("watch");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        signal.raise();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cancelled_watch_is_not_invoked() {
        let reactor = InprocReactor::new(None);
        let signal = reactor.create_signal(Descriptor::new(2));
        let hits = Arc::new(AtomicUsize::new(0));
        let token = reactor
            .watch(Descriptor::new(2), Interest::Writable, counting_callback(&hits))
            .expect("watch");
        reactor.cancel_watch(Descriptor::new(2), token);
        signal.raise();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn latched_edges_are_kept_per_interest() {
        let reactor = InprocReactor::new(None);
        let signal = reactor.create_signal(Descriptor::new(3));
        let readable = Arc::new(AtomicUsize::new(0));
        let writable = Arc::new(AtomicUsize::new(0));

        signal.raise();
        reactor
            .watch(Descriptor::new(3), Interest::Writable, counting_callback(&writable))
            .expect("watch");
        reactor
            .watch(Descriptor::new(3), Interest::Readable, counting_callback(&readable))
            .expect("watch");
        assert_eq!(writable.load(Ordering::SeqCst), 1);
        assert_eq!(readable.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn raise_latches_only_interests_nobody_waited_on() {
        let reactor = InprocReactor::new(None);
        let signal = reactor.create_signal(Descriptor::new(4));
        let readable = Arc::new(AtomicUsize::new(0));
        let writable = Arc::new(AtomicUsize::new(0));

        reactor
            .watch(Descriptor::new(4), Interest::Readable, counting_callback(&readable))
            .expect("watch");
        signal.raise();
        assert_eq!(readable.load(Ordering::SeqCst), 1);

        // The readable waiter was woken, so only the writable edge is latched.
        reactor
            .watch(Descriptor::new(4), Interest::Readable, counting_callback(&readable))
            .expect("watch");
        reactor
            .watch(Descriptor::new(4), Interest::Writable, counting_callback(&writable))
            .expect("watch");
        assert_eq!(readable.load(Ordering::SeqCst), 1);
        assert_eq!(writable.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_descriptor_is_rejected() {
        let reactor = InprocReactor::new(None);
        assert!(reactor.register(Descriptor::new(9)).is_err());
    }
}
