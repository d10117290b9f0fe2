#![cfg(any(test, feature = "test-helpers"))]
//! Test-only transport, reactor and receiver doubles.
//!
//! [`ScriptedSocket`] answers every non-blocking call from a script the test
//! controls. [`ManualReactor`] parks watches until the test fires them, so
//! readiness callbacks can be raced against stop requests deterministically.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    io,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering},
    },
};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Result, SocketError},
    flags::{Events, RecvFlags, SendFlags},
    frame::Frame,
    operation::Receiver,
    options::{OptionValue, SocketOption},
    reactor::{Interest, Reactor, ReadyCallback, WatchToken, not_registered},
    socket::AsyncSocket,
    socket_type::SocketType,
    transport::{Descriptor, RawSocket, TryRecvError, TrySendError},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> { mutex.lock().unwrap_or_else(PoisonError::into_inner) }

/// Scripted answer to one `try_send` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendStep {
    /// Accept the frame.
    Accept,
    /// Hand the frame back as would-block.
    WouldBlock,
    /// Fail with an I/O error of this kind.
    Fail(io::ErrorKind),
}

/// Scripted answer to one `try_recv` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecvStep {
    /// Deliver the frame.
    Frame(Frame),
    /// Report would-block.
    WouldBlock,
    /// Fail with an I/O error of this kind.
    Fail(io::ErrorKind),
}

struct Script {
    kind: SocketType,
    descriptor: Option<Descriptor>,
    events: Mutex<Events>,
    closed: AtomicBool,
    send_script: Mutex<VecDeque<SendStep>>,
    recv_script: Mutex<VecDeque<RecvStep>>,
    sent: Mutex<Vec<(Frame, SendFlags)>>,
    recv_flags: Mutex<Vec<RecvFlags>>,
    config_calls: Mutex<Vec<String>>,
    options: Mutex<HashMap<SocketOption, OptionValue>>,
    send_calls: AtomicUsize,
    recv_calls: AtomicUsize,
}

/// Transport double whose behaviour is scripted by the test.
///
/// Clones share state, so a test keeps one handle after moving another into
/// an [`AsyncSocket`]. Unscripted sends are accepted; unscripted receives
/// would block. Events default to both directions ready.
#[derive(Clone)]
pub struct ScriptedSocket {
    script: Arc<Script>,
}

static NEXT_DESCRIPTOR: AtomicI64 = AtomicI64::new(10_000);

impl ScriptedSocket {
    /// A socket of type `kind` with a fresh descriptor.
    #[must_use]
    pub fn new(kind: SocketType) -> Self {
        let raw = NEXT_DESCRIPTOR.fetch_add(1, Ordering::Relaxed);
        Self::build(kind, Some(Descriptor::new(raw)))
    }

    /// A socket whose descriptor cannot be read.
    #[must_use]
    pub fn without_descriptor(kind: SocketType) -> Self { Self::build(kind, None) }

    fn build(kind: SocketType, descriptor: Option<Descriptor>) -> Self {
        Self {
            script: Arc::new(Script {
                kind,
                descriptor,
                events: Mutex::new(Events::all()),
                closed: AtomicBool::new(false),
                send_script: Mutex::new(VecDeque::new()),
                recv_script: Mutex::new(VecDeque::new()),
                sent: Mutex::new(Vec::new()),
                recv_flags: Mutex::new(Vec::new()),
                config_calls: Mutex::new(Vec::new()),
                options: Mutex::new(HashMap::new()),
                send_calls: AtomicUsize::new(0),
                recv_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Set the readiness bits reported from now on.
    pub fn set_events(&self, events: Events) { *lock(&self.script.events) = events; }

    /// Queue answers for upcoming `try_send` calls.
    pub fn script_sends(&self, steps: impl IntoIterator<Item = SendStep>) {
        lock(&self.script.send_script).extend(steps);
    }

    /// Queue answers for upcoming `try_recv` calls.
    pub fn script_recvs(&self, steps: impl IntoIterator<Item = RecvStep>) {
        lock(&self.script.recv_script).extend(steps);
    }

    /// Queue the frames of one message, marking all but the last with `more`.
    pub fn queue_message<I, F>(&self, parts: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<Frame>,
    {
        let mut frames: Vec<Frame> = parts.into_iter().map(Into::into).collect();
        let last = frames.len().saturating_sub(1);
        for (i, frame) in frames.iter_mut().enumerate() {
            frame.set_more(i < last);
        }
        self.script_recvs(frames.into_iter().map(RecvStep::Frame));
    }

    /// Frames accepted so far, with the flags they were sent with.
    #[must_use]
    pub fn sent(&self) -> Vec<(Frame, SendFlags)> { lock(&self.script.sent).clone() }

    /// Flags passed to every `try_recv` call so far.
    #[must_use]
    pub fn recv_flags(&self) -> Vec<RecvFlags> { lock(&self.script.recv_flags).clone() }

    /// Number of `try_send` calls, including would-blocks and failures.
    #[must_use]
    pub fn send_calls(&self) -> usize { self.script.send_calls.load(Ordering::SeqCst) }

    /// Number of `try_recv` calls, including would-blocks and failures.
    #[must_use]
    pub fn recv_calls(&self) -> usize { self.script.recv_calls.load(Ordering::SeqCst) }

    /// Configuration calls, formatted as `"<call> <endpoint>"`.
    #[must_use]
    pub fn config_calls(&self) -> Vec<String> { lock(&self.script.config_calls).clone() }

    fn record(&self, call: &str, endpoint: &str) -> io::Result<()> {
        if self.is_closed() {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        }
        lock(&self.script.config_calls).push(format!("{call} {endpoint}"));
        Ok(())
    }
}

impl RawSocket for ScriptedSocket {
    fn socket_type(&self) -> SocketType { self.script.kind }

    fn events(&self) -> Events { *lock(&self.script.events) }

    fn try_send(&self, frame: Frame, flags: SendFlags) -> std::result::Result<(), TrySendError> {
        self.script.send_calls.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.script.send_script)
            .pop_front()
            .unwrap_or(SendStep::Accept);
        match step {
            SendStep::Accept => {
                lock(&self.script.sent).push((frame, flags));
                Ok(())
            }
            SendStep::WouldBlock => Err(TrySendError::WouldBlock(frame)),
            SendStep::Fail(kind) => Err(TrySendError::Failed(io::Error::from(kind))),
        }
    }

    fn try_recv(&self, flags: RecvFlags) -> std::result::Result<Frame, TryRecvError> {
        self.script.recv_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.script.recv_flags).push(flags);
        let step = lock(&self.script.recv_script)
            .pop_front()
            .unwrap_or(RecvStep::WouldBlock);
        match step {
            RecvStep::Frame(frame) => Ok(frame),
            RecvStep::WouldBlock => Err(TryRecvError::WouldBlock),
            RecvStep::Fail(kind) => Err(TryRecvError::Failed(io::Error::from(kind))),
        }
    }

    fn descriptor(&self) -> io::Result<Descriptor> {
        self.script
            .descriptor
            .ok_or_else(|| io::Error::other("descriptor unavailable"))
    }

    fn is_closed(&self) -> bool { self.script.closed.load(Ordering::SeqCst) }

    fn bind(&self, endpoint: &str) -> io::Result<()> { self.record("bind", endpoint) }

    fn unbind(&self, endpoint: &str) -> io::Result<()> { self.record("unbind", endpoint) }

    fn connect(&self, endpoint: &str) -> io::Result<()> { self.record("connect", endpoint) }

    fn disconnect(&self, endpoint: &str) -> io::Result<()> { self.record("disconnect", endpoint) }

    fn close(&self) { self.script.closed.store(true, Ordering::SeqCst); }

    fn get(&self, option: SocketOption) -> io::Result<OptionValue> {
        match option {
            SocketOption::Events => Ok(OptionValue::Int(i64::from(self.events().bits()))),
            SocketOption::Type => Ok(OptionValue::Int(self.script.kind.code())),
            other => lock(&self.script.options)
                .get(&other)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    fn set(&self, option: SocketOption, value: OptionValue) -> io::Result<()> {
        if matches!(option, SocketOption::Events | SocketOption::Type) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        lock(&self.script.options).insert(option, value);
        Ok(())
    }
}

impl std::fmt::Debug for ScriptedSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedSocket")
            .field("kind", &self.script.kind)
            .field("descriptor", &self.script.descriptor)
            .finish_non_exhaustive()
    }
}

struct PendingWatch {
    descriptor: Descriptor,
    interest: Interest,
    token: WatchToken,
    callback: ReadyCallback,
}

#[derive(Default)]
struct ManualState {
    registered: HashSet<Descriptor>,
    watches: Vec<PendingWatch>,
    watch_calls: usize,
    cancellations: usize,
    reject_watches: bool,
    inline_resolutions: usize,
}

/// Reactor whose watches resolve only when the test fires them.
///
/// Cancelled watches are dropped uninvoked.
#[derive(Default)]
pub struct ManualReactor {
    state: Mutex<ManualState>,
    next_token: AtomicU64,
}

impl ManualReactor {
    /// A reactor with no registrations.
    #[must_use]
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    /// Number of parked watches.
    #[must_use]
    pub fn pending(&self) -> usize { lock(&self.state).watches.len() }

    /// Interests of the parked watches, oldest first.
    #[must_use]
    pub fn pending_interests(&self) -> Vec<Interest> {
        lock(&self.state).watches.iter().map(|w| w.interest).collect()
    }

    /// Number of accepted or rejected `watch` calls.
    #[must_use]
    pub fn watch_calls(&self) -> usize { lock(&self.state).watch_calls }

    /// Number of watches removed by `cancel_watch`.
    #[must_use]
    pub fn cancellations(&self) -> usize { lock(&self.state).cancellations }

    /// Returns `true` while `descriptor` is registered.
    #[must_use]
    pub fn is_registered(&self, descriptor: Descriptor) -> bool {
        lock(&self.state).registered.contains(&descriptor)
    }

    /// Make later `watch` calls fail.
    pub fn reject_watches(&self, reject: bool) { lock(&self.state).reject_watches = reject; }

    /// Resolve the next `count` watches successfully inside `watch` itself,
    /// before their tokens are returned.
    pub fn resolve_inline(&self, count: usize) { lock(&self.state).inline_resolutions = count; }

    /// Remove the parked watches without invoking them.
    ///
    /// Lets a test invoke the callbacks itself, for example from several
    /// threads at once.
    #[must_use]
    pub fn take_watches(&self) -> Vec<ReadyCallback> {
        std::mem::take(&mut lock(&self.state).watches)
            .into_iter()
            .map(|w| w.callback)
            .collect()
    }

    /// Resolve every parked watch successfully. Returns how many fired.
    pub fn fire(&self) -> usize { self.fire_with(|| Ok(())) }

    /// Resolve every parked watch with the status `make` produces.
    pub fn fire_with(&self, make: impl Fn() -> io::Result<()>) -> usize {
        let callbacks = self.take_watches();
        let fired = callbacks.len();
        for callback in callbacks {
            callback(make());
        }
        fired
    }
}

impl Reactor for ManualReactor {
    fn register(&self, descriptor: Descriptor) -> io::Result<()> {
        lock(&self.state).registered.insert(descriptor);
        Ok(())
    }

    fn watch(
        &self,
        descriptor: Descriptor,
        interest: Interest,
        on_ready: ReadyCallback,
    ) -> io::Result<WatchToken> {
        let mut state = lock(&self.state);
        state.watch_calls += 1;
        if state.reject_watches {
            return Err(io::Error::other("watch rejected"));
        }
        if !state.registered.contains(&descriptor) {
            return Err(not_registered(descriptor));
        }
        let token = WatchToken::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        if state.inline_resolutions > 0 {
            state.inline_resolutions -= 1;
            drop(state);
            on_ready(Ok(()));
            return Ok(token);
        }
        state.watches.push(PendingWatch {
            descriptor,
            interest,
            token,
            callback: on_ready,
        });
        Ok(token)
    }

    fn cancel_watch(&self, descriptor: Descriptor, token: WatchToken) {
        let removed = {
            let mut state = lock(&self.state);
            let index = state
                .watches
                .iter()
                .position(|w| w.descriptor == descriptor && w.token == token);
            let removed = index.map(|i| state.watches.remove(i));
            if removed.is_some() {
                state.cancellations += 1;
            }
            removed
        };
        drop(removed);
    }

    fn deregister(&self, descriptor: Descriptor) {
        let dropped: Vec<PendingWatch> = {
            let mut state = lock(&self.state);
            state.registered.remove(&descriptor);
            let (dropped, kept) = std::mem::take(&mut state.watches)
                .into_iter()
                .partition(|w| w.descriptor == descriptor);
            state.watches = kept;
            dropped
        };
        drop(dropped);
    }
}

impl std::fmt::Debug for ManualReactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualReactor")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Wrap a fresh [`ScriptedSocket`] of type `kind` in an [`AsyncSocket`]
/// driven by a [`ManualReactor`].
///
/// # Errors
///
/// Fails for socket types that cannot be used asynchronously.
pub fn scripted_socket(kind: SocketType) -> Result<(AsyncSocket, ScriptedSocket, Arc<ManualReactor>)> {
    let raw = ScriptedSocket::new(kind);
    let reactor = ManualReactor::new();
    let socket = AsyncSocket::new(raw.clone(), Arc::clone(&reactor) as Arc<dyn Reactor>)?;
    Ok((socket, raw, reactor))
}

/// Outcome delivered to a [`RecordingReceiver`].
#[derive(Debug)]
pub enum Outcome<T> {
    /// `set_value` was called.
    Value(T),
    /// `set_error` was called.
    Error(SocketError),
    /// `set_stopped` was called.
    Stopped,
}

struct Recording<T> {
    outcome: Mutex<Option<Outcome<T>>>,
    deliveries: AtomicUsize,
    notify: Notify,
}

/// Shared view of what a [`RecordingReceiver`] was given.
pub struct Recorded<T> {
    inner: Arc<Recording<T>>,
}

impl<T> Recorded<T> {
    /// Take the outcome, if one arrived.
    #[must_use]
    pub fn take(&self) -> Option<Outcome<T>> { lock(&self.inner.outcome).take() }

    /// Returns `true` once any channel was invoked.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.deliveries() > 0 }

    /// Number of channel invocations; never more than one.
    #[must_use]
    pub fn deliveries(&self) -> usize { self.inner.deliveries.load(Ordering::SeqCst) }

    /// Wait for the outcome.
    pub async fn outcome(&self) -> Outcome<T> {
        loop {
            if let Some(outcome) = self.take() {
                return outcome;
            }
            self.inner.notify.notified().await;
        }
    }
}

/// Receiver that records its single outcome.
pub struct RecordingReceiver<T> {
    inner: Arc<Recording<T>>,
    stop_token: Option<CancellationToken>,
}

impl<T: Send + 'static> RecordingReceiver<T> {
    /// A receiver without a stop token.
    #[must_use]
    pub fn new() -> (Self, Recorded<T>) { Self::build(None) }

    /// A receiver whose stop requests come from `token`.
    #[must_use]
    pub fn with_stop_token(token: CancellationToken) -> (Self, Recorded<T>) { Self::build(Some(token)) }

    fn build(stop_token: Option<CancellationToken>) -> (Self, Recorded<T>) {
        let inner = Arc::new(Recording {
            outcome: Mutex::new(None),
            deliveries: AtomicUsize::new(0),
            notify: Notify::new(),
        });
        let recorded = Recorded {
            inner: Arc::clone(&inner),
        };
        (Self { inner, stop_token }, recorded)
    }

    fn deliver(self, outcome: Outcome<T>) {
        self.inner.deliveries.fetch_add(1, Ordering::SeqCst);
        *lock(&self.inner.outcome) = Some(outcome);
        self.inner.notify.notify_one();
    }
}

impl<T: Send + 'static> Receiver<T> for RecordingReceiver<T> {
    fn set_value(self, value: T) { self.deliver(Outcome::Value(value)); }

    fn set_error(self, error: SocketError) { self.deliver(Outcome::Error(error)); }

    fn set_stopped(self) { self.deliver(Outcome::Stopped); }

    fn stop_token(&self) -> Option<CancellationToken> { self.stop_token.clone() }
}
