//! In-process socket implementing the messaging patterns.

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use log::{debug, warn};

use super::{ContextInner, pipe::Pipe, reactor::Signal};
use crate::{
    flags::{Events, RecvFlags, SendFlags},
    frame::Frame,
    options::{OptionValue, SocketOption},
    socket_type::SocketType,
    transport::{Descriptor, RawSocket, TryRecvError, TrySendError},
};

const DEFAULT_HWM: i64 = 1000;
const ENDPOINT_SCHEME: &str = "inproc://";

/// Registry entry for one endpoint name.
pub(super) enum Endpoint {
    Bound(Weak<SocketShared>),
    /// Connectors waiting for a bind.
    Pending(Vec<Weak<SocketShared>>),
}

struct Options {
    linger: i64,
    sndhwm: i64,
    rcvhwm: i64,
    routing_id: Option<Bytes>,
    router_mandatory: bool,
    subscriptions: Vec<Bytes>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            linger: -1,
            sndhwm: DEFAULT_HWM,
            rcvhwm: DEFAULT_HWM,
            routing_id: None,
            router_mandatory: false,
            subscriptions: Vec::new(),
        }
    }
}

struct Peer {
    key: u64,
    /// Key under which the remote socket knows us.
    remote_key: u64,
    endpoint: String,
    /// Identity of the remote, as seen by a `ROUTER`.
    routing_id: Bytes,
    tx: Arc<Pipe>,
    rx: Arc<Pipe>,
    remote: Weak<SocketShared>,
    /// The remote closed; only queued inbound messages remain.
    detached: bool,
}

enum Target {
    Peer(u64),
    All,
    Discard,
}

struct Outgoing {
    target: Target,
    frames: Vec<Frame>,
}

/// Request/reply lockstep.
enum Exchange {
    Idle,
    /// `REQ` sent a request to this peer and waits for its reply.
    AwaitingReply(u64),
    /// `REP` received a request and must reply through this envelope.
    Replying { peer: u64, envelope: Vec<Frame> },
}

struct State {
    closed: bool,
    options: Options,
    peers: Vec<Peer>,
    bound: Vec<String>,
    connected: Vec<String>,
    send_cursor: usize,
    recv_cursor: usize,
    outgoing: Option<Outgoing>,
    incoming: VecDeque<Frame>,
    exchange: Exchange,
}

pub(super) struct SocketShared {
    kind: SocketType,
    descriptor: Descriptor,
    signal: Arc<Signal>,
    ctx: Arc<ContextInner>,
    state: Mutex<State>,
}

/// Socket created by an [`inproc::Context`](super::Context).
///
/// Dropping the socket closes it.
pub struct InprocSocket {
    shared: Arc<SocketShared>,
}

fn closed_error() -> io::Error { io::Error::new(io::ErrorKind::NotConnected, "socket is closed") }

fn state_error() -> io::Error { io::Error::other("operation cannot be accomplished in current state") }

fn unsupported(kind: SocketType, what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("{kind} sockets cannot {what}"))
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.into())
}

fn check_endpoint(endpoint: &str) -> io::Result<()> {
    match endpoint.strip_prefix(ENDPOINT_SCHEME) {
        Some(name) if !name.is_empty() => Ok(()),
        Some(_) => Err(invalid("inproc endpoint name is empty")),
        None => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("unsupported transport in endpoint {endpoint:?}"),
        )),
    }
}

/// Pipe capacity for a writer/reader pair; zero on either side is unbounded.
fn pipe_hwm(sndhwm: i64, rcvhwm: i64) -> usize {
    if sndhwm == 0 || rcvhwm == 0 {
        0
    } else {
        usize::try_from(sndhwm.saturating_add(rcvhwm)).unwrap_or(0)
    }
}

/// Set `more` on every frame but the last.
fn seal(frames: &mut [Frame]) {
    let last = frames.len().saturating_sub(1);
    for (index, frame) in frames.iter_mut().enumerate() {
        frame.set_more(index != last);
    }
}

fn raise_all(remotes: Vec<Weak<SocketShared>>) {
    for remote in remotes {
        if let Some(remote) = remote.upgrade() {
            remote.signal.raise();
        }
    }
}

impl State {
    fn new() -> Self {
        Self {
            closed: false,
            options: Options::default(),
            peers: Vec::new(),
            bound: Vec::new(),
            connected: Vec::new(),
            send_cursor: 0,
            recv_cursor: 0,
            outgoing: None,
            incoming: VecDeque::new(),
            exchange: Exchange::Idle,
        }
    }

    fn peer(&self, key: u64) -> Option<&Peer> { self.peers.iter().find(|p| p.key == key) }

    fn writable_peer(peer: &Peer) -> bool { !peer.detached && peer.tx.has_capacity() }

    /// Round-robin over attached peers with outbound capacity.
    fn next_writable(&mut self) -> Option<u64> {
        let count = self.peers.len();
        let index = (0..count)
            .map(|offset| (self.send_cursor + offset) % count)
            .find(|&index| Self::writable_peer(&self.peers[index]))?;
        self.send_cursor = (index + 1) % count;
        Some(self.peers[index].key)
    }

    fn readable(&self, kind: SocketType) -> bool {
        if !self.incoming.is_empty() {
            return true;
        }
        match (kind, &self.exchange) {
            (SocketType::Req, Exchange::AwaitingReply(key)) => {
                self.peer(*key).is_some_and(|p| !p.rx.is_empty())
            }
            (SocketType::Req, _) | (SocketType::Rep, Exchange::Replying { .. }) => false,
            _ => self.peers.iter().any(|p| !p.rx.is_empty()),
        }
    }

    fn writable(&self, kind: SocketType) -> bool {
        if self.outgoing.is_some() {
            return true;
        }
        match kind {
            SocketType::Pub | SocketType::Router => true,
            SocketType::Rep => matches!(self.exchange, Exchange::Replying { .. }),
            SocketType::Req => {
                matches!(self.exchange, Exchange::Idle) && self.peers.iter().any(Self::writable_peer)
            }
            _ => self.peers.iter().any(Self::writable_peer),
        }
    }

    /// Fair-queue over peers with a queued message; `REQ` only listens to
    /// the peer it is waiting on.
    fn next_message(&mut self, kind: SocketType) -> Option<(usize, Vec<Frame>, bool)> {
        let count = self.peers.len();
        let index = if kind == SocketType::Req {
            let Exchange::AwaitingReply(key) = self.exchange else {
                return None;
            };
            self.peers.iter().position(|p| p.key == key)?
        } else {
            let index = (0..count)
                .map(|offset| (self.recv_cursor + offset) % count)
                .find(|&index| !self.peers[index].rx.is_empty())?;
            self.recv_cursor = (index + 1) % count;
            index
        };
        let (message, was_full) = self.peers[index].rx.pop()?;
        Some((index, message, was_full))
    }

    fn subscribed(&self, topic: Option<&Frame>) -> bool {
        let topic = topic.map_or(&[][..], |frame| frame.data().as_ref());
        self.options
            .subscriptions
            .iter()
            .any(|prefix| topic.starts_with(prefix))
    }

    fn remove_peer(&mut self, key: u64, linger: bool) -> Option<Peer> {
        let index = self.peers.iter().position(|p| p.key == key)?;
        if linger && !self.peers[index].rx.is_empty() {
            self.peers[index].detached = true;
            return None;
        }
        self.send_cursor = 0;
        self.recv_cursor = 0;
        Some(self.peers.remove(index))
    }
}

impl SocketShared {
    pub(super) fn new(kind: SocketType, descriptor: Descriptor, signal: Arc<Signal>, ctx: Arc<ContextInner>) -> Self {
        Self {
            kind,
            descriptor,
            signal,
            ctx,
            state: Mutex::new(State::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap_or_else(PoisonError::into_inner) }

    fn events(&self) -> Events {
        let state = self.state();
        let mut events = Events::empty();
        if state.closed {
            return events;
        }
        if self.kind.can_recv() && state.readable(self.kind) {
            events |= Events::POLLIN;
        }
        if self.kind.can_send() && state.writable(self.kind) {
            events |= Events::POLLOUT;
        }
        events
    }

    /// Start a message: pick its destination and any envelope frames.
    ///
    /// Returns `Ok(None)` when `frame` was consumed as a `ROUTER` address.
    fn begin(&self, state: &mut State, frame: Frame, more: bool) -> Result<Option<(Outgoing, Frame)>, TrySendError> {
        let outgoing = match self.kind {
            SocketType::Router => {
                let target = match state.peers.iter().find(|p| !p.detached && &p.routing_id == frame.data()) {
                    Some(peer) => Target::Peer(peer.key),
                    None if state.options.router_mandatory => {
                        return Err(TrySendError::Failed(io::Error::new(
                            io::ErrorKind::HostUnreachable,
                            format!("no peer with routing id {frame:?}"),
                        )));
                    }
                    None => Target::Discard,
                };
                if more {
                    state.outgoing = Some(Outgoing {
                        target,
                        frames: Vec::new(),
                    });
                }
                return Ok(None);
            }
            SocketType::Pub => Outgoing {
                target: Target::All,
                frames: Vec::new(),
            },
            SocketType::Rep => match &state.exchange {
                Exchange::Replying { peer, envelope } => Outgoing {
                    target: Target::Peer(*peer),
                    frames: envelope.clone(),
                },
                _ => return Err(TrySendError::Failed(state_error())),
            },
            SocketType::Req => {
                if !matches!(state.exchange, Exchange::Idle) {
                    return Err(TrySendError::Failed(state_error()));
                }
                let Some(key) = state.next_writable() else {
                    return Err(TrySendError::WouldBlock(frame));
                };
                Outgoing {
                    target: Target::Peer(key),
                    frames: vec![Frame::default()],
                }
            }
            _ => {
                let Some(key) = state.next_writable() else {
                    return Err(TrySendError::WouldBlock(frame));
                };
                Outgoing {
                    target: Target::Peer(key),
                    frames: Vec::new(),
                }
            }
        };
        Ok(Some((outgoing, frame)))
    }

    fn try_send(&self, frame: Frame, flags: SendFlags) -> Result<(), TrySendError> {
        let more = flags.contains(SendFlags::SNDMORE);
        let mut notify = Vec::new();
        {
            let mut state = self.state();
            if state.closed {
                return Err(TrySendError::Failed(closed_error()));
            }
            if !self.kind.can_send() {
                return Err(TrySendError::Failed(unsupported(self.kind, "send")));
            }
            let (mut outgoing, frame) = match state.outgoing.take() {
                Some(outgoing) => (outgoing, frame),
                None => match self.begin(&mut state, frame, more)? {
                    Some(started) => started,
                    None => return Ok(()),
                },
            };
            outgoing.frames.push(frame);
            if more {
                state.outgoing = Some(outgoing);
                return Ok(());
            }
            let Outgoing { target, mut frames } = outgoing;
            seal(&mut frames);
            let addressed = match target {
                Target::Peer(key) => Some(key),
                Target::All | Target::Discard => None,
            };
            match target {
                Target::Peer(key) => match state.peer(key) {
                    Some(peer) => {
                        peer.tx.push(frames);
                        notify.push(peer.remote.clone());
                    }
                    None => debug!("peer left before message completed; dropping message"),
                },
                Target::All => {
                    for peer in state.peers.iter().filter(|p| !p.detached) {
                        if peer.tx.has_capacity() {
                            peer.tx.push(frames.clone());
                            notify.push(peer.remote.clone());
                        } else {
                            debug!("subscriber pipe full on {}; dropping message", peer.endpoint);
                        }
                    }
                }
                Target::Discard => debug!("unroutable message dropped"),
            }
            match (self.kind, addressed) {
                (SocketType::Req, Some(key)) => state.exchange = Exchange::AwaitingReply(key),
                (SocketType::Rep, _) => state.exchange = Exchange::Idle,
                _ => {}
            }
        }
        raise_all(notify);
        Ok(())
    }

    fn try_recv(&self) -> Result<Frame, TryRecvError> {
        let mut notify = Vec::new();
        let result = {
            let mut state = self.state();
            if state.closed {
                return Err(TryRecvError::Failed(closed_error()));
            }
            if !self.kind.can_recv() {
                return Err(TryRecvError::Failed(unsupported(self.kind, "receive")));
            }
            self.take_frame(&mut state, &mut notify)
        };
        raise_all(notify);
        result
    }

    fn take_frame(&self, state: &mut State, notify: &mut Vec<Weak<SocketShared>>) -> Result<Frame, TryRecvError> {
        loop {
            if let Some(frame) = state.incoming.pop_front() {
                if state.incoming.is_empty() && self.kind == SocketType::Req {
                    state.exchange = Exchange::Idle;
                }
                return Ok(frame);
            }
            let (index, mut frames, was_full) = state.next_message(self.kind).ok_or(TryRecvError::WouldBlock)?;
            let peer = &state.peers[index];
            let (peer_key, routing_id) = (peer.key, peer.routing_id.clone());
            if was_full {
                notify.push(peer.remote.clone());
            }
            if peer.detached && peer.rx.is_empty() {
                state.peers.remove(index);
                state.recv_cursor = 0;
                state.send_cursor = 0;
            }
            match self.kind {
                SocketType::Sub if !state.subscribed(frames.first()) => continue,
                SocketType::Req => {
                    if !frames.first().is_some_and(Frame::is_empty) {
                        warn!("dropping reply without empty delimiter");
                        continue;
                    }
                    frames.remove(0);
                }
                SocketType::Rep => {
                    let Some(delimiter) = frames.iter().position(Frame::is_empty) else {
                        warn!("dropping request without empty delimiter");
                        continue;
                    };
                    let envelope: Vec<Frame> = frames.drain(..=delimiter).collect();
                    state.exchange = Exchange::Replying {
                        peer: peer_key,
                        envelope,
                    };
                }
                SocketType::Router => frames.insert(0, Frame::new(routing_id)),
                _ => {}
            }
            if frames.is_empty() {
                frames.push(Frame::default());
            }
            seal(&mut frames);
            state.incoming = frames.into();
        }
    }

    fn bind(self: &Arc<Self>, endpoint: &str) -> io::Result<()> {
        check_endpoint(endpoint)?;
        if self.state().closed {
            return Err(closed_error());
        }
        let me = Arc::downgrade(self);
        let waiting = match self.ctx.endpoints.entry(endpoint.to_owned()) {
            Entry::Occupied(mut entry) => {
                if let Endpoint::Bound(owner) = entry.get()
                    && owner.strong_count() > 0
                {
                    return Err(io::Error::new(
                        io::ErrorKind::AddrInUse,
                        format!("{endpoint} is already bound"),
                    ));
                }
                match entry.insert(Endpoint::Bound(me)) {
                    Endpoint::Pending(waiting) => waiting,
                    Endpoint::Bound(_) => Vec::new(),
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Endpoint::Bound(me));
                Vec::new()
            }
        };
        self.state().bound.push(endpoint.to_owned());
        debug!("{} socket bound to {endpoint}", self.kind);
        for connector in waiting.iter().filter_map(Weak::upgrade) {
            SocketShared::link(&connector, self, endpoint);
        }
        Ok(())
    }

    fn connect(self: &Arc<Self>, endpoint: &str) -> io::Result<()> {
        check_endpoint(endpoint)?;
        if self.state().closed {
            return Err(closed_error());
        }
        let me = Arc::downgrade(self);
        let binder = match self.ctx.endpoints.entry(endpoint.to_owned()) {
            Entry::Occupied(mut entry) => {
                let live = match entry.get() {
                    Endpoint::Bound(owner) => owner.upgrade(),
                    Endpoint::Pending(_) => None,
                };
                if live.is_none() {
                    match entry.get_mut() {
                        Endpoint::Pending(waiting) => waiting.push(me),
                        slot => *slot = Endpoint::Pending(vec![me]),
                    }
                }
                live
            }
            Entry::Vacant(entry) => {
                entry.insert(Endpoint::Pending(vec![me]));
                None
            }
        };
        self.state().connected.push(endpoint.to_owned());
        match binder {
            Some(binder) => SocketShared::link(self, &binder, endpoint),
            None => debug!("{} socket waiting for {endpoint} to be bound", self.kind),
        }
        Ok(())
    }

    /// Join `connector` and `binder` with a pair of pipes.
    fn link(connector: &Arc<Self>, binder: &Arc<Self>, endpoint: &str) {
        let (c_hwm, c_id) = connector.link_options();
        let (b_hwm, b_id) = binder.link_options();
        let exclusive = |s: &Self| s.kind == SocketType::Pair && !s.state().peers.is_empty();
        if exclusive(connector) || exclusive(binder) {
            debug!("pair socket already has a peer; ignoring connection on {endpoint}");
            return;
        }
        let ctx = &connector.ctx;
        let (c_key, b_key) = (ctx.next_key(), ctx.next_key());
        let c_to_b = Arc::new(Pipe::new(pipe_hwm(c_hwm.0, b_hwm.1)));
        let b_to_c = Arc::new(Pipe::new(pipe_hwm(b_hwm.0, c_hwm.1)));
        connector.state().peers.push(Peer {
            key: c_key,
            remote_key: b_key,
            endpoint: endpoint.to_owned(),
            routing_id: b_id.unwrap_or_else(|| ctx.generate_routing_id()),
            tx: Arc::clone(&c_to_b),
            rx: Arc::clone(&b_to_c),
            remote: Arc::downgrade(binder),
            detached: false,
        });
        binder.state().peers.push(Peer {
            key: b_key,
            remote_key: c_key,
            endpoint: endpoint.to_owned(),
            routing_id: c_id.unwrap_or_else(|| ctx.generate_routing_id()),
            tx: b_to_c,
            rx: c_to_b,
            remote: Arc::downgrade(connector),
            detached: false,
        });
        debug!("{} connected to {} on {endpoint}", connector.kind, binder.kind);
        connector.signal.raise();
        binder.signal.raise();
    }

    fn link_options(&self) -> ((i64, i64), Option<Bytes>) {
        let state = self.state();
        let options = &state.options;
        ((options.sndhwm, options.rcvhwm), options.routing_id.clone())
    }

    /// Remove the remote halves of `peers` and wake their owners.
    fn detach_remotes(peers: Vec<Peer>, linger: bool) {
        for peer in peers {
            if let Some(remote) = peer.remote.upgrade() {
                remote.state().remove_peer(peer.remote_key, linger);
                remote.signal.raise();
            }
        }
    }

    fn drop_endpoint_peers(&self, endpoint: &str) -> Vec<Peer> {
        let mut state = self.state();
        let (gone, kept) = std::mem::take(&mut state.peers)
            .into_iter()
            .partition(|p| p.endpoint == endpoint);
        state.peers = kept;
        state.send_cursor = 0;
        state.recv_cursor = 0;
        gone
    }

    fn forget_pending(self: &Arc<Self>, endpoint: &str) {
        if let Some(mut entry) = self.ctx.endpoints.get_mut(endpoint)
            && let Endpoint::Pending(waiting) = entry.value_mut()
        {
            waiting.retain(|w| !std::ptr::eq(w.as_ptr(), Arc::as_ptr(self)));
        }
        self.ctx
            .endpoints
            .remove_if(endpoint, |_, e| matches!(e, Endpoint::Pending(w) if w.is_empty()));
    }

    fn release_binding(self: &Arc<Self>, endpoint: &str) {
        self.ctx.endpoints.remove_if(endpoint, |_, e| {
            matches!(e, Endpoint::Bound(owner) if std::ptr::eq(owner.as_ptr(), Arc::as_ptr(self)))
        });
    }

    fn disconnect(self: &Arc<Self>, endpoint: &str) -> io::Result<()> {
        {
            let mut state = self.state();
            let index = state
                .connected
                .iter()
                .position(|e| e == endpoint)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("not connected to {endpoint}")))?;
            state.connected.remove(index);
        }
        self.forget_pending(endpoint);
        let gone = self.drop_endpoint_peers(endpoint);
        debug!("{} socket disconnected from {endpoint}", self.kind);
        Self::detach_remotes(gone, false);
        Ok(())
    }

    fn unbind(self: &Arc<Self>, endpoint: &str) -> io::Result<()> {
        {
            let mut state = self.state();
            let index = state
                .bound
                .iter()
                .position(|e| e == endpoint)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("not bound to {endpoint}")))?;
            state.bound.remove(index);
        }
        self.release_binding(endpoint);
        let gone = self.drop_endpoint_peers(endpoint);
        debug!("{} socket unbound from {endpoint}", self.kind);
        Self::detach_remotes(gone, false);
        Ok(())
    }

    fn close(self: &Arc<Self>) {
        let (peers, bound, connected, linger) = {
            let mut state = self.state();
            if state.closed {
                return;
            }
            state.closed = true;
            state.outgoing = None;
            state.incoming.clear();
            (
                std::mem::take(&mut state.peers),
                std::mem::take(&mut state.bound),
                std::mem::take(&mut state.connected),
                state.options.linger != 0,
            )
        };
        for endpoint in &bound {
            self.release_binding(endpoint);
        }
        for endpoint in &connected {
            self.forget_pending(endpoint);
        }
        Self::detach_remotes(peers, linger);
        debug!("{} socket {} closed", self.kind, self.descriptor);
        self.signal.raise();
    }

    fn get(&self, option: SocketOption) -> io::Result<OptionValue> {
        if option == SocketOption::Events {
            return Ok(OptionValue::Int(i64::from(self.events().bits())));
        }
        let state = self.state();
        let options = &state.options;
        Ok(match option {
            SocketOption::Linger => OptionValue::Int(options.linger),
            SocketOption::SndHwm => OptionValue::Int(options.sndhwm),
            SocketOption::RcvHwm => OptionValue::Int(options.rcvhwm),
            SocketOption::RoutingId => OptionValue::Bytes(options.routing_id.clone().unwrap_or_default()),
            SocketOption::RouterMandatory => OptionValue::Bool(options.router_mandatory),
            SocketOption::Type => OptionValue::Int(self.kind.code()),
            other => return Err(invalid(format!("{other:?} is write-only"))),
        })
    }

    fn set(&self, option: SocketOption, value: &OptionValue) -> io::Result<()> {
        let mut state = self.state();
        let options = &mut state.options;
        match option {
            SocketOption::Linger => options.linger = value.as_int()?,
            SocketOption::SndHwm | SocketOption::RcvHwm => {
                let hwm = value.as_int()?;
                if hwm < 0 {
                    return Err(invalid("high-water mark must not be negative"));
                }
                if option == SocketOption::SndHwm {
                    options.sndhwm = hwm;
                } else {
                    options.rcvhwm = hwm;
                }
            }
            SocketOption::RoutingId => {
                let id = value.as_bytes()?;
                if id.is_empty() || id.len() > 255 || id[0] == 0 {
                    return Err(invalid("routing id must be 1-255 bytes and not start with a zero byte"));
                }
                options.routing_id = Some(id.clone());
            }
            SocketOption::Subscribe | SocketOption::Unsubscribe => {
                if self.kind != SocketType::Sub {
                    return Err(unsupported(self.kind, "subscribe"));
                }
                let prefix = value.as_bytes()?.clone();
                if option == SocketOption::Subscribe {
                    options.subscriptions.push(prefix);
                } else if let Some(index) = options.subscriptions.iter().position(|s| *s == prefix) {
                    options.subscriptions.remove(index);
                }
            }
            SocketOption::RouterMandatory => {
                if self.kind != SocketType::Router {
                    return Err(unsupported(self.kind, "set router_mandatory"));
                }
                options.router_mandatory = value.as_bool()?;
            }
            other => return Err(invalid(format!("{other:?} is read-only"))),
        }
        Ok(())
    }
}

impl InprocSocket {
    pub(super) fn from_shared(shared: Arc<SocketShared>) -> Self { Self { shared } }
}

impl RawSocket for InprocSocket {
    fn socket_type(&self) -> SocketType { self.shared.kind }

    fn events(&self) -> Events { self.shared.events() }

    fn try_send(&self, frame: Frame, flags: SendFlags) -> Result<(), TrySendError> { self.shared.try_send(frame, flags) }

    fn try_recv(&self, _flags: RecvFlags) -> Result<Frame, TryRecvError> { self.shared.try_recv() }

    fn descriptor(&self) -> io::Result<Descriptor> { Ok(self.shared.descriptor) }

    fn is_closed(&self) -> bool { self.shared.state().closed }

    fn bind(&self, endpoint: &str) -> io::Result<()> { self.shared.bind(endpoint) }

    fn unbind(&self, endpoint: &str) -> io::Result<()> { self.shared.unbind(endpoint) }

    fn connect(&self, endpoint: &str) -> io::Result<()> { self.shared.connect(endpoint) }

    fn disconnect(&self, endpoint: &str) -> io::Result<()> { self.shared.disconnect(endpoint) }

    fn close(&self) { self.shared.close(); }

    fn get(&self, option: SocketOption) -> io::Result<OptionValue> { self.shared.get(option) }

    fn set(&self, option: SocketOption, value: OptionValue) -> io::Result<()> { self.shared.set(option, &value) }
}

impl Drop for InprocSocket {
    fn drop(&mut self) {
        self.shared.close();
        self.shared.ctx.reactor.remove_signal(self.shared.descriptor);
    }
}

impl std::fmt::Debug for InprocSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InprocSocket")
            .field("type", &self.shared.kind)
            .field("descriptor", &self.shared.descriptor)
            .finish_non_exhaustive()
    }
}
