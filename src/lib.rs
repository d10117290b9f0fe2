#![doc(html_root_url = "https://docs.rs/zmq_async/latest")]
//! Asynchronous message sockets.
//!
//! `zmq_async` drives non-blocking, frame-oriented message sockets (frames
//! carrying a "more follows" marker, readiness bits and a pollable
//! descriptor) from asynchronous code. Every operation is a small state
//! machine that can be awaited as a future or connected to a continuation
//! [`Receiver`](operation::Receiver).
//!
//! The transport and the readiness substrate are traits
//! ([`RawSocket`](transport::RawSocket), [`Reactor`](reactor::Reactor)).
//! The crate ships an in-process transport ([`inproc`]) implementing the
//! common messaging patterns without any native library.

pub mod error;
pub mod flags;
pub mod frame;
pub mod inproc;
pub mod metrics;
pub mod multipart;
pub mod operation;
pub mod options;
pub mod proxy;
pub mod reactor;
mod sealed;
pub mod socket;
pub mod socket_type;
pub mod sync;
pub mod test_helpers;
pub mod transport;
pub mod watcher;

pub use error::{Result, SocketError};
pub use flags::{Events, RecvFlags, SendFlags};
pub use frame::Frame;
pub use metrics::Direction;
pub use multipart::Multipart;
pub use options::{OptionValue, SocketConfig, SocketOption};
pub use socket::{AsyncSocket, TypedSocket};
pub use socket_type::SocketType;
