//! Shared fixtures and assertions for `zmq_async` integration tests.
//!
//! The fixtures build connected in-process socket pairs on unique
//! endpoints, so tests can run in parallel without colliding on names.
//!
//! ```rust
//! use zmq_async::{RecvFlags, SendFlags, SocketType};
//! use zmq_async_testing::connected_pair;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> zmq_async::Result<()> {
//! let (ctx, push, pull) = connected_pair(SocketType::Push, SocketType::Pull)?;
//! push.send("ping", SendFlags::empty()).await?;
//! let frame = pull.recv(RecvFlags::empty()).await?;
//! assert_eq!(frame.as_ref(), b"ping");
//! # drop(ctx);
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod logging;
pub mod macros;
pub mod metrics;

pub use fixtures::{connected_pair, context, pair, unique_endpoint};
pub use logging::{LoggerHandle, logger};
pub use metrics::{CounterProbe, counter_probe};
pub use zmq_async::test_helpers::{
    ManualReactor,
    Outcome,
    RecordingReceiver,
    RecvStep,
    ScriptedSocket,
    SendStep,
    scripted_socket,
};

/// Boxed error alias for tests returning `Result`.
pub type TestError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for tests returning `Result`.
pub type TestResult<T = ()> = Result<T, TestError>;
