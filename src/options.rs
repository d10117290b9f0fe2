//! Pass-through socket options and declarative socket configuration.
//!
//! The core adds no semantics to options: [`AsyncSocket::get`] and
//! [`AsyncSocket::set`] delegate straight to the transport.
//! [`SocketConfig`] is a builder (and `serde` target) that expands into a
//! list of option writes applied once after socket creation.
//!
//! [`AsyncSocket::get`]: crate::AsyncSocket::get
//! [`AsyncSocket::set`]: crate::AsyncSocket::set

use std::io;

use bytes::Bytes;
use serde::Deserialize;

/// Options understood by the pass-through configuration API.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SocketOption {
    /// Milliseconds to keep unsent frames after close; `-1` waits forever.
    Linger,
    /// Outbound high-water mark, in messages.
    SndHwm,
    /// Inbound high-water mark, in messages.
    RcvHwm,
    /// Identity announced to `ROUTER` peers on connect.
    RoutingId,
    /// Add a subscription prefix (`SUB` only, write-only).
    Subscribe,
    /// Remove a subscription prefix (`SUB` only, write-only).
    Unsubscribe,
    /// Fail sends to unknown routing ids instead of dropping them.
    RouterMandatory,
    /// Current readiness bits (read-only).
    Events,
    /// Socket type (read-only).
    Type,
}

/// Value carried by a [`SocketOption`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    /// Integral option value.
    Int(i64),
    /// Boolean option value.
    Bool(bool),
    /// Binary option value.
    Bytes(Bytes),
}

impl OptionValue {
    /// Return the integral value, or an `InvalidInput` error.
    ///
    /// # Errors
    ///
    /// Fails when the value is not [`OptionValue::Int`].
    pub fn as_int(&self) -> io::Result<i64> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(invalid_value("integer", other)),
        }
    }

    /// Return the boolean value, or an `InvalidInput` error.
    ///
    /// # Errors
    ///
    /// Fails when the value is not [`OptionValue::Bool`].
    pub fn as_bool(&self) -> io::Result<bool> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(invalid_value("boolean", other)),
        }
    }

    /// Return the binary value, or an `InvalidInput` error.
    ///
    /// # Errors
    ///
    /// Fails when the value is not [`OptionValue::Bytes`].
    pub fn as_bytes(&self) -> io::Result<&Bytes> {
        match self {
            Self::Bytes(v) => Ok(v),
            other => Err(invalid_value("bytes", other)),
        }
    }
}

fn invalid_value(expected: &str, got: &OptionValue) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("expected {expected} option value, got {got:?}"),
    )
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self { Self::Int(value) }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self { Self::Bool(value) }
}

impl From<Bytes> for OptionValue {
    fn from(value: Bytes) -> Self { Self::Bytes(value) }
}

impl From<&'static str> for OptionValue {
    fn from(value: &'static str) -> Self { Self::Bytes(Bytes::from_static(value.as_bytes())) }
}

/// Declarative socket configuration.
///
/// # Examples
///
/// ```
/// use zmq_async::options::{OptionValue, SocketConfig, SocketOption};
///
/// let config = SocketConfig::default().linger(0).routing_id("worker-1");
/// let writes = config.option_writes();
/// assert!(writes.contains(&(SocketOption::Linger, OptionValue::Int(0))));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocketConfig {
    linger: Option<i64>,
    sndhwm: Option<i64>,
    rcvhwm: Option<i64>,
    routing_id: Option<String>,
    subscribe: Vec<String>,
    router_mandatory: Option<bool>,
}

impl SocketConfig {
    /// Set the linger period in milliseconds.
    #[must_use]
    pub fn linger(mut self, millis: i64) -> Self {
        self.linger = Some(millis);
        self
    }

    /// Set the outbound high-water mark.
    #[must_use]
    pub fn sndhwm(mut self, messages: i64) -> Self {
        self.sndhwm = Some(messages);
        self
    }

    /// Set the inbound high-water mark.
    #[must_use]
    pub fn rcvhwm(mut self, messages: i64) -> Self {
        self.rcvhwm = Some(messages);
        self
    }

    /// Set the routing id announced on connect.
    #[must_use]
    pub fn routing_id(mut self, id: impl Into<String>) -> Self {
        self.routing_id = Some(id.into());
        self
    }

    /// Add a subscription prefix.
    #[must_use]
    pub fn subscribe(mut self, prefix: impl Into<String>) -> Self {
        self.subscribe.push(prefix.into());
        self
    }

    /// Toggle strict routing on `ROUTER` sockets.
    #[must_use]
    pub fn router_mandatory(mut self, enabled: bool) -> Self {
        self.router_mandatory = Some(enabled);
        self
    }

    /// Expand the configuration into option writes, in application order.
    #[must_use]
    pub fn option_writes(&self) -> Vec<(SocketOption, OptionValue)> {
        let mut writes = Vec::new();
        if let Some(v) = self.linger {
            writes.push((SocketOption::Linger, OptionValue::Int(v)));
        }
        if let Some(v) = self.sndhwm {
            writes.push((SocketOption::SndHwm, OptionValue::Int(v)));
        }
        if let Some(v) = self.rcvhwm {
            writes.push((SocketOption::RcvHwm, OptionValue::Int(v)));
        }
        if let Some(id) = &self.routing_id {
            writes.push((
                SocketOption::RoutingId,
                OptionValue::Bytes(Bytes::copy_from_slice(id.as_bytes())),
            ));
        }
        if let Some(v) = self.router_mandatory {
            writes.push((SocketOption::RouterMandatory, OptionValue::Bool(v)));
        }
        for prefix in &self.subscribe {
            writes.push((
                SocketOption::Subscribe,
                OptionValue::Bytes(Bytes::copy_from_slice(prefix.as_bytes())),
            ));
        }
        writes
    }
}

#[cfg(test)]
mod tests {
    use super::{OptionValue, SocketConfig, SocketOption};

    #[test]
    fn empty_config_writes_nothing() {
        assert!(SocketConfig::default().option_writes().is_empty());
    }

    #[test]
    fn subscriptions_are_written_last() {
        let config = SocketConfig::default().subscribe("a").linger(5);
        let writes = config.option_writes();
        assert_eq!(writes[0], (SocketOption::Linger, OptionValue::Int(5)));
        assert_eq!(writes[1], (SocketOption::Subscribe, OptionValue::from("a")));
    }

    #[test]
    fn option_value_accessors_reject_mismatches() {
        let err = OptionValue::Bool(true).as_int().expect_err("bool is not an int");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
