//! Single message frames.
//!
//! A [`Frame`] is one discrete byte buffer of a (possibly multipart) message.
//! The `more` marker is set by the transport on receive and by the multipart
//! protocol on send; callers sending single frames never touch it.

use std::fmt;

use bytes::Bytes;

/// One frame of a message together with its "more frames follow" marker.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Frame {
    data: Bytes,
    more: bool,
}

impl Frame {
    /// Create a frame from anything convertible into [`Bytes`].
    ///
    /// # Examples
    ///
    /// ```
    /// use zmq_async::Frame;
    ///
    /// let frame = Frame::new("ping");
    /// assert_eq!(frame.as_ref(), b"ping");
    /// assert!(!frame.more());
    /// ```
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            more: false,
        }
    }

    /// Create a frame with an explicit `more` marker.
    ///
    /// Transports use this when handing a received frame to the core.
    #[must_use]
    pub fn with_more(data: impl Into<Bytes>, more: bool) -> Self {
        Self {
            data: data.into(),
            more,
        }
    }

    /// Returns `true` if further frames of the same message follow.
    #[must_use]
    pub fn more(&self) -> bool { self.more }

    /// Overwrite the `more` marker.
    pub fn set_more(&mut self, more: bool) { self.more = more; }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.data.len() }

    /// Returns `true` for a zero-length frame, such as an envelope delimiter.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Borrow the payload.
    #[must_use]
    pub fn data(&self) -> &Bytes { &self.data }

    /// Consume the frame and return its payload.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.data }

    /// Interpret the payload as UTF-8, if it is valid.
    #[must_use]
    pub fn to_str(&self) -> Option<&str> { std::str::from_utf8(&self.data).ok() }

    /// Returns `true` if the payload is printable ASCII.
    pub(crate) fn is_text(&self) -> bool { self.data.iter().all(|b| (32..=127).contains(b)) }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] { &self.data }
}

impl From<Bytes> for Frame {
    fn from(data: Bytes) -> Self { Self::new(data) }
}

impl From<Vec<u8>> for Frame {
    fn from(data: Vec<u8>) -> Self { Self::new(data) }
}

impl From<&'static [u8]> for Frame {
    fn from(data: &'static [u8]) -> Self { Self::new(data) }
}

impl From<&'static str> for Frame {
    fn from(data: &'static str) -> Self { Self::new(data) }
}

impl From<String> for Frame {
    fn from(data: String) -> Self { Self::new(data) }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Frame");
        match self.to_str() {
            Some(text) if self.is_text() => dbg.field("data", &text),
            _ => dbg.field("data", &self.data),
        };
        dbg.field("more", &self.more).finish()
    }
}
