//! Ordered multipart messages.
//!
//! A [`Multipart`] is the unit moved by `send_multipart` and
//! `recv_multipart`. It is a deque of [`Frame`]s with helpers for the common
//! envelope manipulations (pushing routing frames to the front, popping
//! them back off), string and `bincode`-typed parts, and a length-prefixed
//! single-buffer encoding (see [`codec`]).

pub mod codec;

use std::{
    collections::{VecDeque, vec_deque},
    fmt,
};

use bincode::{
    Decode,
    Encode,
    config,
    decode_from_slice,
    encode_to_vec,
    error::{DecodeError, EncodeError},
};
use thiserror::Error;

pub use self::codec::CodecError;
use crate::frame::Frame;

/// Parts of this size or larger are elided from the [`Display`](fmt::Display)
/// dump.
pub const DUMP_LIMIT: usize = 1000;

/// Failure converting a typed part.
#[derive(Debug, Error)]
pub enum TypedPartError {
    /// The value could not be encoded.
    #[error("failed to encode part: {0}")]
    Encode(#[from] EncodeError),
    /// The part did not hold a valid encoding of the requested type.
    #[error("failed to decode part: {0}")]
    Decode(#[from] DecodeError),
    /// The part held more bytes than the decoded value consumed.
    #[error("part has {0} unconsumed trailing bytes")]
    TrailingBytes(usize),
}

/// An ordered sequence of frames sent or received as one message.
///
/// Equality compares frame payloads only; the per-frame `more` flags are
/// transport bookkeeping.
///
/// # Examples
///
/// ```
/// use zmq_async::Multipart;
///
/// let mut msg = Multipart::new();
/// msg.add_str("payload");
/// msg.push_str("envelope");
/// assert_eq!(msg.pop_str().as_deref(), Some("envelope"));
/// assert_eq!(msg.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Multipart {
    parts: VecDeque<Frame>,
}

impl Multipart {
    /// Create an empty message.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize { self.parts.len() }

    /// Returns `true` if the message has no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.parts.is_empty() }

    /// Remove every part.
    pub fn clear(&mut self) { self.parts.clear(); }

    /// Prepend a part.
    pub fn push(&mut self, part: impl Into<Frame>) { self.parts.push_front(part.into()); }

    /// Append a part.
    pub fn add(&mut self, part: impl Into<Frame>) { self.parts.push_back(part.into()); }

    /// Remove and return the first part.
    pub fn pop(&mut self) -> Option<Frame> { self.parts.pop_front() }

    /// Remove and return the last part.
    pub fn remove(&mut self) -> Option<Frame> { self.parts.pop_back() }

    /// Prepend a UTF-8 string part.
    pub fn push_str(&mut self, part: &str) { self.push(Frame::new(part.to_owned())); }

    /// Append a UTF-8 string part.
    pub fn add_str(&mut self, part: &str) { self.add(Frame::new(part.to_owned())); }

    /// Remove the first part and return it as a string.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn pop_str(&mut self) -> Option<String> {
        self.pop()
            .map(|part| String::from_utf8_lossy(part.data()).into_owned())
    }

    /// Prepend a `bincode`-encoded part.
    ///
    /// # Errors
    ///
    /// Returns [`TypedPartError::Encode`] if `value` cannot be encoded.
    pub fn push_typed<T: Encode>(&mut self, value: &T) -> Result<(), TypedPartError> {
        let bytes = encode_to_vec(value, config::standard())?;
        self.push(bytes);
        Ok(())
    }

    /// Append a `bincode`-encoded part.
    ///
    /// # Errors
    ///
    /// Returns [`TypedPartError::Encode`] if `value` cannot be encoded.
    pub fn add_typed<T: Encode>(&mut self, value: &T) -> Result<(), TypedPartError> {
        let bytes = encode_to_vec(value, config::standard())?;
        self.add(bytes);
        Ok(())
    }

    /// Remove the first part and decode it.
    ///
    /// Returns `Ok(None)` when the message is empty. The part is consumed
    /// even if decoding fails.
    ///
    /// # Errors
    ///
    /// Fails if the part is not exactly one encoded `T`.
    pub fn pop_typed<T: Decode<()>>(&mut self) -> Result<Option<T>, TypedPartError> {
        let Some(part) = self.pop() else {
            return Ok(None);
        };
        let (value, consumed) = decode_from_slice(part.data(), config::standard())?;
        if consumed != part.len() {
            return Err(TypedPartError::TrailingBytes(part.len() - consumed));
        }
        Ok(Some(value))
    }

    /// Move every part of `other` to the back of this message.
    pub fn append(&mut self, mut other: Multipart) { self.parts.append(&mut other.parts); }

    /// Move every part of `other` to the front of this message, keeping
    /// their order.
    pub fn prepend(&mut self, mut other: Multipart) {
        other.parts.append(&mut self.parts);
        self.parts = other.parts;
    }

    /// Borrow the part at `index`.
    #[must_use]
    pub fn peek(&self, index: usize) -> Option<&Frame> { self.parts.get(index) }

    /// Borrow the first part.
    #[must_use]
    pub fn front(&self) -> Option<&Frame> { self.parts.front() }

    /// Borrow the last part.
    #[must_use]
    pub fn back(&self) -> Option<&Frame> { self.parts.back() }

    /// Iterate over the parts in order.
    pub fn iter(&self) -> vec_deque::Iter<'_, Frame> { self.parts.iter() }

    /// Consume the message, yielding its parts in order.
    pub fn into_frames(self) -> vec_deque::IntoIter<Frame> { self.parts.into_iter() }

    /// Encode the message into a single length-prefixed buffer.
    ///
    /// # Errors
    ///
    /// See [`codec::encode`].
    pub fn encode(&self) -> Result<bytes::Bytes, CodecError> { codec::encode(self) }

    /// Decode a buffer produced by [`Multipart::encode`].
    ///
    /// # Errors
    ///
    /// See [`codec::decode`].
    pub fn decode(buf: impl Into<bytes::Bytes>) -> Result<Self, CodecError> {
        codec::decode(buf.into())
    }

    /// Decode `buf` and append its parts to this message.
    ///
    /// Nothing is appended when decoding fails.
    ///
    /// # Errors
    ///
    /// See [`codec::decode`].
    pub fn decode_append(&mut self, buf: impl Into<bytes::Bytes>) -> Result<(), CodecError> {
        let decoded = codec::decode(buf.into())?;
        self.append(decoded);
        Ok(())
    }
}

impl PartialEq for Multipart {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.data() == b.data())
    }
}

impl Eq for Multipart {}

impl fmt::Debug for Multipart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.parts.iter()).finish()
    }
}

impl fmt::Display for Multipart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multipart [{} parts]", self.len())?;
        for part in &self.parts {
            write!(f, "\n[{:03}] ", part.len())?;
            if part.len() >= DUMP_LIMIT {
                f.write_str("... too big to print")?;
            } else if part.is_text() {
                f.write_str(&String::from_utf8_lossy(part.data()))?;
            } else {
                f.write_str("0x")?;
                for byte in part.data() {
                    write!(f, "{byte:02x}")?;
                }
            }
        }
        Ok(())
    }
}

impl From<Frame> for Multipart {
    fn from(frame: Frame) -> Self { Self::from_iter([frame]) }
}

impl From<Vec<Frame>> for Multipart {
    fn from(parts: Vec<Frame>) -> Self {
        Self {
            parts: parts.into(),
        }
    }
}

impl From<VecDeque<Frame>> for Multipart {
    fn from(parts: VecDeque<Frame>) -> Self { Self { parts } }
}

impl<F: Into<Frame>, const N: usize> From<[F; N]> for Multipart {
    fn from(parts: [F; N]) -> Self { parts.into_iter().map(Into::into).collect() }
}

impl FromIterator<Frame> for Multipart {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().collect(),
        }
    }
}

impl Extend<Frame> for Multipart {
    fn extend<I: IntoIterator<Item = Frame>>(&mut self, iter: I) { self.parts.extend(iter); }
}

impl IntoIterator for Multipart {
    type Item = Frame;
    type IntoIter = vec_deque::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter { self.into_frames() }
}

impl<'a> IntoIterator for &'a Multipart {
    type Item = &'a Frame;
    type IntoIter = vec_deque::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}
