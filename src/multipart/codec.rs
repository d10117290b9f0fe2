//! Single-buffer encoding of a [`Multipart`].
//!
//! Each part is written as a length prefix followed by its bytes. Lengths
//! below 255 take one byte; longer parts are marked with a `0xFF` byte
//! followed by a 4-byte big-endian length.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use super::Multipart;
use crate::frame::Frame;

const LONG_MARKER: u8 = u8::MAX;

/// Failure encoding or decoding a multipart buffer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A part is too large for a 4-byte length prefix.
    #[error("part of {0} bytes exceeds the 4-byte length prefix")]
    PartTooLarge(usize),
    /// The buffer ended inside a length prefix or part body.
    #[error("buffer truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },
}

/// Encode `message` into one buffer.
///
/// # Errors
///
/// Returns [`CodecError::PartTooLarge`] if a part is longer than
/// `u32::MAX` bytes.
pub fn encode(message: &Multipart) -> Result<Bytes, CodecError> {
    let capacity = message.iter().map(|part| part.len() + 5).sum();
    let mut buf = BytesMut::with_capacity(capacity);
    for part in message {
        let len = part.len();
        if let Ok(short) = u8::try_from(len)
            && short < LONG_MARKER
        {
            buf.put_u8(short);
        } else {
            let long = u32::try_from(len).map_err(|_| CodecError::PartTooLarge(len))?;
            buf.put_u8(LONG_MARKER);
            buf.put_u32(long);
        }
        buf.put_slice(part.data());
    }
    Ok(buf.freeze())
}

/// Decode a buffer produced by [`encode`].
///
/// Parts borrow from `buf` without copying.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] when `buf` ends before a declared part
/// does.
pub fn decode(mut buf: Bytes) -> Result<Multipart, CodecError> {
    let total = buf.len();
    let mut message = Multipart::new();
    while buf.has_remaining() {
        let offset = total - buf.remaining();
        let marker = buf.get_u8();
        let len = if marker == LONG_MARKER {
            if buf.remaining() < 4 {
                return Err(CodecError::Truncated {
                    offset,
                    needed: 4 - buf.remaining(),
                });
            }
            buf.get_u32() as usize
        } else {
            usize::from(marker)
        };
        if buf.remaining() < len {
            return Err(CodecError::Truncated {
                offset,
                needed: len - buf.remaining(),
            });
        }
        message.add(Frame::new(buf.split_to(len)));
    }
    Ok(message)
}
