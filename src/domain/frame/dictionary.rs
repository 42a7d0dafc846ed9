//! Dictionary codec for channel frames
//!
//! Layout: `u8` tuple count, then per tuple a `u32` LE key, a `u8` type,
//! a `u16` LE length and `length` data bytes. Text values are NUL-terminated
//! C strings. Keys this side does not know are skipped on decode.

use thiserror::Error;

use super::message::{Frame, MessageKey};
use crate::domain::text::BoundedText;

/// Largest encoded frame accepted in either direction
pub const MAX_FRAME_BYTES: usize = 512;

const TUPLE_HEADER_BYTES: usize = 7;

/// Tuple value types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TupleType {
    ByteArray,
    CString,
    Uint,
    Int,
}

impl TupleType {
    const fn id(&self) -> u8 {
        match self {
            Self::ByteArray => 0,
            Self::CString => 1,
            Self::Uint => 2,
            Self::Int => 3,
        }
    }

    const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::ByteArray),
            1 => Some(Self::CString),
            2 => Some(Self::Uint),
            3 => Some(Self::Int),
            _ => None,
        }
    }
}

/// Frame encode/decode errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Frame is {size} bytes, exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Frame ended early while reading {0}")]
    Truncated(&'static str),

    #[error("Unknown tuple type {0}")]
    UnknownType(u8),

    #[error("Field {key} must be a string (got type {type_id})")]
    UnexpectedType { key: MessageKey, type_id: u8 },

    #[error("{0} unexpected bytes after the last tuple")]
    TrailingBytes(usize),
}

/// Size of the encoded form of `frame`
pub fn encoded_len(frame: &Frame) -> usize {
    1 + frame
        .fields()
        .map(|(_, text)| TUPLE_HEADER_BYTES + text.len() + 1)
        .sum::<usize>()
}

/// Encode a frame. Frames over [`MAX_FRAME_BYTES`] are rejected, never truncated.
pub fn encode(frame: &Frame) -> Result<Vec<u8>, FrameError> {
    let size = encoded_len(frame);
    if size > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge {
            size,
            limit: MAX_FRAME_BYTES,
        });
    }

    let mut buf = Vec::with_capacity(size);
    buf.push(frame.fields().count() as u8);
    for (key, text) in frame.fields() {
        // Bounded by MAX_FRAME_BYTES above, so the length fits in u16
        let len = (text.len() + 1) as u16;
        buf.extend_from_slice(&key.id().to_le_bytes());
        buf.push(TupleType::CString.id());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(text.as_bytes());
        buf.push(0);
    }
    Ok(buf)
}

/// Decode a frame
pub fn decode(bytes: &[u8]) -> Result<Frame, FrameError> {
    if bytes.len() > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge {
            size: bytes.len(),
            limit: MAX_FRAME_BYTES,
        });
    }

    let mut reader = Reader::new(bytes);
    let count = reader.u8("tuple count")?;
    let mut frame = Frame::new();

    for _ in 0..count {
        let key_id = u32::from_le_bytes(reader.array("tuple key")?);
        let type_id = reader.u8("tuple type")?;
        let len = u16::from_le_bytes(reader.array("tuple length")?) as usize;
        let data = reader.take(len, "tuple data")?;

        let Some(key) = MessageKey::from_id(key_id) else {
            continue;
        };
        match TupleType::from_id(type_id) {
            Some(TupleType::CString) => {}
            Some(_) => return Err(FrameError::UnexpectedType { key, type_id }),
            None => return Err(FrameError::UnknownType(type_id)),
        }

        // Invalid sequences decode as U+FFFD
        let text = data.split(|b| *b == 0).next().unwrap_or_default();
        frame.set(key, BoundedText::new(String::from_utf8_lossy(text)));
    }

    match reader.remaining() {
        0 => Ok(frame),
        n => Err(FrameError::TrailingBytes(n)),
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], FrameError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(FrameError::Truncated(what))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], FrameError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, FrameError> {
        Ok(self.take(1, what)?[0])
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}
