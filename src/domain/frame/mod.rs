//! Channel frame domain module

mod dictionary;
mod message;

pub use dictionary::{decode, encode, encoded_len, FrameError, MAX_FRAME_BYTES};
pub use message::{Frame, InboundPayload, MessageKey};
