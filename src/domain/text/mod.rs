//! Bounded text domain module

mod bounded_text;

pub use bounded_text::{truncate_str, BoundedText, MAX_TEXT_BYTES};
