//! Time domain module

mod duration;

pub use duration::{parse_timeout, Duration, DEFAULT_QUERY_TIMEOUT_SECS};
