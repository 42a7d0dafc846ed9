//! Domain layer - Core business logic
//!
//! Contains value objects, the query state machine, the frame codec and
//! domain errors. This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod frame;
pub mod query;
pub mod text;
pub mod time;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use frame::{Frame, FrameError, InboundPayload, MessageKey};
pub use query::{QueryId, QueryOutcome, QuerySession, QueryState, StatusMessage};
pub use text::{BoundedText, MAX_TEXT_BYTES};
pub use time::Duration;
