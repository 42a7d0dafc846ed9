//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod channel;
pub mod config;
pub mod transcript;
pub mod view;

// Re-export common types
pub use channel::{InboundEvent, InboundReceiver, MessageChannel, SendError, INBOUND_QUEUE_DEPTH};
pub use config::ConfigStore;
pub use transcript::{CaptureError, TranscriptSource};
pub use view::{ControlSurface, ResponseSurface, TriggerIcon, ViewError};
