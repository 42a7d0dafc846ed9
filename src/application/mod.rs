//! Application layer - Use cases and port interfaces
//!
//! Contains the query controller, the event loop that drives it and
//! the trait definitions for external system interactions.

pub mod controller;
pub mod event_loop;
pub mod ports;
pub mod single_flight;

// Re-export use cases
pub use controller::{Effect, QueryController, QueryEvent};
pub use event_loop::{EventLoop, LoopConfig, LoopEvent};
pub use single_flight::{SingleFlight, SingleFlightGuard};
