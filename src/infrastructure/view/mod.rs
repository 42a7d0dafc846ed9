//! View surface adapters

mod console;
mod memory;
mod spinner;

pub use console::{
    format_status, wrap, ConsoleControlSurface, ConsoleResponseSurface, DEFAULT_RESPONSE_WIDTH,
};
pub use memory::{MemoryView, ViewSnapshot};
pub use spinner::SpinnerControlSurface;
