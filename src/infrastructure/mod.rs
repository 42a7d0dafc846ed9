//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces: the XDG config
//! store, transcript sources, host channels and view surfaces.

pub mod channel;
pub mod config;
pub mod transcript;
pub mod view;

// Re-export adapters
pub use channel::{HostEndpoint, LoopbackChannel};
#[cfg(unix)]
pub use channel::UnixSocketChannel;
pub use config::XdgConfigStore;
pub use transcript::{LineRouter, ScriptedTranscript, TerminalDictation};
pub use view::{ConsoleControlSurface, ConsoleResponseSurface, MemoryView, SpinnerControlSurface};
