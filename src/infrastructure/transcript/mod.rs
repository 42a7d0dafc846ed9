//! Transcript source adapters

mod scripted;
mod terminal;

pub use scripted::ScriptedTranscript;
pub use terminal::{Button, LineRouter, Routed, TerminalDictation};
