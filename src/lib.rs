//! Wrist Query - voice-query companion for a wearable
//!
//! The user speaks a question, the transcript is sent to a paired host over
//! a size-bounded message channel, and the host's answer is shown on a
//! scrollable response surface.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Query state machine, bounded text, the frame codec and errors
//! - **Application**: Port interfaces (traits), the query controller and its event loop
//! - **Infrastructure**: Adapter implementations (host socket, dictation, views, config)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
