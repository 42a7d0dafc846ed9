//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! and the interactive and one-shot runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{
    init_tracing, load_merged_config, run_interactive, run_oneshot, RunOptions, EXIT_ERROR,
    EXIT_SUCCESS, EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction};
pub use presenter::Presenter;
