//! CLI presenter for output formatting

use colored::*;

/// Presenter for CLI output formatting
#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter;

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (answers and config values)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print the key bindings for interactive mode
    pub fn key_help(&self) {
        eprintln!("{}", format_key_help());
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

/// One-line summary of the interactive key bindings
pub fn format_key_help() -> String {
    format!(
        "{} select (then type your question)   {} back   {} history   {} quit",
        "Enter".bold(),
        "b".bold(),
        "u".bold(),
        "q".bold()
    )
}
