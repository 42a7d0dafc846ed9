//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

/// Wrist Query - ask a question, get an answer on your wrist
#[derive(Parser, Debug)]
#[command(name = "wrist-query")]
#[command(version)]
#[command(about = "Voice-query companion: speak a question, send it to the paired host, read the answer")]
#[command(long_about = None)]
pub struct Cli {
    /// Ask one question with this text instead of dictating, print the answer and exit
    #[arg(short = 'a', long, value_name = "TEXT")]
    pub ask: Option<String>,

    /// Path of the host socket
    #[arg(short = 's', long, value_name = "PATH")]
    pub socket: Option<String>,

    /// Give up on a query after this long (e.g., 30s, 1m, off)
    #[arg(short = 't', long, value_name = "TIME")]
    pub timeout: Option<String>,

    /// Do not draw the trigger icon
    #[arg(long)]
    pub no_icons: bool,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["host_socket", "timeout", "log_level", "icons"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
