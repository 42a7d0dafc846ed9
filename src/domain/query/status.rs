//! Control surface status messages

use std::fmt;

/// Short human-readable status shown on the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusMessage {
    /// Initial prompt
    Prompt,
    Listening,
    Sending,
    Processing,
    Ready,
    TryAgain,
    SendFailed,
    MessageDropped,
    Error,
    TimedOut,
    History,
}

impl StatusMessage {
    /// Text pushed to the control surface
    pub const fn text(&self) -> &'static str {
        match self {
            Self::Prompt => "Press SELECT\nto speak",
            Self::Listening => "Listening...",
            Self::Sending => "Sending...",
            Self::Processing => "Processing...",
            Self::Ready => "Ready",
            Self::TryAgain => "Try again",
            Self::SendFailed => "Send failed",
            Self::MessageDropped => "Message dropped",
            Self::Error => "Error",
            Self::TimedOut => "Timed out",
            Self::History => "History",
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
