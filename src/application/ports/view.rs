//! View surface port interfaces
//!
//! Both surfaces are passive sinks: the controller pushes text and
//! visibility commands and never reads anything back.

use thiserror::Error;

/// View errors. Only decorative features may fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("Icon unavailable: {0}")]
    IconUnavailable(String),
}

/// Icons the control surface can attach to its trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerIcon {
    Microphone,
}

impl TriggerIcon {
    /// Terminal glyph for the icon
    pub const fn glyph(&self) -> &'static str {
        match self {
            Self::Microphone => "🎤",
        }
    }
}

/// Always-visible surface with status text and the trigger affordance
pub trait ControlSurface: Send {
    /// Replace the status text
    fn set_status(&self, text: &str);

    /// Decorate the trigger. Best effort; failure must not block anything.
    fn set_trigger_icon(&self, icon: TriggerIcon) -> Result<(), ViewError>;
}

/// Scrollable surface showing the latest answer.
///
/// `show` sets the surface up with its text and `hide` tears it down; the
/// pair is the surface's whole lifetime.
pub trait ResponseSurface: Send {
    /// Set the surface up and display `text`
    fn show(&self, text: &str);

    /// Tear the surface down. No-op if it is not shown.
    fn hide(&self);
}

impl ControlSurface for Box<dyn ControlSurface> {
    fn set_status(&self, text: &str) {
        self.as_ref().set_status(text)
    }

    fn set_trigger_icon(&self, icon: TriggerIcon) -> Result<(), ViewError> {
        self.as_ref().set_trigger_icon(icon)
    }
}

impl ResponseSurface for Box<dyn ResponseSurface> {
    fn show(&self, text: &str) {
        self.as_ref().show(text)
    }

    fn hide(&self) {
        self.as_ref().hide()
    }
}
