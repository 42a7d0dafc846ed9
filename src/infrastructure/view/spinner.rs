//! Spinner control surface for one-shot queries

use std::sync::Mutex;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::ports::{ControlSurface, TriggerIcon, ViewError};
use crate::domain::query::StatusMessage;

/// Shows in-flight statuses on an indicatif spinner and finishes it on the
/// terminal ones.
pub struct SpinnerControlSurface {
    spinner: Mutex<Option<ProgressBar>>,
}

impl SpinnerControlSurface {
    /// Create an idle spinner surface
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn start(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner
    }
}

impl Default for SpinnerControlSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SpinnerControlSurface {
    fn drop(&mut self) {
        let slot = self.spinner.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(spinner) = slot.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Whether a status is reported while a query is still in flight
fn is_progress(text: &str) -> bool {
    [
        StatusMessage::Listening,
        StatusMessage::Sending,
        StatusMessage::Processing,
    ]
    .iter()
    .any(|status| status.text() == text)
}

impl ControlSurface for SpinnerControlSurface {
    fn set_status(&self, text: &str) {
        let mut slot = self.spinner.lock().unwrap_or_else(|e| e.into_inner());

        if is_progress(text) {
            match slot.as_ref() {
                Some(spinner) => spinner.set_message(text.to_string()),
                None => *slot = Some(Self::start(text)),
            }
            return;
        }

        // Prompt and outcomes end the spinner
        if let Some(spinner) = slot.take() {
            if text == StatusMessage::Ready.text() {
                spinner.finish_with_message(format!("{} {}", "✓".green(), text));
            } else {
                spinner.finish_with_message(format!("{} {}", "✗".red(), text));
            }
        }
    }

    fn set_trigger_icon(&self, _icon: TriggerIcon) -> Result<(), ViewError> {
        Err(ViewError::IconUnavailable(
            "one-shot mode has no trigger".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_statuses() {
        assert!(is_progress("Listening..."));
        assert!(is_progress("Processing..."));
        assert!(!is_progress("Ready"));
        assert!(!is_progress("Send failed"));
    }

    #[test]
    fn spinner_starts_and_finishes() {
        let surface = SpinnerControlSurface::new();
        surface.set_status("Prompt that ends nothing");
        assert!(surface.spinner.lock().unwrap().is_none());

        surface.set_status("Listening...");
        assert!(surface.spinner.lock().unwrap().is_some());
        surface.set_status("Sending...");
        assert!(surface.spinner.lock().unwrap().is_some());

        surface.set_status("Ready");
        assert!(surface.spinner.lock().unwrap().is_none());
    }
}
