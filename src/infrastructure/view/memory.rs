//! In-memory view surfaces for headless runs and tests

use std::sync::{Arc, Mutex, MutexGuard};

use crate::application::ports::{ControlSurface, ResponseSurface, TriggerIcon, ViewError};

/// Everything the surfaces currently display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub status: String,
    pub icon: Option<TriggerIcon>,
    pub response_visible: bool,
    pub response_text: Option<String>,
    /// Every status set, oldest first
    pub status_history: Vec<String>,
    /// How many times the response surface was set up
    pub shows: usize,
}

/// Records what the controller pushes instead of drawing it.
///
/// Clones share state, so one clone can serve as both surfaces while
/// another is kept for inspection.
#[derive(Debug, Clone)]
pub struct MemoryView {
    state: Arc<Mutex<ViewSnapshot>>,
    icons_available: bool,
}

impl MemoryView {
    /// Create a view that accepts icons
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewSnapshot::default())),
            icons_available: true,
        }
    }

    /// Create a view whose icon resource is missing
    pub fn without_icons() -> Self {
        Self {
            icons_available: false,
            ..Self::new()
        }
    }

    /// Copy of the current view state
    pub fn snapshot(&self) -> ViewSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ViewSnapshot> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryView {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSurface for MemoryView {
    fn set_status(&self, text: &str) {
        let mut state = self.lock();
        state.status = text.to_string();
        state.status_history.push(text.to_string());
    }

    fn set_trigger_icon(&self, icon: TriggerIcon) -> Result<(), ViewError> {
        if !self.icons_available {
            return Err(ViewError::IconUnavailable("no icon resources".to_string()));
        }
        self.lock().icon = Some(icon);
        Ok(())
    }
}

impl ResponseSurface for MemoryView {
    fn show(&self, text: &str) {
        let mut state = self.lock();
        state.response_visible = true;
        state.response_text = Some(text.to_string());
        state.shows += 1;
    }

    fn hide(&self) {
        let mut state = self.lock();
        state.response_visible = false;
        state.response_text = None;
    }
}
