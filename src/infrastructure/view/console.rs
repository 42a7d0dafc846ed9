//! Terminal view surfaces for interactive mode

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use colored::*;

use crate::application::ports::{ControlSurface, ResponseSurface, TriggerIcon, ViewError};

/// Column width of the response surface
pub const DEFAULT_RESPONSE_WIDTH: usize = 36;

/// Status line printed to stderr
pub struct ConsoleControlSurface {
    glyphs: bool,
    icon: Mutex<Option<TriggerIcon>>,
}

impl ConsoleControlSurface {
    /// Create a control surface, detecting glyph support from `TERM`
    pub fn new() -> Self {
        let glyphs = std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false);
        Self::with_glyphs(glyphs)
    }

    /// Create with explicit glyph support
    pub fn with_glyphs(glyphs: bool) -> Self {
        Self {
            glyphs,
            icon: Mutex::new(None),
        }
    }

    fn icon(&self) -> Option<TriggerIcon> {
        *self.icon.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ConsoleControlSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSurface for ConsoleControlSurface {
    fn set_status(&self, text: &str) {
        eprintln!("{}", format_status(text, self.icon()));
    }

    fn set_trigger_icon(&self, icon: TriggerIcon) -> Result<(), ViewError> {
        if !self.glyphs {
            return Err(ViewError::IconUnavailable(
                "terminal cannot draw glyphs".to_string(),
            ));
        }
        *self.icon.lock().unwrap_or_else(|e| e.into_inner()) = Some(icon);
        Ok(())
    }
}

/// Format a status line, coloured by what it reports
pub fn format_status(text: &str, icon: Option<TriggerIcon>) -> String {
    let line = text.replace('\n', " ");
    let styled = match text {
        "Ready" => line.green(),
        "Error" | "Send failed" | "Message dropped" | "Timed out" => line.red(),
        "Try again" => line.yellow(),
        _ => line.cyan(),
    };

    match icon {
        Some(icon) => format!("{} {}", icon.glyph(), styled),
        None => format!("{} {}", "●".cyan(), styled),
    }
}

/// Boxed answer printed to stdout.
///
/// `show` draws the box and `hide` closes it; hiding a surface that is not
/// shown does nothing.
pub struct ConsoleResponseSurface {
    width: usize,
    visible: AtomicBool,
}

impl ConsoleResponseSurface {
    /// Create a response surface with the default width
    pub fn new() -> Self {
        Self::with_width(DEFAULT_RESPONSE_WIDTH)
    }

    /// Create with a custom column width
    pub fn with_width(width: usize) -> Self {
        Self {
            width: width.max(8),
            visible: AtomicBool::new(false),
        }
    }

    /// Check if the surface is shown
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl Default for ConsoleResponseSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSurface for ConsoleResponseSurface {
    fn show(&self, text: &str) {
        if self.visible.swap(true, Ordering::SeqCst) {
            println!("{}", "└".dimmed());
        }
        println!("{}", "┌ Answer".bold());
        for line in wrap(text, self.width) {
            println!("{} {}", "│".dimmed(), line);
        }
        println!("{}", "└ b: dismiss".dimmed());
    }

    fn hide(&self) {
        if self.visible.swap(false, Ordering::SeqCst) {
            println!("{}", "(answer dismissed)".dimmed());
        }
    }
}

/// Greedy word wrap at `width` characters; words longer than a line are split
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > width {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
            if needed > width {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line_len += word.len();
            line.extend(word);
        }

        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
