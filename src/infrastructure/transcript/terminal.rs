//! Typed dictation from the terminal
//!
//! Interactive mode has a single input stream. Lines are normally button
//! presses; while a capture session is open the next line is taken as the
//! transcript instead. [`LineRouter`] makes that decision per line.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::debug;

use crate::application::ports::{CaptureError, TranscriptSource};
use crate::application::single_flight::SingleFlight;
use crate::domain::text::BoundedText;

type PendingLine = Arc<Mutex<Option<oneshot::Sender<String>>>>;

fn clear(pending: &PendingLine) -> Option<oneshot::Sender<String>> {
    pending.lock().unwrap_or_else(|e| e.into_inner()).take()
}

/// Open capture session; the slot is cleared when the session ends
struct OpenSession<'a>(&'a PendingLine);

impl Drop for OpenSession<'_> {
    fn drop(&mut self) {
        clear(self.0);
    }
}

/// Device buttons emulated on the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Enter
    Select,
    /// `b`
    Back,
    /// `u`
    Up,
    /// `q`
    Quit,
}

impl Button {
    /// Parse a button line
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" => Some(Self::Select),
            "b" | "back" => Some(Self::Back),
            "u" | "up" => Some(Self::Up),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Where a line of input went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Handed to the open capture session
    Dictation,
    /// A button press
    Button(Button),
    /// Neither a dictation nor a known button
    Unknown(String),
}

/// Splits terminal lines between button presses and dictation
#[derive(Clone)]
pub struct LineRouter {
    pending: PendingLine,
}

impl LineRouter {
    /// Route one line
    pub fn route(&self, line: String) -> Routed {
        let line = match clear(&self.pending) {
            Some(tx) => match tx.send(line) {
                Ok(()) => return Routed::Dictation,
                // Session was abandoned; the line is a button press after all
                Err(line) => line,
            },
            None => line,
        };

        match Button::parse(&line) {
            Some(button) => Routed::Button(button),
            None => Routed::Unknown(line),
        }
    }

    /// Input ended; an open session is cancelled
    pub fn close(&self) {
        clear(&self.pending);
    }
}

/// Transcript source reading the next routed line.
///
/// An empty line cancels the session.
pub struct TerminalDictation {
    pending: PendingLine,
    flight: SingleFlight,
}

impl TerminalDictation {
    /// Create a dictation source and the router feeding it
    pub fn new() -> (Self, LineRouter) {
        let pending: PendingLine = Arc::new(Mutex::new(None));
        let router = LineRouter {
            pending: Arc::clone(&pending),
        };
        let source = Self {
            pending,
            flight: SingleFlight::new(),
        };
        (source, router)
    }
}

#[async_trait]
impl TranscriptSource for TerminalDictation {
    async fn listen(&self, max_bytes: usize) -> Result<BoundedText, CaptureError> {
        let _guard = self.flight.try_begin().ok_or(CaptureError::Busy)?;

        let (tx, rx) = oneshot::channel();
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        let _session = OpenSession(&self.pending);

        let line = rx.await.map_err(|_| CaptureError::Cancelled)?;
        let line = line.trim();
        if line.is_empty() {
            debug!("dictation cancelled with an empty line");
            return Err(CaptureError::Cancelled);
        }

        Ok(BoundedText::with_limit(line, max_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text::MAX_TEXT_BYTES;

    #[test]
    fn buttons_parse() {
        assert_eq!(Button::parse(""), Some(Button::Select));
        assert_eq!(Button::parse("  B "), Some(Button::Back));
        assert_eq!(Button::parse("quit"), Some(Button::Quit));
        assert_eq!(Button::parse("u"), Some(Button::Up));
        assert_eq!(Button::parse("hello"), None);
    }

    #[test]
    fn lines_are_buttons_without_session() {
        let (_source, router) = TerminalDictation::new();
        assert_eq!(router.route(String::new()), Routed::Button(Button::Select));
        assert_eq!(
            router.route("what".to_string()),
            Routed::Unknown("what".to_string())
        );
    }

    #[tokio::test]
    async fn open_session_takes_next_line() {
        let (source, router) = TerminalDictation::new();

        let listen = tokio::spawn(async move { source.listen(MAX_TEXT_BYTES).await });
        tokio::task::yield_now().await;
        while router.pending.lock().unwrap().is_none() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            router.route("  what is the weather ".to_string()),
            Routed::Dictation
        );
        assert_eq!(
            listen.await.unwrap().unwrap().as_str(),
            "what is the weather"
        );

        // Session is over, lines are buttons again
        assert_eq!(router.route("b".to_string()), Routed::Button(Button::Back));
    }

    #[tokio::test]
    async fn empty_line_cancels() {
        let (source, router) = TerminalDictation::new();
        let listen = tokio::spawn(async move { source.listen(MAX_TEXT_BYTES).await });
        while router.pending.lock().unwrap().is_none() {
            tokio::task::yield_now().await;
        }

        assert_eq!(router.route(String::new()), Routed::Dictation);
        assert_eq!(listen.await.unwrap(), Err(CaptureError::Cancelled));
    }

    #[tokio::test]
    async fn closed_input_cancels() {
        let (source, router) = TerminalDictation::new();
        let listen = tokio::spawn(async move { source.listen(MAX_TEXT_BYTES).await });
        while router.pending.lock().unwrap().is_none() {
            tokio::task::yield_now().await;
        }

        router.close();
        assert_eq!(listen.await.unwrap(), Err(CaptureError::Cancelled));
    }

    #[tokio::test]
    async fn abandoned_session_releases_line() {
        let (source, router) = TerminalDictation::new();
        {
            let listen = source.listen(MAX_TEXT_BYTES);
            tokio::pin!(listen);
            assert!(futures_poll_once(listen.as_mut()).await);
        }

        assert!(router.pending.lock().unwrap().is_none());
        assert_eq!(router.route("q".to_string()), Routed::Button(Button::Quit));
        assert!(source.flight.try_begin().is_some());
    }

    /// Poll a future once, returning true if it is still pending
    async fn futures_poll_once<F: std::future::Future + Unpin>(fut: F) -> bool {
        tokio::select! {
            biased;
            _ = fut => false,
            _ = std::future::ready(()) => true,
        }
    }
}
