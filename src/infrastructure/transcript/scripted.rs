//! Scripted transcript source

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{CaptureError, TranscriptSource};
use crate::application::single_flight::SingleFlight;
use crate::domain::text::BoundedText;
use crate::domain::time::Duration;

/// Plays back a fixed list of capture results, one per session.
///
/// Used for `--ask` and for exercising the controller without a microphone.
/// Once the script is exhausted every session reports no speech.
pub struct ScriptedTranscript {
    script: Mutex<VecDeque<Result<String, CaptureError>>>,
    delay: Option<Duration>,
    flight: SingleFlight,
}

impl ScriptedTranscript {
    /// Create from a list of results
    pub fn new(script: impl IntoIterator<Item = Result<String, CaptureError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            delay: None,
            flight: SingleFlight::new(),
        }
    }

    /// One successful session yielding `text`
    pub fn success(text: impl Into<String>) -> Self {
        Self::new([Ok(text.into())])
    }

    /// One failed session
    pub fn failure(error: CaptureError) -> Self {
        Self::new([Err(error)])
    }

    /// Make every session take `delay` before completing
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sessions left in the script
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next(&self) -> Result<String, CaptureError> {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Err(CaptureError::NoSpeech))
    }
}

#[async_trait]
impl TranscriptSource for ScriptedTranscript {
    async fn listen(&self, max_bytes: usize) -> Result<BoundedText, CaptureError> {
        let _guard = self.flight.try_begin().ok_or(CaptureError::Busy)?;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay.as_std()).await;
        }

        let text = self.next()?;
        if text.trim().is_empty() {
            return Err(CaptureError::NoSpeech);
        }

        let transcript = BoundedText::with_limit(text, max_bytes);
        debug!(bytes = transcript.len(), truncated = transcript.was_truncated(), "scripted transcript");
        Ok(transcript)
    }
}
