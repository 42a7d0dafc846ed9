//! Transcript acquisition port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::text::BoundedText;

/// Capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Capture was cancelled")]
    Cancelled,

    #[error("No speech detected")]
    NoSpeech,

    #[error("Another capture session is already active")]
    Busy,

    #[error("Capture failed: {0}")]
    Failed(String),
}

/// Port for one-shot speech capture.
///
/// Each call is a disposable session. Implementations allow only one
/// outstanding session and answer a concurrent call with [`CaptureError::Busy`].
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Listen for one utterance.
    ///
    /// # Arguments
    /// * `max_bytes` - Cap on the transcript length; longer text is truncated
    ///
    /// # Returns
    /// The transcript or the reason no transcript was produced
    async fn listen(&self, max_bytes: usize) -> Result<BoundedText, CaptureError>;
}

/// Blanket implementation for boxed transcript sources
#[async_trait]
impl TranscriptSource for Box<dyn TranscriptSource> {
    async fn listen(&self, max_bytes: usize) -> Result<BoundedText, CaptureError> {
        self.as_ref().listen(max_bytes).await
    }
}
