//! In-process channel to a simulated host

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::ports::{
    InboundEvent, InboundReceiver, MessageChannel, SendError, INBOUND_QUEUE_DEPTH,
};
use crate::application::single_flight::SingleFlight;
use crate::domain::frame::{decode, encode, Frame, MessageKey};
use crate::domain::text::BoundedText;

type SendOutcome = Arc<Mutex<Option<SendError>>>;

/// Device end of a loopback pair.
///
/// Frames pass through the dictionary codec in both directions, so size
/// limits apply exactly as on a real transport.
pub struct LoopbackChannel {
    questions: mpsc::Sender<Frame>,
    outcome: SendOutcome,
    delivered: Arc<AtomicUsize>,
    flight: SingleFlight,
}

/// Host end of a loopback pair
pub struct HostEndpoint {
    questions: mpsc::Receiver<Frame>,
    inbound: mpsc::Sender<InboundEvent>,
    outcome: SendOutcome,
    delivered: Arc<AtomicUsize>,
}

impl LoopbackChannel {
    /// Create a connected channel, its inbound stream and the host end
    pub fn pair() -> (Self, InboundReceiver, HostEndpoint) {
        let (questions_tx, questions_rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_QUEUE_DEPTH);
        let outcome: SendOutcome = Arc::new(Mutex::new(None));
        let delivered = Arc::new(AtomicUsize::new(0));

        let channel = Self {
            questions: questions_tx,
            outcome: Arc::clone(&outcome),
            delivered: Arc::clone(&delivered),
            flight: SingleFlight::new(),
        };
        let host = HostEndpoint {
            questions: questions_rx,
            inbound: inbound_tx,
            outcome,
            delivered,
        };
        (channel, inbound_rx, host)
    }
}

#[async_trait]
impl MessageChannel for LoopbackChannel {
    async fn send(&self, frame: &Frame) -> Result<(), SendError> {
        let _guard = self
            .flight
            .try_begin()
            .ok_or_else(|| SendError::Failed("busy".to_string()))?;

        let bytes = encode(frame)?;

        let refusal = self
            .outcome
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(error) = refusal {
            debug!(%error, "loopback host refused frame");
            return Err(error);
        }

        let frame = decode(&bytes)?;
        self.questions
            .send(frame)
            .await
            .map_err(|_| SendError::Failed("not open".to_string()))?;
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl HostEndpoint {
    /// Wait for the next question; `None` once the device end is gone
    pub async fn next_question(&mut self) -> Option<BoundedText> {
        while let Some(frame) = self.questions.recv().await {
            if let Some(question) = frame.get(MessageKey::Question) {
                return Some(question.clone());
            }
        }
        None
    }

    /// Send a frame to the device
    pub async fn reply(&self, frame: Frame) -> Result<(), SendError> {
        let bytes = encode(&frame)?;
        let frame = decode(&bytes)?;
        self.inbound
            .send(InboundEvent::Frame(frame))
            .await
            .map_err(|_| SendError::Failed("not open".to_string()))
    }

    /// Report an inbound message that could not be accepted
    pub async fn drop_inbound(&self, reason: impl Into<String>) {
        let _ = self.inbound.send(InboundEvent::Dropped(reason.into())).await;
    }

    /// Make every following send fail with `error`
    pub fn fail_sends(&self, error: SendError) {
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    /// Accept sends again
    pub fn accept_sends(&self) {
        self.outcome.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    /// Number of questions delivered so far
    pub fn questions_received(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}
