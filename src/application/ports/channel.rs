//! Message channel port interface

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::frame::{Frame, FrameError};

/// Outbound send errors. `Ok(())` from [`MessageChannel::send`] means delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// Host side refused the frame (e.g. saturated)
    #[error("Message dropped: {0}")]
    Dropped(String),

    /// Transport failure (e.g. channel not open)
    #[error("Send failed: {0}")]
    Failed(String),

    /// Frame rejected locally before it reached the transport
    #[error("Frame rejected: {0}")]
    Encode(#[from] FrameError),
}

/// Something arriving on the inbound path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A decoded frame from the host
    Frame(Frame),
    /// An inbound message that could not be accepted
    Dropped(String),
}

/// Receiving end of a channel's inbound path, in arrival order
pub type InboundReceiver = mpsc::Receiver<InboundEvent>;

/// Buffer size of inbound queues created by adapters
pub const INBOUND_QUEUE_DEPTH: usize = 8;

/// Port for the bounded message channel to the paired host
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Send one frame and wait for the host's acknowledgement.
    ///
    /// Only one send may be pending; a concurrent call fails with
    /// [`SendError::Failed`]. There is no automatic retry.
    async fn send(&self, frame: &Frame) -> Result<(), SendError>;
}

/// Blanket implementation for boxed channels
#[async_trait]
impl MessageChannel for Box<dyn MessageChannel> {
    async fn send(&self, frame: &Frame) -> Result<(), SendError> {
        self.as_ref().send(frame).await
    }
}
