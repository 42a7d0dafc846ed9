//! Cooperative event loop driving the query controller
//!
//! All user input, capture completions, send acknowledgements and inbound
//! frames are funnelled into one queue and applied to the controller one at
//! a time. Capture and send run as spawned tasks that post their completion
//! back to the same queue. When a query ends or times out, the task still
//! running for it is aborted so the adapter is free for the next one.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::query::QueryState;
use crate::domain::time::Duration;

use super::controller::{Effect, QueryController, QueryEvent};
use super::ports::{
    ControlSurface, InboundEvent, InboundReceiver, MessageChannel, ResponseSurface,
    TranscriptSource,
};

/// Depth of the event queue
const EVENT_QUEUE_DEPTH: usize = 32;

/// Events accepted by the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    /// Forward to the controller
    Query(QueryEvent),
    /// Stop the loop
    Shutdown,
}

impl From<QueryEvent> for LoopEvent {
    fn from(event: QueryEvent) -> Self {
        Self::Query(event)
    }
}

/// Event loop settings
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Time a query may stay in flight; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Whether to decorate the trigger with an icon
    pub icons: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::default_query_timeout()),
            icons: true,
        }
    }
}

enum Wake {
    Event(Option<LoopEvent>),
    Inbound(Option<InboundEvent>),
    Deadline,
}

/// Owns the controller, the transcript source and the channel handle
pub struct EventLoop<T, M, C, R>
where
    T: TranscriptSource + 'static,
    M: MessageChannel + 'static,
    C: ControlSurface,
    R: ResponseSurface,
{
    controller: QueryController<C, R>,
    transcripts: Arc<T>,
    channel: Arc<M>,
    inbound: Option<InboundReceiver>,
    events_tx: mpsc::Sender<LoopEvent>,
    events_rx: mpsc::Receiver<LoopEvent>,
    config: LoopConfig,
    deadline: Option<Instant>,
    in_flight: Option<AbortHandle>,
}

impl<T, M, C, R> EventLoop<T, M, C, R>
where
    T: TranscriptSource + 'static,
    M: MessageChannel + 'static,
    C: ControlSurface,
    R: ResponseSurface,
{
    /// Create a new event loop
    pub fn new(
        controller: QueryController<C, R>,
        transcripts: T,
        channel: M,
        inbound: InboundReceiver,
        config: LoopConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        Self {
            controller,
            transcripts: Arc::new(transcripts),
            channel: Arc::new(channel),
            inbound: Some(inbound),
            events_tx,
            events_rx,
            config,
            deadline: None,
            in_flight: None,
        }
    }

    /// Sender for user input and shutdown requests
    pub fn sender(&self) -> mpsc::Sender<LoopEvent> {
        self.events_tx.clone()
    }

    /// Get the controller
    pub fn controller(&self) -> &QueryController<C, R> {
        &self.controller
    }

    /// Run until a [`LoopEvent::Shutdown`] arrives, then hand the controller back
    pub async fn run(mut self) -> QueryController<C, R> {
        self.controller.load(self.config.icons);

        while let Some(event) = self.next_event().await {
            match event {
                LoopEvent::Query(event) => self.dispatch(event),
                LoopEvent::Shutdown => {
                    info!(state = %self.controller.state(), "event loop shutting down");
                    break;
                }
            }
        }

        self.cancel_in_flight();
        self.controller
    }

    /// Trigger one query and run until it has finished
    pub async fn run_single(mut self) -> QueryController<C, R> {
        self.controller.load(self.config.icons);
        self.dispatch(QueryEvent::Trigger);

        while self.controller.state() != QueryState::Idle {
            match self.next_event().await {
                Some(LoopEvent::Query(event)) => self.dispatch(event),
                Some(LoopEvent::Shutdown) | None => break,
            }
        }

        self.cancel_in_flight();
        self.controller
    }

    async fn next_event(&mut self) -> Option<LoopEvent> {
        loop {
            // Inbound waits while a send is unconfirmed; the host's ACK
            // precedes anything it sends back
            let accepting = self.controller.state() != QueryState::Sending;
            let wake = tokio::select! {
                event = self.events_rx.recv() => Wake::Event(event),
                inbound = recv_inbound(&mut self.inbound), if accepting => Wake::Inbound(inbound),
                _ = sleep_until(self.deadline) => Wake::Deadline,
            };

            match wake {
                Wake::Event(event) => return event,
                Wake::Inbound(Some(inbound)) => {
                    return Some(LoopEvent::Query(QueryEvent::Inbound(inbound)))
                }
                Wake::Inbound(None) => {
                    warn!("host channel closed, no further answers will arrive");
                    self.inbound = None;
                    return Some(LoopEvent::Query(QueryEvent::InboundClosed));
                }
                Wake::Deadline => {
                    self.deadline = None;
                    return Some(LoopEvent::Query(QueryEvent::TimedOut));
                }
            }
        }
    }

    fn dispatch(&mut self, event: QueryEvent) {
        if let Some(effect) = self.controller.handle(event) {
            self.spawn_effect(effect);
        }

        if self.controller.state() == QueryState::Idle {
            self.deadline = None;
            self.cancel_in_flight();
        } else if self.deadline.is_none() {
            self.deadline = self
                .config
                .timeout
                .map(|timeout| Instant::now() + timeout.as_std());
        }
    }

    /// Abort a capture or send the controller no longer waits for, releasing
    /// the adapter for the next query
    fn cancel_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            if !task.is_finished() {
                debug!("abandoning in-flight operation");
                task.abort();
            }
        }
    }

    fn spawn_effect(&mut self, effect: Effect) {
        let tx = self.events_tx.clone();
        let task = match effect {
            Effect::BeginCapture { query, max_bytes } => {
                debug!(%query, max_bytes, "capture started");
                let source = Arc::clone(&self.transcripts);
                tokio::spawn(async move {
                    let result = source.listen(max_bytes).await;
                    let _ = tx
                        .send(QueryEvent::CaptureCompleted { query, result }.into())
                        .await;
                })
            }
            Effect::Send { query, frame } => {
                debug!(%query, "send started");
                let channel = Arc::clone(&self.channel);
                tokio::spawn(async move {
                    let result = channel.send(&frame).await;
                    let _ = tx
                        .send(QueryEvent::SendCompleted { query, result }.into())
                        .await;
                })
            }
        };
        self.in_flight = Some(task.abort_handle());
    }
}

async fn recv_inbound(inbound: &mut Option<InboundReceiver>) -> Option<InboundEvent> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
