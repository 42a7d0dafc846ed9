//! Query lifecycle controller
//!
//! Reacts to one event at a time, pushes text to the view surfaces and
//! returns the next asynchronous operation to start, if any. It never waits
//! on anything itself; the event loop runs the returned [`Effect`] and feeds
//! its completion back in as another [`QueryEvent`].

use tracing::{debug, info, warn};

use crate::domain::frame::{Frame, InboundPayload};
use crate::domain::query::{QueryId, QueryOutcome, QuerySession, QueryState, StatusMessage};
use crate::domain::text::{BoundedText, MAX_TEXT_BYTES};

use super::ports::{
    CaptureError, ControlSurface, InboundEvent, ResponseSurface, SendError, TriggerIcon,
};

/// Everything the controller reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    /// User pressed the trigger
    Trigger,
    /// A capture session finished
    CaptureCompleted {
        query: QueryId,
        result: Result<BoundedText, CaptureError>,
    },
    /// An outbound send was acknowledged or failed
    SendCompleted {
        query: QueryId,
        result: Result<(), SendError>,
    },
    /// Something arrived from the host
    Inbound(InboundEvent),
    /// The host will send nothing more
    InboundClosed,
    /// The in-flight query ran out of time
    TimedOut,
    /// User dismissed the response surface
    ResponseDismissed,
    /// User pressed UP
    HistoryRequested,
}

/// Asynchronous work the controller asks the event loop to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    BeginCapture { query: QueryId, max_bytes: usize },
    Send { query: QueryId, frame: Frame },
}

/// Single-flight query state machine bound to its two view surfaces
pub struct QueryController<C, R>
where
    C: ControlSurface,
    R: ResponseSurface,
{
    session: QuerySession,
    control: C,
    response: R,
    last_response: Option<BoundedText>,
    last_error: Option<BoundedText>,
}

impl<C, R> QueryController<C, R>
where
    C: ControlSurface,
    R: ResponseSurface,
{
    /// Create a controller in idle state
    pub fn new(control: C, response: R) -> Self {
        Self {
            session: QuerySession::new(),
            control,
            response,
            last_response: None,
            last_error: None,
        }
    }

    /// Put the control surface in its initial state
    pub fn load(&self, icons: bool) {
        if icons {
            if let Err(e) = self.control.set_trigger_icon(TriggerIcon::Microphone) {
                debug!(error = %e, "trigger icon unavailable, continuing without it");
            }
        }
        self.status(StatusMessage::Prompt);
    }

    /// Get the current state
    pub fn state(&self) -> QueryState {
        self.session.state()
    }

    /// Id of the in-flight query, if any
    pub fn current_query(&self) -> Option<QueryId> {
        self.session.current_query()
    }

    /// How the most recent query ended
    pub fn last_outcome(&self) -> Option<QueryOutcome> {
        self.session.last_outcome()
    }

    /// Text of the last answer shown
    pub fn last_response(&self) -> Option<&BoundedText> {
        self.last_response.as_ref()
    }

    /// Last host error, formatted as `Error: <text>`
    pub fn last_error(&self) -> Option<&BoundedText> {
        self.last_error.as_ref()
    }

    /// Apply one event
    pub fn handle(&mut self, event: QueryEvent) -> Option<Effect> {
        match event {
            QueryEvent::Trigger => self.on_trigger(),
            QueryEvent::CaptureCompleted { query, result } => {
                self.on_capture_completed(query, result)
            }
            QueryEvent::SendCompleted { query, result } => {
                self.on_send_completed(query, result);
                None
            }
            QueryEvent::Inbound(inbound) => {
                self.on_inbound(inbound);
                None
            }
            QueryEvent::InboundClosed => {
                self.on_inbound_closed();
                None
            }
            QueryEvent::TimedOut => {
                self.on_timeout();
                None
            }
            QueryEvent::ResponseDismissed => {
                self.response.hide();
                None
            }
            QueryEvent::HistoryRequested => {
                if self.session.is_idle() {
                    self.status(StatusMessage::History);
                } else {
                    debug!(state = %self.state(), "history ignored while a query is in flight");
                }
                None
            }
        }
    }

    fn on_trigger(&mut self) -> Option<Effect> {
        match self.session.begin_listening() {
            Ok(query) => {
                info!(%query, "query started");
                self.status(StatusMessage::Listening);
                Some(Effect::BeginCapture {
                    query,
                    max_bytes: MAX_TEXT_BYTES,
                })
            }
            Err(e) => {
                warn!(error = %e, "trigger ignored, a query is already in flight");
                None
            }
        }
    }

    fn on_capture_completed(
        &mut self,
        query: QueryId,
        result: Result<BoundedText, CaptureError>,
    ) -> Option<Effect> {
        if !self.is_expected(query, QueryState::Listening, "capture result") {
            return None;
        }

        match result {
            Ok(transcript) => {
                if transcript.was_truncated() {
                    debug!(%query, bytes = transcript.len(), "transcript truncated to capacity");
                }
                self.session.capture_succeeded().ok()?;
                self.status(StatusMessage::Sending);
                Some(Effect::Send {
                    query,
                    frame: Frame::question(transcript),
                })
            }
            Err(e) => {
                info!(%query, error = %e, "capture did not produce a transcript");
                self.session.capture_failed().ok()?;
                self.status(StatusMessage::TryAgain);
                None
            }
        }
    }

    fn on_send_completed(&mut self, query: QueryId, result: Result<(), SendError>) {
        if !self.is_expected(query, QueryState::Sending, "send result") {
            return;
        }

        let transition = match result {
            Ok(()) => self
                .session
                .send_delivered()
                .map(|_| StatusMessage::Processing),
            Err(SendError::Dropped(reason)) => {
                warn!(%query, %reason, "host dropped the question");
                self.session
                    .send_dropped()
                    .map(|_| StatusMessage::MessageDropped)
            }
            Err(e) => {
                warn!(%query, error = %e, "question could not be sent");
                self.session.send_failed().map(|_| StatusMessage::SendFailed)
            }
        };

        if let Ok(status) = transition {
            self.status(status);
        }
    }

    fn on_inbound(&mut self, inbound: InboundEvent) {
        match (self.state(), inbound) {
            (QueryState::WaitingForAnswer, InboundEvent::Frame(frame)) => self.on_answer(&frame),
            // The host answers only what it received, so the ACK is still in transit
            (QueryState::Sending, InboundEvent::Frame(frame)) if frame.inbound().is_some() => {
                debug!("answer arrived ahead of the delivery acknowledgement");
                if self.session.send_delivered().is_ok() {
                    self.status(StatusMessage::Processing);
                    self.on_answer(&frame);
                }
            }
            (QueryState::WaitingForAnswer, InboundEvent::Dropped(reason)) => {
                warn!(%reason, "answer dropped on the inbound path");
                if self.session.answer_dropped().is_ok() {
                    self.status(StatusMessage::MessageDropped);
                }
            }
            (state, inbound) => {
                debug!(%state, ?inbound, "inbound message with no waiting query ignored");
            }
        }
    }

    fn on_answer(&mut self, frame: &Frame) {
        match frame.inbound() {
            Some(InboundPayload::Error(text)) => {
                if self.session.error_received().is_ok() {
                    info!(error = %text, "host reported an error");
                    self.last_error = Some(BoundedText::new(format!("Error: {}", text)));
                    self.status(StatusMessage::Error);
                }
            }
            Some(InboundPayload::Response(text)) => {
                if self.session.answer_received().is_ok() {
                    info!(bytes = text.len(), "answer received");
                    self.response.show(&text);
                    self.last_response = Some(text);
                    self.status(StatusMessage::Ready);
                }
            }
            None => {
                debug!(?frame, "frame without response or error ignored");
            }
        }
    }

    fn on_inbound_closed(&mut self) {
        if self.state() != QueryState::WaitingForAnswer {
            return;
        }
        warn!("host channel closed before the answer arrived");
        if self.session.answer_dropped().is_ok() {
            self.status(StatusMessage::MessageDropped);
        }
    }

    fn on_timeout(&mut self) {
        let state = self.state();
        if self.session.time_out().is_ok() {
            warn!(%state, "query timed out");
            self.status(StatusMessage::TimedOut);
        }
    }

    /// Check that a completion belongs to the in-flight query and stage
    fn is_expected(&self, query: QueryId, stage: QueryState, what: &str) -> bool {
        if !self.session.is_current(query) || self.state() != stage {
            debug!(%query, state = %self.state(), "stale {} ignored", what);
            return false;
        }
        true
    }

    fn status(&self, message: StatusMessage) {
        self.control.set_status(message.text());
    }
}
