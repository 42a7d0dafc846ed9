//! Query session state machine

use std::fmt;
use thiserror::Error;

/// Query lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryState {
    #[default]
    Idle,
    Listening,
    Sending,
    WaitingForAnswer,
}

impl QueryState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Sending => "sending",
            Self::WaitingForAnswer => "waiting for answer",
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the last query ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOutcome {
    /// Host answered; response surface shown
    Answered,
    /// Host reported an error
    HostError,
    /// Capture was cancelled or failed
    CaptureFailed,
    /// Host could not accept the question
    SendDropped,
    /// Transport failure while sending
    SendFailed,
    /// The answer was dropped on its way in
    AnswerDropped,
    /// Query timeout elapsed
    TimedOut,
}

impl QueryOutcome {
    /// Whether the query produced an answer
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Answered)
    }

    /// Human-readable summary
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Answered => "Answer received",
            Self::HostError => "Host reported an error",
            Self::CaptureFailed => "No question was captured",
            Self::SendDropped => "Host dropped the question",
            Self::SendFailed => "Question could not be sent",
            Self::AnswerDropped => "Answer was dropped",
            Self::TimedOut => "Timed out waiting for the host",
        }
    }
}

/// Identifies one query; completions for any other id are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(u64);

impl QueryId {
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: QueryState,
    pub action: String,
}

/// Query session entity.
///
/// State machine:
///   IDLE -> LISTENING (begin_listening)
///   LISTENING -> SENDING (capture_succeeded)
///   LISTENING -> IDLE (capture_failed)
///   SENDING -> WAITING (send_delivered)
///   SENDING -> IDLE (send_dropped, send_failed)
///   WAITING -> IDLE (answer_received, error_received, answer_dropped)
///   any but IDLE -> IDLE (time_out)
#[derive(Debug, Default)]
pub struct QuerySession {
    state: QueryState,
    current: Option<QueryId>,
    issued: u64,
    last_outcome: Option<QueryOutcome>,
}

impl QuerySession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Check if currently idle
    pub fn is_idle(&self) -> bool {
        self.state == QueryState::Idle
    }

    /// Id of the in-flight query, if any
    pub fn current_query(&self) -> Option<QueryId> {
        self.current
    }

    /// Check whether `id` is the in-flight query
    pub fn is_current(&self, id: QueryId) -> bool {
        self.current == Some(id)
    }

    /// How the most recent query ended
    pub fn last_outcome(&self) -> Option<QueryOutcome> {
        self.last_outcome
    }

    /// Transition from IDLE to LISTENING, issuing a fresh query id
    pub fn begin_listening(&mut self) -> Result<QueryId, InvalidStateTransition> {
        self.expect(QueryState::Idle, "start a query")?;
        self.issued += 1;
        let id = QueryId(self.issued);
        self.current = Some(id);
        self.state = QueryState::Listening;
        Ok(id)
    }

    /// Transition from LISTENING to SENDING
    pub fn capture_succeeded(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(QueryState::Listening, "accept a transcript")?;
        self.state = QueryState::Sending;
        Ok(())
    }

    /// Transition from LISTENING to IDLE
    pub fn capture_failed(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(QueryState::Listening, "fail a capture")?;
        self.finish(QueryOutcome::CaptureFailed);
        Ok(())
    }

    /// Transition from SENDING to WAITING
    pub fn send_delivered(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(QueryState::Sending, "confirm delivery")?;
        self.state = QueryState::WaitingForAnswer;
        Ok(())
    }

    /// Transition from SENDING to IDLE after the host refused the frame
    pub fn send_dropped(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(QueryState::Sending, "drop a send")?;
        self.finish(QueryOutcome::SendDropped);
        Ok(())
    }

    /// Transition from SENDING to IDLE after a transport failure
    pub fn send_failed(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(QueryState::Sending, "fail a send")?;
        self.finish(QueryOutcome::SendFailed);
        Ok(())
    }

    /// Transition from WAITING to IDLE with an answer
    pub fn answer_received(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(QueryState::WaitingForAnswer, "accept an answer")?;
        self.finish(QueryOutcome::Answered);
        Ok(())
    }

    /// Transition from WAITING to IDLE with a host error
    pub fn error_received(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(QueryState::WaitingForAnswer, "accept a host error")?;
        self.finish(QueryOutcome::HostError);
        Ok(())
    }

    /// Transition from WAITING to IDLE after the answer was dropped
    pub fn answer_dropped(&mut self) -> Result<(), InvalidStateTransition> {
        self.expect(QueryState::WaitingForAnswer, "drop an answer")?;
        self.finish(QueryOutcome::AnswerDropped);
        Ok(())
    }

    /// Abandon the in-flight query
    pub fn time_out(&mut self) -> Result<(), InvalidStateTransition> {
        if self.is_idle() {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "time out".to_string(),
            });
        }
        self.finish(QueryOutcome::TimedOut);
        Ok(())
    }

    fn expect(&self, state: QueryState, action: &str) -> Result<(), InvalidStateTransition> {
        if self.state != state {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        Ok(())
    }

    fn finish(&mut self, outcome: QueryOutcome) {
        self.state = QueryState::Idle;
        self.current = None;
        self.last_outcome = Some(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting_session() -> QuerySession {
        let mut session = QuerySession::new();
        session.begin_listening().unwrap();
        session.capture_succeeded().unwrap();
        session.send_delivered().unwrap();
        session
    }

    #[test]
    fn new_session_is_idle() {
        let session = QuerySession::new();
        assert!(session.is_idle());
        assert_eq!(session.current_query(), None);
        assert_eq!(session.last_outcome(), None);
    }

    #[test]
    fn begin_listening_issues_increasing_ids() {
        let mut session = QuerySession::new();
        let first = session.begin_listening().unwrap();
        assert!(session.is_current(first));
        session.capture_failed().unwrap();

        let second = session.begin_listening().unwrap();
        assert!(second > first);
        assert!(!session.is_current(first));
    }

    #[test]
    fn begin_listening_outside_idle_fails() {
        let mut session = QuerySession::new();
        session.begin_listening().unwrap();

        let err = session.begin_listening().unwrap_err();
        assert_eq!(err.current_state, QueryState::Listening);

        session.capture_succeeded().unwrap();
        let err = session.begin_listening().unwrap_err();
        assert_eq!(err.current_state, QueryState::Sending);

        session.send_delivered().unwrap();
        let err = session.begin_listening().unwrap_err();
        assert_eq!(err.current_state, QueryState::WaitingForAnswer);
    }

    #[test]
    fn capture_failure_returns_to_idle() {
        let mut session = QuerySession::new();
        session.begin_listening().unwrap();
        session.capture_failed().unwrap();
        assert!(session.is_idle());
        assert_eq!(session.last_outcome(), Some(QueryOutcome::CaptureFailed));
    }

    #[test]
    fn send_failures_return_to_idle() {
        let mut session = QuerySession::new();
        session.begin_listening().unwrap();
        session.capture_succeeded().unwrap();
        session.send_dropped().unwrap();
        assert!(session.is_idle());
        assert_eq!(session.last_outcome(), Some(QueryOutcome::SendDropped));

        session.begin_listening().unwrap();
        session.capture_succeeded().unwrap();
        session.send_failed().unwrap();
        assert!(session.is_idle());
        assert_eq!(session.last_outcome(), Some(QueryOutcome::SendFailed));
    }

    #[test]
    fn answer_completes_query() {
        let mut session = waiting_session();
        session.answer_received().unwrap();
        assert!(session.is_idle());
        assert_eq!(session.current_query(), None);
        assert_eq!(session.last_outcome(), Some(QueryOutcome::Answered));
    }

    #[test]
    fn host_error_and_drop_complete_query() {
        let mut session = waiting_session();
        session.error_received().unwrap();
        assert_eq!(session.last_outcome(), Some(QueryOutcome::HostError));

        let mut session = waiting_session();
        session.answer_dropped().unwrap();
        assert_eq!(session.last_outcome(), Some(QueryOutcome::AnswerDropped));
    }

    #[test]
    fn answer_before_delivery_fails() {
        let mut session = QuerySession::new();
        session.begin_listening().unwrap();
        session.capture_succeeded().unwrap();

        let err = session.answer_received().unwrap_err();
        assert_eq!(err.current_state, QueryState::Sending);
    }

    #[test]
    fn time_out_from_any_busy_state() {
        let mut session = QuerySession::new();
        session.begin_listening().unwrap();
        session.time_out().unwrap();
        assert_eq!(session.last_outcome(), Some(QueryOutcome::TimedOut));

        let mut session = waiting_session();
        session.time_out().unwrap();
        assert!(session.is_idle());

        assert!(session.time_out().is_err());
    }

    #[test]
    fn state_display() {
        assert_eq!(QueryState::Idle.to_string(), "idle");
        assert_eq!(QueryState::WaitingForAnswer.to_string(), "waiting for answer");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: QueryState::Sending,
            action: "start a query".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("start a query"));
        assert!(msg.contains("sending"));
    }
}
