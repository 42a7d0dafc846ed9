//! Channel frame value object

use std::fmt;

use crate::domain::text::BoundedText;

/// Well-known dictionary keys shared with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKey {
    /// Outbound transcript text
    Question,
    /// Inbound answer text
    Response,
    /// Inbound host error text
    Error,
}

impl MessageKey {
    /// All keys, in wire order
    pub const ALL: [MessageKey; 3] = [Self::Question, Self::Response, Self::Error];

    /// Numeric identifier on the wire
    pub const fn id(&self) -> u32 {
        match self {
            Self::Question => 0,
            Self::Response => 1,
            Self::Error => 2,
        }
    }

    /// Look up a key by its numeric identifier
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::Question),
            1 => Some(Self::Response),
            2 => Some(Self::Error),
            _ => None,
        }
    }

    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "QUESTION",
            Self::Response => "RESPONSE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an inbound frame asks the controller to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    Response(BoundedText),
    Error(BoundedText),
}

/// A dictionary record exchanged with the host.
///
/// Holds at most one value per well-known key. Outbound frames carry only
/// `QUESTION`; inbound frames are expected to carry exactly one of
/// `RESPONSE`/`ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    question: Option<BoundedText>,
    response: Option<BoundedText>,
    error: Option<BoundedText>,
}

impl Frame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Outbound frame carrying a question
    pub fn question(text: impl Into<BoundedText>) -> Self {
        Self::new().with(MessageKey::Question, text)
    }

    /// Inbound frame carrying an answer
    pub fn response(text: impl Into<BoundedText>) -> Self {
        Self::new().with(MessageKey::Response, text)
    }

    /// Inbound frame carrying a host error
    pub fn error(text: impl Into<BoundedText>) -> Self {
        Self::new().with(MessageKey::Error, text)
    }

    /// Builder-style setter
    pub fn with(mut self, key: MessageKey, text: impl Into<BoundedText>) -> Self {
        self.set(key, text);
        self
    }

    /// Set the value for a key, replacing any previous one
    pub fn set(&mut self, key: MessageKey, text: impl Into<BoundedText>) {
        *self.slot_mut(key) = Some(text.into());
    }

    /// Get the value for a key
    pub fn get(&self, key: MessageKey) -> Option<&BoundedText> {
        match key {
            MessageKey::Question => self.question.as_ref(),
            MessageKey::Response => self.response.as_ref(),
            MessageKey::Error => self.error.as_ref(),
        }
    }

    /// Present fields in wire order
    pub fn fields(&self) -> impl Iterator<Item = (MessageKey, &BoundedText)> {
        MessageKey::ALL
            .into_iter()
            .filter_map(move |key| self.get(key).map(|text| (key, text)))
    }

    /// Check if no field is set
    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Classify an inbound frame. `ERROR` takes precedence over `RESPONSE`.
    pub fn inbound(&self) -> Option<InboundPayload> {
        if let Some(error) = &self.error {
            return Some(InboundPayload::Error(error.clone()));
        }
        self.response
            .as_ref()
            .map(|response| InboundPayload::Response(response.clone()))
    }

    fn slot_mut(&mut self, key: MessageKey) -> &mut Option<BoundedText> {
        match key {
            MessageKey::Question => &mut self.question,
            MessageKey::Response => &mut self.response,
            MessageKey::Error => &mut self.error,
        }
    }
}
