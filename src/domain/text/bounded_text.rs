//! Bounded text value object

use std::fmt;
use std::ops::Deref;

/// Capacity in bytes of every transcript, response and error buffer.
///
/// A single text field plus its dictionary overhead always fits inside
/// [`MAX_FRAME_BYTES`](crate::domain::frame::MAX_FRAME_BYTES).
pub const MAX_TEXT_BYTES: usize = 500;

/// Return the longest prefix of `s` that is at most `max_bytes` long and
/// ends on a UTF-8 character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// UTF-8 text that never exceeds [`MAX_TEXT_BYTES`].
///
/// Construction truncates instead of failing, so holding a `BoundedText`
/// is proof the buffer bound holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundedText {
    text: String,
    truncated: bool,
}

impl BoundedText {
    /// Create bounded text, truncating to [`MAX_TEXT_BYTES`]
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_limit(text, MAX_TEXT_BYTES)
    }

    /// Create bounded text, truncating to `limit` (itself capped at [`MAX_TEXT_BYTES`])
    pub fn with_limit(text: impl Into<String>, limit: usize) -> Self {
        let mut text = text.into();
        let limit = limit.min(MAX_TEXT_BYTES);
        let kept = truncate_str(&text, limit).len();
        let truncated = kept < text.len();
        text.truncate(kept);
        Self { text, truncated }
    }

    /// Get the text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether input was cut to fit the bound
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// Consume into the inner string
    pub fn into_string(self) -> String {
        self.text
    }
}

impl Deref for BoundedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for BoundedText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for BoundedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for BoundedText {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BoundedText {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_kept() {
        let text = BoundedText::new("what is the weather");
        assert_eq!(text.as_str(), "what is the weather");
        assert!(!text.was_truncated());
    }

    #[test]
    fn long_text_is_truncated_to_capacity() {
        let text = BoundedText::new("a".repeat(MAX_TEXT_BYTES + 40));
        assert_eq!(text.len(), MAX_TEXT_BYTES);
        assert!(text.was_truncated());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // "é" is two bytes; a 3 byte limit must not split the second one
        let text = BoundedText::with_limit("éé", 3);
        assert_eq!(text.as_str(), "é");
        assert!(text.was_truncated());
    }

    #[test]
    fn with_limit_never_exceeds_capacity() {
        let text = BoundedText::with_limit("x".repeat(2000), 4096);
        assert_eq!(text.len(), MAX_TEXT_BYTES);
    }

    #[test]
    fn exact_fit_is_not_truncated() {
        let text = BoundedText::with_limit("abcd", 4);
        assert_eq!(text.as_str(), "abcd");
        assert!(!text.was_truncated());
    }

    #[test]
    fn truncate_str_multibyte() {
        assert_eq!(truncate_str("日本語", 4), "日");
        assert_eq!(truncate_str("日本語", 0), "");
        assert_eq!(truncate_str("abc", 10), "abc");
    }
}
