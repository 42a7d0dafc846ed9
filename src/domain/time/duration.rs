//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default time a query may stay in flight before it is abandoned (60 seconds)
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// Value object representing a time duration.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Default per-query timeout
    pub const fn default_query_timeout() -> Self {
        Self::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)
    }

    /// Get duration in seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse a duration string into a Duration value object.
    /// Supported formats: "30s", "1m", "2m30s", "90s"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let invalid = || DurationParseError {
            input: s.to_string(),
        };

        let mut minutes: u64 = 0;
        let mut seconds: u64 = 0;
        let mut current_num = String::new();
        let mut found_any = false;

        for ch in input.chars() {
            if ch.is_ascii_digit() {
                current_num.push(ch);
            } else if ch == 'm' && !current_num.is_empty() {
                minutes = current_num.parse().map_err(|_| invalid())?;
                current_num.clear();
                found_any = true;
            } else if ch == 's' && !current_num.is_empty() {
                seconds = current_num.parse().map_err(|_| invalid())?;
                current_num.clear();
                found_any = true;
            } else {
                return Err(invalid());
            }
        }

        // Leftover digits without a unit
        if !current_num.is_empty() || !found_any {
            return Err(invalid());
        }

        let total_ms = (minutes * 60 + seconds) * 1000;
        if total_ms == 0 {
            return Err(invalid());
        }

        Ok(Self {
            milliseconds: total_ms,
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        if minutes == 0 {
            write!(f, "{}s", seconds)
        } else if seconds == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}s", minutes, seconds)
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::default_query_timeout()
    }
}

/// Parse a timeout setting. `off`, `none` and `0` disable the timeout.
pub fn parse_timeout(s: &str) -> Result<Option<Duration>, DurationParseError> {
    match s.trim().to_lowercase().as_str() {
        "off" | "none" | "0" => Ok(None),
        _ => s.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seconds_only() {
        let d: Duration = "30s".parse().unwrap();
        assert_eq!(d.as_secs(), 30);
        assert_eq!(d.as_millis(), 30000);
    }

    #[test]
    fn parse_minutes_and_seconds() {
        let d: Duration = "2m30s".parse().unwrap();
        assert_eq!(d.as_secs(), 150);
    }

    #[test]
    fn parse_case_insensitive_with_whitespace() {
        let d: Duration = "  1M30S ".parse().unwrap();
        assert_eq!(d.as_secs(), 90);
    }

    #[test]
    fn parse_invalid() {
        assert!("".parse::<Duration>().is_err());
        assert!("0s".parse::<Duration>().is_err());
        assert!("30".parse::<Duration>().is_err());
        assert!("30x".parse::<Duration>().is_err());
    }

    #[test]
    fn display_round_trips_common_forms() {
        assert_eq!(Duration::from_secs(30).to_string(), "30s");
        assert_eq!(Duration::from_secs(120).to_string(), "2m");
        assert_eq!(Duration::from_secs(150).to_string(), "2m30s");
    }

    #[test]
    fn as_std_duration() {
        assert_eq!(Duration::from_secs(30).as_std(), StdDuration::from_secs(30));
    }

    #[test]
    fn default_is_query_timeout() {
        assert_eq!(Duration::default().as_secs(), 60);
    }

    #[test]
    fn parse_timeout_off_values() {
        assert_eq!(parse_timeout("off").unwrap(), None);
        assert_eq!(parse_timeout("NONE").unwrap(), None);
        assert_eq!(parse_timeout("0").unwrap(), None);
    }

    #[test]
    fn parse_timeout_duration() {
        assert_eq!(parse_timeout("45s").unwrap(), Some(Duration::from_secs(45)));
        assert!(parse_timeout("soon").is_err());
    }
}
