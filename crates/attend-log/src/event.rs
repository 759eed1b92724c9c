use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_ID: &str = "anonymous";
pub const DEFAULT_ROLE: &str = "student";

/// One row of the emotion log. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionEvent {
    /// RFC 3339 UTC timestamp with microsecond precision.
    pub timestamp: String,
    pub user_id: String,
    pub role: String,
    pub emotion: String,
    pub confidence: f64,
    pub engagement: f64,
}

impl EmotionEvent {
    /// Build an event stamped with the current UTC time.
    ///
    /// Blank identities fall back to [`DEFAULT_USER_ID`] / [`DEFAULT_ROLE`].
    pub fn now(
        user_id: &str,
        role: &str,
        emotion: impl Into<String>,
        confidence: f64,
        engagement: f64,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            user_id: non_blank(user_id, DEFAULT_USER_ID),
            role: non_blank(role, DEFAULT_ROLE),
            emotion: emotion.into(),
            confidence,
            engagement,
        }
    }
}

fn non_blank(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_blank_identity() {
        let ev = EmotionEvent::now("  ", "", "happy", 0.5, 0.92);
        assert_eq!(ev.user_id, "anonymous");
        assert_eq!(ev.role, "student");
    }

    #[test]
    fn test_identity_trimmed() {
        let ev = EmotionEvent::now(" alice ", "teacher", "sad", 0.4, 0.32);
        assert_eq!(ev.user_id, "alice");
        assert_eq!(ev.role, "teacher");
    }

    #[test]
    fn test_timestamp_is_utc_rfc3339() {
        let ev = EmotionEvent::now("u", "r", "neutral", 0.1, 0.6);
        let parsed = chrono::DateTime::parse_from_rfc3339(&ev.timestamp).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        assert!(ev.timestamp.ends_with('Z'));
    }
}
