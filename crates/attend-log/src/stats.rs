//! Recent-window statistics over the emotion log.

use crate::event::EmotionEvent;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of most recent rows statistics are computed over.
pub const RECENT_WINDOW: usize = 500;
/// Number of most recent events echoed back in [`EmotionStats::recent`].
pub const RECENT_EVENTS: usize = 10;

/// Aggregates derived from the recent window. The zero value is what an
/// absent log reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmotionStats {
    pub emotion_counts: BTreeMap<String, u64>,
    pub avg_engagement_by_user: Vec<UserEngagement>,
    /// Last few events of the window, oldest first.
    pub recent: Vec<EmotionEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserEngagement {
    pub user_id: String,
    pub engagement: f64,
}

/// Summarize the last [`RECENT_WINDOW`] of `events` (given in file order).
pub fn summarize(events: &[EmotionEvent]) -> EmotionStats {
    let window = &events[events.len().saturating_sub(RECENT_WINDOW)..];

    let mut emotion_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut per_user: BTreeMap<&str, (f64, u32)> = BTreeMap::new();

    for event in window {
        *emotion_counts.entry(event.emotion.clone()).or_default() += 1;
        let (sum, n) = per_user.entry(event.user_id.as_str()).or_default();
        *sum += event.engagement;
        *n += 1;
    }

    let avg_engagement_by_user = per_user
        .into_iter()
        .map(|(user_id, (sum, n))| UserEngagement {
            user_id: user_id.to_string(),
            engagement: sum / n as f64,
        })
        .collect();

    let recent = window[window.len().saturating_sub(RECENT_EVENTS)..].to_vec();

    EmotionStats {
        emotion_counts,
        avg_engagement_by_user,
        recent,
    }
}
