//! Emotion label → engagement score lookup.

/// Fixed engagement score per emotion label. Labels not listed score 0.0.
pub const ENGAGEMENT_TABLE: [(&str, f64); 9] = [
    ("happy", 0.92),
    ("excited", 0.95),
    ("surprise", 0.82),
    ("neutral", 0.60),
    ("sad", 0.32),
    ("angry", 0.18),
    ("fear", 0.25),
    ("disgust", 0.15),
    ("unknown", 0.00),
];

/// Map an emotion label to its engagement score, ignoring case.
pub fn engagement_for(emotion: &str) -> f64 {
    let label = emotion.to_lowercase();
    ENGAGEMENT_TABLE
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, score)| *score)
        .unwrap_or(0.0)
}
