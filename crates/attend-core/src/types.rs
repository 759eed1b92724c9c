use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis-aligned bounding box for a located face, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

impl FaceBox {
    /// Clip the box to a `width` × `height` frame.
    ///
    /// Returns `None` if nothing of the box remains inside the frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<FaceBox> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(FaceBox {
            width: w,
            height: h,
            ..*self
        })
    }

    pub fn area(&self) -> f32 {
        self.width as f32 * self.height as f32
    }
}

/// Classifier output for a single face crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScores {
    /// Label the classifier marks as dominant.
    pub dominant: String,
    /// Confidence in [0, 1] for every label in the classifier vocabulary.
    pub scores: BTreeMap<String, f64>,
}

impl EmotionScores {
    /// Build scores from `(label, confidence)` pairs, picking the highest as dominant.
    ///
    /// Ties keep the earliest label. An empty input yields `"unknown"`.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut dominant: Option<(String, f64)> = None;
        let mut scores = BTreeMap::new();
        for (label, value) in pairs {
            let label = label.into();
            let better = match &dominant {
                None => true,
                Some((_, best)) => value > *best,
            };
            if better {
                dominant = Some((label.clone(), value));
            }
            scores.insert(label, value);
        }
        Self {
            dominant: dominant
                .map(|(label, _)| label)
                .unwrap_or_else(|| "unknown".to_string()),
            scores,
        }
    }

    /// Confidence of the dominant label, 0.0 if the mapping lacks it.
    pub fn confidence(&self) -> f64 {
        self.scores.get(&self.dominant).copied().unwrap_or(0.0)
    }
}
