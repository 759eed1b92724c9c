//! attend-core — Frame decoding, face location and emotion classification.
//!
//! Uses UltraFace for face location and FER+ for emotion classification,
//! both running via ONNX Runtime for CPU inference. The pipeline itself only
//! depends on the [`FaceLocator`] and [`EmotionClassifier`] traits.

pub mod analysis;
pub mod classifier;
pub mod decoder;
pub mod detector;
pub mod engagement;
pub mod types;

use std::path::PathBuf;

pub use analysis::{analyze_frame, Analysis, AnalysisError};
pub use classifier::{EmotionClassifier, FerPlusClassifier};
pub use decoder::{decode_data_url, DecodeError};
pub use detector::{FaceLocator, UltraFaceLocator};
pub use engagement::engagement_for;
pub use types::{EmotionScores, FaceBox};

/// Directory searched for ONNX model files when none is configured.
pub fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}
