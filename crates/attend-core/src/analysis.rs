//! Single-frame analysis: locate → crop → classify → score.

use crate::classifier::{ClassifierError, EmotionClassifier};
use crate::detector::{DetectorError, FaceLocator};
use crate::engagement::engagement_for;
use crate::types::FaceBox;
use image::DynamicImage;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("face location failed: {0}")]
    Detector(#[from] DetectorError),
    #[error("emotion classification failed: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Outcome of analysing one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Analysis {
    /// The locator found nothing. Not an error, and never logged.
    NoFace,
    Detected {
        face: FaceBox,
        emotion: String,
        confidence: f64,
        engagement: f64,
    },
}

/// Analyse a decoded frame using the first face the locator reports.
///
/// Location runs on the grayscale frame; classification sees the colour
/// crop of that face.
pub fn analyze_frame(
    locator: &mut dyn FaceLocator,
    classifier: &mut dyn EmotionClassifier,
    frame: &DynamicImage,
) -> Result<Analysis, AnalysisError> {
    let gray = frame.to_luma8();
    let faces = locator.locate(&gray)?;

    let Some(face) = faces
        .first()
        .and_then(|f| f.clamp_to(frame.width(), frame.height()))
    else {
        tracing::debug!(located = faces.len(), "no usable face in frame");
        return Ok(Analysis::NoFace);
    };

    let crop = frame
        .crop_imm(face.x, face.y, face.width, face.height)
        .to_rgb8();
    let scores = classifier.classify(&crop)?;
    let confidence = scores.confidence();
    let engagement = engagement_for(&scores.dominant);

    tracing::debug!(
        emotion = %scores.dominant,
        confidence,
        engagement,
        x = face.x,
        y = face.y,
        width = face.width,
        height = face.height,
        "frame analysed"
    );

    Ok(Analysis::Detected {
        face,
        emotion: scores.dominant,
        confidence,
        engagement,
    })
}
