//! FER+ emotion classifier via ONNX Runtime.
//!
//! Classifies a face crop into one of eight emotions using the
//! `emotion-ferplus-8` model: a 64×64 grayscale input fed as raw pixel
//! values, producing one logit per emotion.

use crate::types::EmotionScores;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

// --- Named constants ---
pub const FERPLUS_MODEL_FILE: &str = "emotion-ferplus-8.onnx";
const FERPLUS_INPUT_SIZE: u32 = 64;

/// FER+ output order, renamed to the service's label vocabulary.
pub const FERPLUS_LABELS: [&str; 8] = [
    "neutral", "happy", "surprise", "sad", "angry", "disgust", "fear", "contempt",
];

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model file not found: {0} — place the FER+ model in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("face crop is empty")]
    EmptyCrop,
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Something that names the dominant emotion of a face crop.
pub trait EmotionClassifier: Send {
    fn classify(&mut self, face: &RgbImage) -> Result<EmotionScores, ClassifierError>;
}

/// FER+-based emotion classifier.
pub struct FerPlusClassifier {
    session: Session,
}

impl FerPlusClassifier {
    /// Load the FER+ ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, ClassifierError> {
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded FER+ model"
        );

        Ok(Self { session })
    }

    /// Convert a colour crop into a 1×1×64×64 tensor of raw luma values.
    fn preprocess(face: &RgbImage) -> Array4<f32> {
        let gray = DynamicImage::ImageRgb8(face.clone()).to_luma8();
        let resized = imageops::resize(
            &gray,
            FERPLUS_INPUT_SIZE,
            FERPLUS_INPUT_SIZE,
            FilterType::Triangle,
        );

        let size = FERPLUS_INPUT_SIZE as usize;
        let mut tensor = Array4::<f32>::zeros((1, 1, size, size));
        for (x, y, pixel) in resized.enumerate_pixels() {
            tensor[[0, 0, y as usize, x as usize]] = pixel.0[0] as f32;
        }
        tensor
    }
}

impl EmotionClassifier for FerPlusClassifier {
    fn classify(&mut self, face: &RgbImage) -> Result<EmotionScores, ClassifierError> {
        if face.width() == 0 || face.height() == 0 {
            return Err(ClassifierError::EmptyCrop);
        }

        let input = Self::preprocess(face);
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::InferenceFailed(format!("logits: {e}")))?;

        if logits.len() != FERPLUS_LABELS.len() {
            return Err(ClassifierError::InferenceFailed(format!(
                "expected {} logits, got {}",
                FERPLUS_LABELS.len(),
                logits.len()
            )));
        }

        let probabilities = softmax(logits);
        let scores = EmotionScores::from_pairs(
            FERPLUS_LABELS
                .iter()
                .zip(probabilities)
                .map(|(label, p)| (*label, p)),
        );
        tracing::debug!(dominant = %scores.dominant, confidence = scores.confidence(), "FER+: classified");
        Ok(scores)
    }
}

/// Numerically stable softmax, widened to f64.
fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0, -4.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p[2] > p[1] && p[1] > p[0] && p[0] > p[3]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-9);
        assert!((p[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_labels_cover_engagement_vocabulary() {
        for label in ["happy", "sad", "angry", "surprise", "fear", "disgust", "neutral"] {
            assert!(FERPLUS_LABELS.contains(&label), "missing {label}");
        }
    }

    #[test]
    fn test_preprocess_shape_and_raw_values() {
        let face = RgbImage::from_pixel(30, 40, Rgb([90, 90, 90]));
        let tensor = FerPlusClassifier::preprocess(&face);
        assert_eq!(tensor.shape(), &[1, 1, 64, 64]);
        assert!(tensor.iter().all(|v| (v - 90.0).abs() <= 1.0));
    }
}
