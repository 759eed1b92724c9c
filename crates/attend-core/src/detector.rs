//! UltraFace face locator via ONNX Runtime.
//!
//! Runs the RFB-320 variant of the Ultra-Light-Fast-Generic-Face-Detector:
//! a fixed 320×240 input, per-prior softmax scores and corner-form boxes
//! normalized to [0, 1], followed by NMS post-processing.

use crate::types::FaceBox;
use image::imageops::{self, FilterType};
use image::GrayImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

// --- Named constants (no magic numbers) ---
pub const ULTRAFACE_MODEL_FILE: &str = "version-RFB-320.onnx";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;
const ULTRAFACE_INPUT_WIDTH: u32 = 320;
const ULTRAFACE_INPUT_HEIGHT: u32 = 240;
const ULTRAFACE_MEAN: f32 = 127.0;
const ULTRAFACE_STD: f32 = 128.0;
const ULTRAFACE_NMS_THRESHOLD: f32 = 0.3;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — place the UltraFace RFB-320 model in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Something that finds faces in a grayscale frame.
///
/// Implementations return boxes in the order they should be preferred;
/// callers treat the first box as "the" face.
pub trait FaceLocator: Send {
    fn locate(&mut self, gray: &GrayImage) -> Result<Vec<FaceBox>, DetectorError>;
}

/// UltraFace-based face locator.
pub struct UltraFaceLocator {
    session: Session,
    threshold: f32,
    /// Output indices (scores, boxes), discovered by name at load time.
    output_indices: (usize, usize),
}

impl UltraFaceLocator {
    /// Load the UltraFace ONNX model from the given path.
    pub fn load(model_path: &str, threshold: f32) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        if output_names.len() < 2 {
            return Err(DetectorError::InferenceFailed(format!(
                "UltraFace model requires 2 outputs (scores, boxes), got {}",
                output_names.len()
            )));
        }

        let output_indices = discover_output_indices(&output_names);
        tracing::info!(
            path = model_path,
            outputs = ?output_names,
            ?output_indices,
            threshold,
            "loaded UltraFace model"
        );

        Ok(Self {
            session,
            threshold,
            output_indices,
        })
    }

    /// Resize a grayscale frame to the model input and normalize it into a
    /// NCHW float tensor, replicating the single channel into RGB.
    fn preprocess(gray: &GrayImage) -> Array4<f32> {
        let resized = imageops::resize(
            gray,
            ULTRAFACE_INPUT_WIDTH,
            ULTRAFACE_INPUT_HEIGHT,
            FilterType::Triangle,
        );

        let h = ULTRAFACE_INPUT_HEIGHT as usize;
        let w = ULTRAFACE_INPUT_WIDTH as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let normalized = (pixel.0[0] as f32 - ULTRAFACE_MEAN) / ULTRAFACE_STD;
            let (x, y) = (x as usize, y as usize);
            tensor[[0, 0, y, x]] = normalized;
            tensor[[0, 1, y, x]] = normalized;
            tensor[[0, 2, y, x]] = normalized;
        }
        tensor
    }
}

impl FaceLocator for UltraFaceLocator {
    /// Locate faces, returning boxes sorted by confidence (highest first).
    fn locate(&mut self, gray: &GrayImage) -> Result<Vec<FaceBox>, DetectorError> {
        if gray.width() == 0 || gray.height() == 0 {
            return Ok(Vec::new());
        }

        let input = Self::preprocess(gray);
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (scores_idx, boxes_idx) = self.output_indices;
        let (_, scores) = outputs[scores_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("scores: {e}")))?;
        let (_, boxes) = outputs[boxes_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("boxes: {e}")))?;

        let candidates =
            decode_detections(scores, boxes, gray.width(), gray.height(), self.threshold);
        let faces = nms(candidates, ULTRAFACE_NMS_THRESHOLD);
        tracing::debug!(faces = faces.len(), "UltraFace: faces located");
        Ok(faces)
    }
}

/// Find the (scores, boxes) output positions, falling back to export order.
fn discover_output_indices(names: &[String]) -> (usize, usize) {
    let scores = names.iter().position(|n| n == "scores");
    let boxes = names.iter().position(|n| n == "boxes");
    match (scores, boxes) {
        (Some(s), Some(b)) => (s, b),
        _ => {
            tracing::info!(?names, "UltraFace: output names not recognized, using positional mapping");
            (0, 1)
        }
    }
}

/// Turn raw prior outputs into pixel-space boxes above `threshold`.
///
/// `scores` holds `[background, face]` pairs; `boxes` holds normalized
/// `[x1, y1, x2, y2]` quadruples, one per prior.
fn decode_detections(
    scores: &[f32],
    boxes: &[f32],
    frame_width: u32,
    frame_height: u32,
    threshold: f32,
) -> Vec<FaceBox> {
    let fw = frame_width as f32;
    let fh = frame_height as f32;
    let priors = (scores.len() / 2).min(boxes.len() / 4);

    let mut detections = Vec::new();
    for i in 0..priors {
        let score = scores[i * 2 + 1];
        // NaN scores must not pass.
        if !(score > threshold) {
            continue;
        }

        let x1 = (boxes[i * 4] * fw).clamp(0.0, fw);
        let y1 = (boxes[i * 4 + 1] * fh).clamp(0.0, fh);
        let x2 = (boxes[i * 4 + 2] * fw).clamp(0.0, fw);
        let y2 = (boxes[i * 4 + 3] * fh).clamp(0.0, fh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        let x = x1.floor() as u32;
        let y = y1.floor() as u32;
        detections.push(FaceBox {
            x,
            y,
            width: (x2.ceil() as u32).saturating_sub(x),
            height: (y2.ceil() as u32).saturating_sub(y),
            confidence: score,
        });
    }
    detections
}

/// Non-Maximum Suppression: keep the strongest of each overlapping cluster.
fn nms(mut detections: Vec<FaceBox>, iou_threshold: f32) -> Vec<FaceBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceBox> = Vec::new();
    for candidate in detections {
        if keep.iter().all(|kept| iou(kept, &candidate) <= iou_threshold) {
            keep.push(candidate);
        }
    }
    keep
}

/// Intersection-over-Union between two boxes.
fn iou(a: &FaceBox, b: &FaceBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter = x2.saturating_sub(x1) as f32 * y2.saturating_sub(y1) as f32;
    let union = a.area() + b.area() - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}
