use attend_core::classifier::ClassifierError;
use attend_core::detector::DetectorError;
use attend_core::{
    analyze_frame, Analysis, AnalysisError, EmotionClassifier, FaceLocator, FerPlusClassifier,
    UltraFaceLocator,
};
use image::DynamicImage;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("locator load failed: {0}")]
    Locator(#[from] DetectorError),
    #[error("classifier load failed: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// A frame sent from an HTTP handler to the engine thread.
struct EngineRequest {
    frame: DynamicImage,
    reply: oneshot::Sender<Result<Analysis, EngineError>>,
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Request analysis of a decoded frame: locate, crop, classify, score.
    pub async fn analyze(&self, frame: DynamicImage) -> Result<Analysis, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest {
                frame,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Load both ONNX models and spawn the engine around them.
///
/// Fails fast at startup if either model is unavailable.
pub fn spawn_onnx_engine(
    ultraface_path: &str,
    ferplus_path: &str,
    detector_threshold: f32,
) -> Result<EngineHandle, EngineError> {
    let locator = UltraFaceLocator::load(ultraface_path, detector_threshold)?;
    tracing::info!(path = ultraface_path, "UltraFace locator loaded");

    let classifier = FerPlusClassifier::load(ferplus_path)?;
    tracing::info!(path = ferplus_path, "FER+ classifier loaded");

    spawn_engine(Box::new(locator), Box::new(classifier))
}

/// Spawn the engine on a dedicated OS thread.
///
/// The thread owns the locator and classifier for the life of the process;
/// frames are analysed one at a time in arrival order.
pub fn spawn_engine(
    mut locator: Box<dyn FaceLocator>,
    mut classifier: Box<dyn EmotionClassifier>,
) -> Result<EngineHandle, EngineError> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("attend-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                let result = analyze_frame(locator.as_mut(), classifier.as_mut(), &req.frame)
                    .map_err(EngineError::from);
                let _ = req.reply.send(result);
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use attend_core::{EmotionScores, FaceBox};
    use image::{GrayImage, RgbImage};

    struct OneFace;

    impl FaceLocator for OneFace {
        fn locate(&mut self, _gray: &GrayImage) -> Result<Vec<FaceBox>, DetectorError> {
            Ok(vec![FaceBox { x: 0, y: 0, width: 4, height: 4, confidence: 0.99 }])
        }
    }

    struct AlwaysSad;

    impl EmotionClassifier for AlwaysSad {
        fn classify(&mut self, _face: &RgbImage) -> Result<EmotionScores, ClassifierError> {
            Ok(EmotionScores::from_pairs([("sad", 0.6), ("neutral", 0.4)]))
        }
    }

    #[tokio::test]
    async fn test_engine_round_trip() {
        let engine = spawn_engine(Box::new(OneFace), Box::new(AlwaysSad)).unwrap();
        let frame = DynamicImage::ImageRgb8(RgbImage::new(8, 8));
        match engine.analyze(frame).await.unwrap() {
            Analysis::Detected { emotion, engagement, .. } => {
                assert_eq!(emotion, "sad");
                assert_eq!(engagement, 0.32);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_is_shared_across_tasks() {
        let engine = spawn_engine(Box::new(OneFace), Box::new(AlwaysSad)).unwrap();
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                engine
                    .analyze(DynamicImage::ImageRgb8(RgbImage::new(8, 8)))
                    .await
            }));
        }
        for task in tasks {
            assert!(matches!(task.await.unwrap(), Ok(Analysis::Detected { .. })));
        }
    }

    #[test]
    fn test_missing_models_fail_fast() {
        let result = spawn_onnx_engine("/nonexistent/uf.onnx", "/nonexistent/fer.onnx", 0.7);
        assert!(matches!(
            result,
            Err(EngineError::Locator(DetectorError::ModelNotFound(_)))
        ));
    }
}
