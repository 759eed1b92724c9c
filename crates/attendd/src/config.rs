use attend_core::classifier::FERPLUS_MODEL_FILE;
use attend_core::detector::{DEFAULT_CONFIDENCE_THRESHOLD, ULTRAFACE_MODEL_FILE};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Address the HTTP server listens on (default: 0.0.0.0:5000).
    pub bind_addr: SocketAddr,
    /// Directory holding `emotions.csv`; created at startup.
    pub log_dir: PathBuf,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Minimum face score for the locator to report a box.
    pub detector_threshold: f32,
    /// Upper bound on request body size; data URLs of large frames are big.
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from `ATTEND_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_parse("ATTEND_BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 5000))),
            log_dir: std::env::var("ATTEND_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(attend_log::DEFAULT_LOG_DIR)),
            model_dir: std::env::var("ATTEND_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| attend_core::default_model_dir()),
            detector_threshold: env_parse("ATTEND_DETECTOR_THRESHOLD", DEFAULT_CONFIDENCE_THRESHOLD),
            max_body_bytes: env_parse("ATTEND_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        }
    }

    /// Path to the UltraFace locator model.
    pub fn ultraface_model_path(&self) -> String {
        self.model_dir
            .join(ULTRAFACE_MODEL_FILE)
            .to_string_lossy()
            .into_owned()
    }

    /// Path to the FER+ classifier model.
    pub fn ferplus_model_path(&self) -> String {
        self.model_dir
            .join(FERPLUS_MODEL_FILE)
            .to_string_lossy()
            .into_owned()
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparsable value; using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_fallbacks() {
        assert_eq!(env_parse("ATTEND_TEST_UNSET_VARIABLE", 7usize), 7);
        std::env::set_var("ATTEND_TEST_BAD_NUMBER", "lots");
        assert_eq!(env_parse("ATTEND_TEST_BAD_NUMBER", 0.5f32), 0.5);
        std::env::set_var("ATTEND_TEST_GOOD_NUMBER", " 0.25 ");
        assert_eq!(env_parse("ATTEND_TEST_GOOD_NUMBER", 0.5f32), 0.25);
    }

    #[test]
    fn test_model_paths() {
        let config = Config {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            log_dir: PathBuf::from("logs"),
            model_dir: PathBuf::from("/opt/models"),
            detector_threshold: 0.7,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        };
        assert_eq!(config.ultraface_model_path(), "/opt/models/version-RFB-320.onnx");
        assert_eq!(config.ferplus_model_path(), "/opt/models/emotion-ferplus-8.onnx");
    }
}
