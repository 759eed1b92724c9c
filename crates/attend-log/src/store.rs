//! CSV-backed event log.
//!
//! `EventLog` does no locking of its own: it must have a single owner that
//! serializes calls (the daemon's recorder thread). Concurrent readers from
//! other processes may observe a partially written last row, which the
//! reader skips.

use crate::event::EmotionEvent;
use crate::stats::{summarize, EmotionStats, RECENT_WINDOW};
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const LOG_FILE_NAME: &str = "emotions.csv";
pub const HEADER: [&str; 6] = [
    "timestamp",
    "user_id",
    "role",
    "emotion",
    "confidence",
    "engagement",
];

#[derive(Error, Debug)]
pub enum LogError {
    #[error("log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("log CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only emotion log stored as a single CSV file.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log at `<dir>/emotions.csv`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(LOG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create the file with its header if it does not exist yet.
    ///
    /// Returns `true` if this call wrote the header. A file that exists but
    /// is empty (an earlier header write failed) is treated as uninitialized;
    /// a non-empty file is never touched, so the header is written exactly once.
    pub fn ensure_initialized(&self) -> Result<bool, LogError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        if file.metadata()?.len() > 0 {
            return Ok(false);
        }

        let mut header = csv::Writer::from_writer(Vec::new());
        header.write_record(HEADER)?;
        header.flush()?;
        file.write_all(header.get_ref())?;
        file.flush()?;

        tracing::info!(path = %self.path.display(), "emotion log initialized");
        Ok(true)
    }

    /// Append one event as a single row.
    ///
    /// The row is rendered in memory first and written with one `write_all`,
    /// so a failed append never leaves a half-written row behind.
    pub fn append(&self, event: &EmotionEvent) -> Result<(), LogError> {
        self.ensure_initialized()?;

        let mut row = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        row.serialize(event)?;
        row.flush()?;

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(row.get_ref())?;
        file.flush()?;

        tracing::debug!(
            user_id = %event.user_id,
            emotion = %event.emotion,
            engagement = event.engagement,
            "emotion event appended"
        );
        Ok(())
    }

    /// Read at most the last `limit` events, in file order.
    ///
    /// A missing file reads as empty. Rows that fail to parse are skipped.
    pub fn read_window(&self, limit: usize) -> Result<Vec<EmotionEvent>, LogError> {
        if limit == 0 || !self.exists() {
            return Ok(Vec::new());
        }

        let mut rdr = csv::Reader::from_path(&self.path)?;
        let mut window: VecDeque<EmotionEvent> = VecDeque::with_capacity(limit.min(1024));

        for (idx, record) in rdr.deserialize::<EmotionEvent>().enumerate() {
            match record {
                Ok(event) => {
                    if window.len() == limit {
                        window.pop_front();
                    }
                    window.push_back(event);
                }
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    tracing::warn!(row = idx + 1, error = %err, "skipping malformed log row");
                }
            }
        }

        Ok(window.into())
    }

    /// Raw file bytes, or `None` if the log has not been created.
    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>, LogError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Statistics over the most recent [`RECENT_WINDOW`] events.
    pub fn stats(&self) -> Result<EmotionStats, LogError> {
        let window = self.read_window(RECENT_WINDOW)?;
        Ok(summarize(&window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER_LINE: &str = "timestamp,user_id,role,emotion,confidence,engagement\n";

    fn event(user: &str, emotion: &str, confidence: f64, engagement: f64) -> EmotionEvent {
        EmotionEvent {
            timestamp: "2026-01-01T00:00:00.000000Z".into(),
            user_id: user.into(),
            role: "student".into(),
            emotion: emotion.into(),
            confidence,
            engagement,
        }
    }

    #[test]
    fn test_in_dir_uses_fixed_file_name() {
        let log = EventLog::in_dir("logs");
        assert_eq!(log.path(), Path::new("logs/emotions.csv"));
    }

    #[test]
    fn test_ensure_initialized_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());
        assert!(!log.exists());

        assert!(log.ensure_initialized().unwrap());
        let first = fs::read(log.path()).unwrap();
        assert!(!log.ensure_initialized().unwrap());
        assert!(!log.ensure_initialized().unwrap());

        assert_eq!(first, HEADER_LINE.as_bytes());
        assert_eq!(fs::read(log.path()).unwrap(), first);
    }

    #[test]
    fn test_empty_file_gets_header_before_rows() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());
        fs::write(log.path(), b"").unwrap();

        for user in ["a", "b", "c"] {
            log.append(&event(user, "happy", 0.9, 0.92)).unwrap();
        }

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.starts_with(HEADER_LINE));
        assert_eq!(content.lines().count(), 4);

        let stats = log.stats().unwrap();
        assert_eq!(stats.emotion_counts.get("happy"), Some(&3));
        assert_eq!(stats.avg_engagement_by_user.len(), 3);
    }

    #[test]
    fn test_ensure_initialized_creates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path().join("nested").join("logs"));
        log.ensure_initialized().unwrap();
        assert!(log.exists());
    }

    #[test]
    fn test_append_n_rows_in_order() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());

        for i in 0..5 {
            log.append(&event(&format!("user{i}"), "happy", 0.87, 0.92)).unwrap();
        }

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(format!("{}\n", lines[0]), HEADER_LINE);
        assert_eq!(
            lines[1],
            "2026-01-01T00:00:00.000000Z,user0,student,happy,0.87,0.92"
        );
        for (i, line) in lines[1..].iter().enumerate() {
            assert!(line.contains(&format!(",user{i},")), "line {line}");
        }
    }

    #[test]
    fn test_append_never_rewrites_prior_bytes() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());
        log.append(&event("a", "sad", 0.5, 0.32)).unwrap();
        let before = fs::read(log.path()).unwrap();
        log.append(&event("b", "fear", 0.6, 0.25)).unwrap();
        let after = fs::read(log.path()).unwrap();
        assert!(after.starts_with(&before));
        assert!(after.len() > before.len());
    }

    #[test]
    fn test_append_quotes_commas_in_fields() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());
        log.append(&event("doe, jane", "neutral", 0.4, 0.6)).unwrap();

        let events = log.read_window(10).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_id, "doe, jane");
    }

    #[test]
    fn test_read_window_absent_log() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());
        assert!(log.read_window(500).unwrap().is_empty());
        assert!(log.read_bytes().unwrap().is_none());
        assert_eq!(log.stats().unwrap(), EmotionStats::default());
        assert!(!log.exists());
    }

    #[test]
    fn test_read_window_keeps_tail() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());
        for i in 1..=8 {
            log.append(&event(&format!("u{i}"), "happy", 0.9, 0.92)).unwrap();
        }
        let users: Vec<String> = log
            .read_window(3)
            .unwrap()
            .into_iter()
            .map(|e| e.user_id)
            .collect();
        assert_eq!(users, vec!["u6", "u7", "u8"]);
    }

    #[test]
    fn test_read_window_skips_malformed_rows() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());
        log.append(&event("a", "happy", 0.9, 0.92)).unwrap();
        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        file.write_all(b"garbage,row\n").unwrap();
        file.write_all(b"2026-01-01T00:00:00Z,b,student,sad,not-a-number,0.32\n").unwrap();
        drop(file);
        log.append(&event("c", "angry", 0.7, 0.18)).unwrap();

        let users: Vec<String> = log
            .read_window(10)
            .unwrap()
            .into_iter()
            .map(|e| e.user_id)
            .collect();
        assert_eq!(users, vec!["a", "c"]);
    }

    #[test]
    fn test_read_bytes_matches_disk() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());
        log.append(&event("a", "happy", 0.9, 0.92)).unwrap();
        assert_eq!(
            log.read_bytes().unwrap().unwrap(),
            fs::read(log.path()).unwrap()
        );
    }

    #[test]
    fn test_stats_window_excludes_oldest_rows() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::in_dir(dir.path());
        for i in 1..=600 {
            log.append(&event(&format!("u{i}"), &format!("e{i}"), 0.5, 0.6))
                .unwrap();
        }

        let stats = log.stats().unwrap();
        assert_eq!(stats.emotion_counts.len(), 500);
        assert_eq!(stats.avg_engagement_by_user.len(), 500);
        for i in 1..=100 {
            assert!(!stats.emotion_counts.contains_key(&format!("e{i}")));
        }
        for i in 101..=600 {
            assert_eq!(stats.emotion_counts.get(&format!("e{i}")), Some(&1));
        }
        assert!(stats
            .avg_engagement_by_user
            .iter()
            .all(|u| u.user_id[1..].parse::<u32>().unwrap() > 100));
    }
}
