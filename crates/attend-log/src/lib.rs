//! attend-log — Append-only emotion event log.
//!
//! One CSV file holds every analysed frame. The header is written once when
//! the file is created; rows are only ever appended. Statistics are derived
//! from the most recent [`RECENT_WINDOW`] rows.

pub mod event;
pub mod stats;
pub mod store;

pub use event::EmotionEvent;
pub use stats::{summarize, EmotionStats, UserEngagement, RECENT_EVENTS, RECENT_WINDOW};
pub use store::{EventLog, LogError, DEFAULT_LOG_DIR, HEADER, LOG_FILE_NAME};
