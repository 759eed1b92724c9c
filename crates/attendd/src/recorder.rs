//! Single-writer owner of the emotion log.
//!
//! Every append, statistics read and export goes through one dedicated
//! thread, so rows never interleave and the header is created exactly once
//! no matter how many requests race.

use attend_log::{EmotionEvent, EmotionStats, EventLog, LogError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error(transparent)]
    Log(#[from] LogError),
    #[error("failed to spawn recorder thread: {0}")]
    Spawn(std::io::Error),
    #[error("recorder thread exited")]
    ChannelClosed,
}

enum RecorderRequest {
    Append {
        event: EmotionEvent,
        reply: oneshot::Sender<Result<(), LogError>>,
    },
    Stats {
        reply: oneshot::Sender<Result<EmotionStats, LogError>>,
    },
    Export {
        reply: oneshot::Sender<Result<Option<Vec<u8>>, LogError>>,
    },
}

/// Clone-safe handle to the recorder thread.
#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<RecorderRequest>,
}

impl RecorderHandle {
    /// Append one event; resolves once the row is on disk.
    pub async fn append(&self, event: EmotionEvent) -> Result<(), RecorderError> {
        let (reply, rx) = oneshot::channel();
        self.send(RecorderRequest::Append { event, reply }).await?;
        Ok(rx.await.map_err(|_| RecorderError::ChannelClosed)??)
    }

    /// Statistics over the recent window; zero state if no log exists.
    pub async fn stats(&self) -> Result<EmotionStats, RecorderError> {
        let (reply, rx) = oneshot::channel();
        self.send(RecorderRequest::Stats { reply }).await?;
        Ok(rx.await.map_err(|_| RecorderError::ChannelClosed)??)
    }

    /// Snapshot of the raw log file, `None` if it has not been created.
    pub async fn export(&self) -> Result<Option<Vec<u8>>, RecorderError> {
        let (reply, rx) = oneshot::channel();
        self.send(RecorderRequest::Export { reply }).await?;
        Ok(rx.await.map_err(|_| RecorderError::ChannelClosed)??)
    }

    async fn send(&self, req: RecorderRequest) -> Result<(), RecorderError> {
        self.tx
            .send(req)
            .await
            .map_err(|_| RecorderError::ChannelClosed)
    }
}

/// Spawn the recorder on a dedicated OS thread that owns `log`.
pub fn spawn_recorder(log: EventLog) -> Result<RecorderHandle, RecorderError> {
    let (tx, mut rx) = mpsc::channel::<RecorderRequest>(64);
    tracing::info!(path = %log.path().display(), exists = log.exists(), "emotion log attached");

    std::thread::Builder::new()
        .name("attend-recorder".into())
        .spawn(move || {
            while let Some(req) = rx.blocking_recv() {
                match req {
                    RecorderRequest::Append { event, reply } => {
                        let result = log.append(&event);
                        if let Err(err) = &result {
                            tracing::error!(error = %err, "failed to append emotion event");
                        }
                        let _ = reply.send(result);
                    }
                    RecorderRequest::Stats { reply } => {
                        let _ = reply.send(log.stats());
                    }
                    RecorderRequest::Export { reply } => {
                        let _ = reply.send(log.read_bytes());
                    }
                }
            }
            tracing::info!("recorder thread exiting");
        })
        .map_err(RecorderError::Spawn)?;

    Ok(RecorderHandle { tx })
}
