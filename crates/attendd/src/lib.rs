//! attendd — HTTP service that turns webcam frames into logged engagement.
//!
//! Handlers decode frames and hand them to the engine thread, which owns the
//! face locator and emotion classifier. Results are appended to the CSV log
//! through the recorder thread, its single writer.

pub mod config;
pub mod engine;
pub mod error;
pub mod recorder;
pub mod routes;

use axum::Router;
use engine::EngineHandle;
use recorder::RecorderHandle;
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub recorder: RecorderHandle,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(engine: EngineHandle, recorder: RecorderHandle, max_body_bytes: usize) -> Self {
        Self {
            engine,
            recorder,
            max_body_bytes,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    routes::router(state)
}

/// Serve until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
