use anyhow::{Context, Result};
use attend_log::EventLog;
use attendd::config::Config;
use attendd::{engine, recorder, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("attendd starting");
    let config = Config::from_env();

    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;

    let engine = engine::spawn_onnx_engine(
        &config.ultraface_model_path(),
        &config.ferplus_model_path(),
        config.detector_threshold,
    )
    .context("starting analysis engine")?;
    let recorder = recorder::spawn_recorder(EventLog::in_dir(&config.log_dir))
        .context("starting log recorder")?;

    let state = AppState::new(engine, recorder, config.max_body_bytes);
    tracing::info!(
        addr = %config.bind_addr,
        log_dir = %config.log_dir.display(),
        "attendd ready"
    );

    attendd::serve(state, config.bind_addr).await?;
    tracing::info!("attendd shutting down");

    Ok(())
}
