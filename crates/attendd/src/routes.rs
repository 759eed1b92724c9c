use crate::error::ApiError;
use crate::AppState;
use attend_core::{decode_data_url, Analysis};
use attend_log::{EmotionEvent, EmotionStats};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

const EXPORT_FILE_NAME: &str = "emotion_logs.csv";
const NO_FACE_LABEL: &str = "No Face";

/// Body of `POST /analyze`. Only `image` is required; identity defaults are
/// applied when the event is built.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub image: Option<String>,
    pub user_id: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub status: &'static str,
    pub emotion: String,
    pub confidence: f64,
    pub engagement: f64,
}

impl AnalyzeResponse {
    fn no_face() -> Self {
        Self {
            status: "warning",
            emotion: NO_FACE_LABEL.to_string(),
            confidence: 0.0,
            engagement: 0.0,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/", get(index))
        .route("/dashboard", get(dashboard))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/data", get(data))
        .route("/download_logs", get(download_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn dashboard() -> Html<&'static str> {
    Html(include_str!("../static/dashboard.html"))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload?;
    let image = request.image.as_deref().ok_or(ApiError::InvalidFormat)?;
    let frame = decode_data_url(image)?;

    match state.engine.analyze(frame).await? {
        Analysis::NoFace => Ok(Json(AnalyzeResponse::no_face())),
        Analysis::Detected {
            emotion,
            confidence,
            engagement,
            ..
        } => {
            let event = EmotionEvent::now(
                request.user_id.as_deref().unwrap_or_default(),
                request.role.as_deref().unwrap_or_default(),
                emotion.clone(),
                confidence,
                engagement,
            );
            tracing::info!(
                user_id = %event.user_id,
                role = %event.role,
                emotion = %emotion,
                confidence,
                engagement,
                "frame recorded"
            );
            state.recorder.append(event).await?;

            Ok(Json(AnalyzeResponse {
                status: "ok",
                emotion,
                confidence,
                engagement,
            }))
        }
    }
}

async fn data(State(state): State<AppState>) -> Result<Json<EmotionStats>, ApiError> {
    Ok(Json(state.recorder.stats().await?))
}

async fn download_logs(State(state): State<AppState>) -> Result<Response, ApiError> {
    let Some(bytes) = state.recorder.export().await? else {
        return Ok((StatusCode::NOT_FOUND, "Log file not found.").into_response());
    };

    let disposition = format!("attachment; filename=\"{EXPORT_FILE_NAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
