//! HTTP request handlers
//!
//! Thin wrappers over the engine's `try_*` operations. The engine has
//! already logged and published any failure; handlers only map it to a
//! status code.

use crate::api::server::AppContext;
use crate::error::Error;
use crate::playback::PauseOptions;
use crate::state::EngineStatus;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SoundsResponse {
    pub sounds: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    sound: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PauseRequest {
    #[serde(default)]
    fade_out: bool,
}

/// Volume on the engine's 0.0-1.0 scale
#[derive(Debug, Serialize, Deserialize)]
pub struct VolumeBody {
    pub volume: f32,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn ok() -> ApiResult<StatusResponse> {
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let code = match err {
        Error::UnknownSound(_) => StatusCode::NOT_FOUND,
        Error::PlayerNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        code,
        Json(ErrorResponse {
            status: "error".to_string(),
            error: err.to_string(),
        }),
    )
}

// ============================================================================
// Health & catalog
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "ambient-loop".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("AMBIENT_GIT_HASH").to_string(),
        build_timestamp: env!("AMBIENT_BUILD_TIMESTAMP").to_string(),
        build_profile: env!("AMBIENT_BUILD_PROFILE").to_string(),
    })
}

/// GET /api/v1/sounds - Catalog names in definition order
pub async fn list_sounds(State(ctx): State<AppContext>) -> Json<SoundsResponse> {
    Json(SoundsResponse {
        sounds: ctx
            .engine
            .catalog()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

// ============================================================================
// Playback control
// ============================================================================

/// GET /api/v1/playback/status
pub async fn get_status(State(ctx): State<AppContext>) -> Json<EngineStatus> {
    Json(ctx.engine.status().await)
}

/// POST /api/v1/playback/play
pub async fn play(
    State(ctx): State<AppContext>,
    Json(req): Json<PlayRequest>,
) -> ApiResult<StatusResponse> {
    info!("Play command received: '{}'", req.sound);
    ctx.engine.try_play(&req.sound).await.map_err(error_response)?;
    ok()
}

/// POST /api/v1/playback/pause - Body is optional
pub async fn pause(
    State(ctx): State<AppContext>,
    req: Option<Json<PauseRequest>>,
) -> ApiResult<StatusResponse> {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    info!("Pause command received (fade_out: {})", req.fade_out);
    ctx.engine
        .try_pause_with(PauseOptions {
            fade_out: req.fade_out,
        })
        .await
        .map_err(error_response)?;
    ok()
}

/// POST /api/v1/playback/resume
pub async fn resume(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    info!("Resume command received");
    ctx.engine.try_resume().await.map_err(error_response)?;
    ok()
}

/// POST /api/v1/playback/stop
pub async fn stop(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    info!("Stop command received");
    ctx.engine.try_stop().await.map_err(error_response)?;
    ok()
}

// ============================================================================
// Volume
// ============================================================================

/// GET /api/v1/volume
pub async fn get_volume(State(ctx): State<AppContext>) -> Json<VolumeBody> {
    Json(VolumeBody {
        volume: ctx.engine.volume().await,
    })
}

/// POST /api/v1/volume - Out-of-range values are clamped
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeBody>,
) -> ApiResult<VolumeBody> {
    ctx.engine
        .try_set_volume(req.volume)
        .await
        .map_err(error_response)?;
    Ok(Json(VolumeBody {
        volume: ctx.engine.volume().await,
    }))
}
