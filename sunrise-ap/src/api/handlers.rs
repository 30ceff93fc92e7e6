//! HTTP request handlers
//!
//! Triggers validate their overrides, dispatch the fade to a background
//! thread and answer immediately. Ramp failures after that point only reach
//! the logs and the event stream.

use crate::api::server::AppContext;
use crate::audio::OutputDevice;
use crate::error::Error;
use crate::state::ActiveFade;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use sunrise_common::FadeDirection;
use tracing::{error, info, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

impl StatusResponse {
    fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

type ErrorResponse = (StatusCode, Json<StatusResponse>);

/// Optional `/fadein` overrides
#[derive(Debug, Default, Deserialize)]
pub struct FadeInQuery {
    step: Option<u32>,
    delay_ms: Option<u64>,
    max: Option<u32>,
}

/// Optional `/fadeout` overrides
#[derive(Debug, Default, Deserialize)]
pub struct FadeOutQuery {
    step: Option<u32>,
    delay_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveSession {
    session_id: Uuid,
    direction: FadeDirection,
    volume_percent: u8,
}

#[derive(Debug, Serialize)]
pub struct FaderStatusResponse {
    active: Option<ActiveSession>,
    queued: usize,
    volume_percent: u8,
    playing: bool,
}

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    devices: Vec<String>,
}

// ============================================================================
// Fade Triggers
// ============================================================================

/// GET|POST /fadein - start a fade-in in the background
pub async fn fade_in(
    State(ctx): State<AppContext>,
    query: Result<Query<FadeInQuery>, QueryRejection>,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    let Query(query) = query.map_err(rejected)?;

    let params = ctx
        .controller
        .fade_in_defaults()
        .with_overrides(query.step, query.delay_ms, query.max)
        .map_err(dispatch_error)?;

    let handle = ctx.controller.spawn_fade_in(params).map_err(dispatch_error)?;
    info!(session = %handle.session_id(), "Fade-in dispatched");

    Ok(Json(StatusResponse::new("fading in")))
}

/// GET|POST /fadeout - start a fade-out in the background
pub async fn fade_out(
    State(ctx): State<AppContext>,
    query: Result<Query<FadeOutQuery>, QueryRejection>,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    let Query(query) = query.map_err(rejected)?;

    let params = ctx
        .controller
        .fade_out_defaults()
        .with_overrides(query.step, query.delay_ms)
        .map_err(dispatch_error)?;

    let handle = ctx.controller.spawn_fade_out(params).map_err(dispatch_error)?;
    info!(session = %handle.session_id(), "Fade-out dispatched");

    Ok(Json(StatusResponse::new("fading out")))
}

fn rejected(rejection: QueryRejection) -> ErrorResponse {
    warn!("Rejected fade request: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(StatusResponse::new(format!("error: {}", rejection.body_text()))),
    )
}

fn dispatch_error(e: Error) -> ErrorResponse {
    let code = match e {
        Error::InvalidParameters(_) => {
            warn!("Rejected fade request: {}", e);
            StatusCode::BAD_REQUEST
        }
        _ => {
            error!("Failed to dispatch fade: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (code, Json(StatusResponse::new(format!("error: {}", e))))
}

// ============================================================================
// Health & Status
// ============================================================================

/// GET /health - Health check with build identification
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "sunrise-ap".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
    })
}

/// GET /status - Active session, queue depth and last applied volume
pub async fn status(State(ctx): State<AppContext>) -> Json<FaderStatusResponse> {
    let volume_percent = ctx.state.volume_percent();
    let active = ctx.state.active();
    let pending = ctx.controller.pending();

    // A dispatched session may hold its turn for a moment before marking
    // itself active; count it as queued until then.
    let queued = pending.saturating_sub(usize::from(active.is_some()));

    Json(FaderStatusResponse {
        active: active.map(|ActiveFade { session_id, direction }| ActiveSession {
            session_id,
            direction,
            volume_percent,
        }),
        queued,
        volume_percent,
        playing: ctx.state.is_playing(),
    })
}

/// GET /audio/devices - List available audio output devices
pub async fn list_audio_devices() -> Result<Json<DeviceListResponse>, ErrorResponse> {
    match OutputDevice::list_devices() {
        Ok(devices) => {
            info!("Found {} audio devices", devices.len());
            Ok(Json(DeviceListResponse { devices }))
        }
        Err(e) => {
            error!("Failed to list audio devices: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::new(format!("error: {}", e))),
            ))
        }
    }
}
