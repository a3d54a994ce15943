//! Handlers of the `/Recorder` request surface.
//!
//! Each handler decodes its JSON body, calls the matching gateway operation
//! and wraps the outcome in a `{ "result": ... }` envelope. Faults are logged
//! and turned into a generic [`ErrorBody`].

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use uuid::Uuid;

use recorder_protocol::{
    AbortRecordingArguments, AllocateCardArguments, ErrorBody, ErrorCode,
    GetChannelsLiveStateArguments, InitializeArguments, LiveStream, ResultEnvelope,
    StartRecordingArguments, TuneLiveStreamArguments, ValidateAndUpdateRecordingArguments,
};

use crate::error::GatewayError;
use crate::gateway::RecorderGateway;

pub type ApiState = Arc<RecorderGateway>;

/// A gateway failure on its way out of the HTTP layer.
#[derive(Debug)]
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            GatewayError::Unavailable => {
                warn!("[Web] request refused: {}", self.0);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody::new(ErrorCode::ServiceUnavailable, "Service unavailable"),
                )
            }
            GatewayError::InvalidArgument(msg) => {
                warn!("[Web] bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new(ErrorCode::InvalidArgument, msg.clone()),
                )
            }
            GatewayError::Backend(msg) => {
                error!("[Web] request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(ErrorCode::BackendFault, "Internal error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ResultEnvelope<T>>, ApiError>;

fn ok<T>(value: T) -> ApiResult<T> {
    Ok(Json(ResultEnvelope::new(value)))
}

// ============================================================================
// Recorder
// ============================================================================

pub async fn ping(State(gateway): State<ApiState>) -> ApiResult<i32> {
    ok(gateway.ping().await?)
}

pub async fn mac_addresses(State(gateway): State<ApiState>) -> ApiResult<Vec<String>> {
    ok(gateway.get_mac_addresses().await?)
}

pub async fn initialize(
    State(gateway): State<ApiState>,
    Path(recorder_id): Path<Uuid>,
    Json(args): Json<InitializeArguments>,
) -> Result<StatusCode, ApiError> {
    gateway.initialize(recorder_id, args)?;
    Ok(StatusCode::OK)
}

pub async fn allocate_card(
    State(gateway): State<ApiState>,
    Json(args): Json<AllocateCardArguments>,
) -> ApiResult<Option<String>> {
    ok(gateway.allocate_card(args).await?)
}

// ============================================================================
// Recordings
// ============================================================================

pub async fn start_recording(
    State(gateway): State<ApiState>,
    Json(args): Json<StartRecordingArguments>,
) -> ApiResult<bool> {
    ok(gateway.start_recording(args).await?)
}

pub async fn validate_and_update_recording(
    State(gateway): State<ApiState>,
    Json(args): Json<ValidateAndUpdateRecordingArguments>,
) -> ApiResult<bool> {
    ok(gateway.validate_and_update_recording(args).await?)
}

pub async fn abort_recording(
    State(gateway): State<ApiState>,
    Json(args): Json<AbortRecordingArguments>,
) -> ApiResult<bool> {
    ok(gateway.abort_recording(args).await?)
}

pub async fn recording_shares(State(gateway): State<ApiState>) -> ApiResult<Vec<String>> {
    ok(gateway.get_recording_shares())
}

pub async fn timeshift_shares(State(gateway): State<ApiState>) -> ApiResult<Vec<String>> {
    ok(gateway.get_timeshift_shares())
}

// ============================================================================
// Live streams
// ============================================================================

pub async fn tune_live_stream(
    State(gateway): State<ApiState>,
    Json(args): Json<TuneLiveStreamArguments>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(gateway.tune_live_stream(args).await?))
}

pub async fn keep_alive(
    State(gateway): State<ApiState>,
    Json(stream): Json<LiveStream>,
) -> ApiResult<bool> {
    ok(gateway.keep_alive(stream).await?)
}

pub async fn stop_live_stream(
    State(gateway): State<ApiState>,
    Json(stream): Json<LiveStream>,
) -> Result<StatusCode, ApiError> {
    gateway.stop_live_stream(stream).await?;
    Ok(StatusCode::OK)
}

pub async fn live_streams(State(gateway): State<ApiState>) -> ApiResult<Vec<LiveStream>> {
    ok(gateway.get_live_streams())
}

pub async fn channels_live_state(
    State(gateway): State<ApiState>,
    Json(args): Json<GetChannelsLiveStateArguments>,
) -> ApiResult<Vec<recorder_protocol::ChannelLiveState>> {
    ok(gateway.get_channels_live_state(&args))
}

pub async fn tuning_details(
    State(gateway): State<ApiState>,
    Json(stream): Json<LiveStream>,
) -> ApiResult<Option<recorder_protocol::ServiceTuning>> {
    ok(gateway.get_live_stream_tuning_details(stream).await?)
}

// ============================================================================
// Teletext
// ============================================================================

pub async fn has_teletext(
    State(gateway): State<ApiState>,
    Json(stream): Json<LiveStream>,
) -> ApiResult<bool> {
    ok(gateway.has_teletext(stream).await?)
}

pub async fn start_grabbing(
    State(gateway): State<ApiState>,
    Json(stream): Json<LiveStream>,
) -> Result<StatusCode, ApiError> {
    gateway.start_grabbing_teletext(stream).await?;
    Ok(StatusCode::OK)
}

pub async fn stop_grabbing(
    State(gateway): State<ApiState>,
    Json(stream): Json<LiveStream>,
) -> Result<StatusCode, ApiError> {
    gateway.stop_grabbing_teletext(stream).await?;
    Ok(StatusCode::OK)
}

pub async fn is_grabbing(
    State(gateway): State<ApiState>,
    Json(stream): Json<LiveStream>,
) -> ApiResult<bool> {
    ok(gateway.is_grabbing_teletext(&stream))
}

pub async fn get_page(
    State(gateway): State<ApiState>,
    Path((page, sub_page)): Path<(u16, u16)>,
    Json(stream): Json<LiveStream>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(gateway.get_teletext_page(stream, page, sub_page).await?))
}
