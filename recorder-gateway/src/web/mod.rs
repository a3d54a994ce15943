//! HTTP request surface.

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use log::info;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::gateway::RecorderGateway;

/// Build the `/Recorder` router.
pub fn router(gateway: Arc<RecorderGateway>) -> Router {
    let recorder = Router::new()
        .route("/Ping", get(api::ping))
        .route("/MacAddresses", get(api::mac_addresses))
        .route("/Initialize/:recorder_id", put(api::initialize))
        .route("/AllocateCard", put(api::allocate_card))
        // Recordings
        .route("/Recording/Start", post(api::start_recording))
        .route("/Recording/ValidateAndUpdate", put(api::validate_and_update_recording))
        .route("/Recording/Abort", put(api::abort_recording))
        .route("/RecordingShares", get(api::recording_shares))
        .route("/TimeshiftShares", get(api::timeshift_shares))
        // Live streams
        .route("/Live/Tune", post(api::tune_live_stream))
        .route("/Live/KeepAlive", put(api::keep_alive))
        .route("/Live/Stop", put(api::stop_live_stream))
        .route("/LiveStreams", get(api::live_streams))
        .route("/ChannelsLiveState", put(api::channels_live_state))
        .route("/Live/TuningDetails", put(api::tuning_details))
        // Teletext
        .route("/Live/HasTeletext", put(api::has_teletext))
        .route("/Live/Teletext/StartGrabbing", put(api::start_grabbing))
        .route("/Live/Teletext/StopGrabbing", put(api::stop_grabbing))
        .route("/Live/Teletext/IsGrabbing", put(api::is_grabbing))
        .route("/Live/Teletext/GetPage/:page/:sub_page", put(api::get_page));

    Router::new()
        .nest("/Recorder", recorder)
        .with_state(gateway)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the request surface until `shutdown` is cancelled.
pub async fn start_web_server(
    listen_addr: SocketAddr,
    gateway: Arc<RecorderGateway>,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(gateway);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("Recorder API listening on http://{}/Recorder", listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Recorder API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::gateway::tests::harness;

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn tune_body(channel: u128) -> Value {
        json!({
            "channel": {
                "channelId": uuid::Uuid::from_u128(channel),
                "displayName": format!("C{}", channel),
            },
            "upcomingRecordingAllocation": null,
            "stream": null,
        })
    }

    #[tokio::test]
    async fn test_ping_envelope() {
        let h = harness().await;
        let app = router(h.gateway.clone());
        let (status, body) = call(&app, "GET", "/Recorder/Ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "result": recorder_protocol::RECORDER_API_VERSION }));
    }

    #[tokio::test]
    async fn test_initialize_and_shares() {
        let h = harness().await;
        let app = router(h.gateway.clone());
        let id = uuid::Uuid::from_u128(5);
        let (status, _) = call(
            &app,
            "PUT",
            &format!("/Recorder/Initialize/{}", id),
            Some(json!({ "schedulerBaseUrl": "http://scheduler" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(h.gateway.recorder_id(), id);

        let (_, body) = call(&app, "GET", "/Recorder/RecordingShares", None).await;
        assert_eq!(body["result"][0], "\\\\server\\recordings");
    }

    #[tokio::test]
    async fn test_tune_keep_alive_and_page() {
        let h = harness().await;
        let app = router(h.gateway.clone());

        let (status, body) = call(&app, "POST", "/Recorder/Live/Tune", Some(tune_body(1))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "Succeeded");
        let stream = body["stream"].clone();
        assert_eq!(stream["rtspUrl"], "rtsp://test/stream1");

        let (_, body) = call(&app, "PUT", "/Recorder/Live/KeepAlive", Some(stream.clone())).await;
        assert_eq!(body["result"], true);

        let (_, body) = call(&app, "PUT", "/Recorder/Live/Teletext/GetPage/100/1", Some(stream.clone())).await;
        assert_eq!(body, json!({ "result": null, "subPageCount": 0 }));

        let (status, _) = call(&app, "PUT", "/Recorder/Live/Teletext/StartGrabbing", Some(stream.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, "PUT", "/Recorder/Live/Teletext/GetPage/100/1", Some(stream.clone())).await;
        assert_eq!(body["result"], recorder_protocol::encode_page(b"P100/1"));
        assert_eq!(body["subPageCount"], 1);

        let (_, body) = call(&app, "GET", "/Recorder/LiveStreams", None).await;
        assert_eq!(body["result"].as_array().unwrap().len(), 1);

        let (status, _) = call(&app, "PUT", "/Recorder/Live/Stop", Some(stream)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(h.gateway.get_live_streams().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_page_is_bad_request() {
        let h = harness().await;
        let app = router(h.gateway.clone());
        let (_, body) = call(&app, "POST", "/Recorder/Live/Tune", Some(tune_body(1))).await;
        let (status, body) = call(&app, "PUT", "/Recorder/Live/Teletext/GetPage/900/1", Some(body["stream"].clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "InvalidArgument");
    }

    #[tokio::test]
    async fn test_unavailable_maps_to_503() {
        let h = harness().await;
        let app = router(h.gateway.clone());
        assert!(h.gateway.dispatcher().shutdown(Duration::from_secs(5)).await);

        let (status, body) = call(&app, "GET", "/Recorder/Ping", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "ServiceUnavailable");

        // Registry queries still answer.
        let (status, body) = call(&app, "GET", "/Recorder/LiveStreams", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "result": [] }));
    }
}
