//! Integration tests for the web API.
//!
//! These tests drive the Axum router end to end with mock hardware.

#![cfg(feature = "web")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use rs_fridge::hal::{MemoryStorage, MockAdc, MockRelay, MockValve};
use rs_fridge::sensor::{resistance_to_adc, NtcParams};
use rs_fridge::services::{build_router, SharedFridgeState, UpdateService, WebServerConfig};
use rs_fridge::{FridgeController, UpdateConfig};

type AppState = SharedFridgeState<MockRelay, MockValve, MemoryStorage>;

fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let controller =
        FridgeController::new(MockRelay::new(), MockValve::new(), MemoryStorage::new());
    let state = Arc::new(SharedFridgeState::new(
        controller,
        UpdateService::new(UpdateConfig::default()),
    ));
    let router = build_router(Arc::clone(&state), &WebServerConfig::default());
    (router, state)
}

fn adc_for(temp_c: f32) -> u16 {
    resistance_to_adc(NtcParams::DEFAULT.resistance_at(temp_c))
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, "").await
}

async fn post(app: &axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(app, "POST", uri, body).await
}

#[tokio::test]
async fn test_status_before_first_sample() {
    let (app, _state) = create_test_app();
    let (status, json) = get(&app, "/api/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let data = &json["data"];
    assert!(data["leftTemp"].is_null());
    assert_eq!(data["compressorOn"], false);
    assert_eq!(data["currentZone"], 0);
    assert_eq!(data["systemEnabled"], true);
    assert_eq!(data["wifiConnected"], false);
}

#[tokio::test]
async fn test_status_after_cycle() {
    let (app, state) = create_test_app();
    let mut adc = MockAdc::new(adc_for(6.0), adc_for(2.0));
    state.run_cycle(&mut adc).unwrap();

    let (_, json) = get(&app, "/api/status").await;
    let left = json["data"]["leftTemp"].as_f64().unwrap();
    assert!((left - 6.0).abs() < 0.2, "left = {left}");

    let (_, logs) = get(&app, "/api/logs").await;
    assert_eq!(logs["data"].as_array().unwrap().len(), 1);
    assert_eq!(logs["data"][0]["leftSetpoint"], 4.0);
}

#[tokio::test]
async fn test_config_get_and_update() {
    let (app, state) = create_test_app();

    let (status, json) = post(&app, "/api/config", r#"{"rightSetpoint": -18, "minRunTime": 2}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["corrected"], false);

    let (_, json) = get(&app, "/api/config").await;
    assert_eq!(json["data"]["rightSetpoint"], -18.0);
    assert_eq!(json["data"]["minRunTime"], 2.0);
    assert_eq!(json["data"]["leftSetpoint"], 4.0);

    state.with_controller(|c| assert_eq!(c.store().storage().save_count, 2));
}

#[tokio::test]
async fn test_config_rejects_empty_body() {
    let (app, _state) = create_test_app();
    let (status, json) = post(&app, "/api/config", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No data");
}

#[tokio::test]
async fn test_manual_compressor_drives_relay() {
    let (app, state) = create_test_app();

    let (status, _) = post(&app, "/api/manual/compressor", r#"{"action":"on"}"#).await;
    assert_eq!(status, StatusCode::OK);
    state.with_controller(|c| assert!(c.relay().running));

    let (_, json) = get(&app, "/api/status").await;
    assert_eq!(json["data"]["manualMode"], true);
    assert_eq!(json["data"]["status"], "Manual Compressor ON");

    post(&app, "/api/manual/compressor", r#"{"action":"off"}"#).await;
    state.with_controller(|c| assert!(!c.relay().running));
}

#[tokio::test]
async fn test_manual_solenoid() {
    let (app, state) = create_test_app();
    let (status, _) = post(&app, "/api/manual/solenoid", r#"{"action":"right"}"#).await;
    assert_eq!(status, StatusCode::OK);
    state.with_controller(|c| assert_eq!(c.valve().zone, rs_fridge::Zone::Right));

    let (status, json) = post(&app, "/api/manual/solenoid", r#"{"action":"up"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_system_toggle() {
    let (app, _state) = create_test_app();
    post(&app, "/api/system", r#"{"action":"disable"}"#).await;
    let (_, json) = get(&app, "/api/status").await;
    assert_eq!(json["data"]["systemEnabled"], false);
}

#[tokio::test]
async fn test_calibration_flow() {
    let (app, state) = create_test_app();

    let (status, _) = post(&app, "/api/calibration/point1", r#"{"actualTemp": 0}"#).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut adc = MockAdc::new(adc_for(0.0), adc_for(0.0));
    state.run_cycle(&mut adc).unwrap();
    let (status, json) = post(&app, "/api/calibration/point1", r#"{"actualTemp": 0}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["point"], 1);

    let mut adc = MockAdc::new(adc_for(25.0), adc_for(25.0));
    state.run_cycle(&mut adc).unwrap();
    let (status, json) = post(&app, "/api/calibration/point2", r#"{"actualTemp": 25}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["calibrated"], true);

    let (_, json) = get(&app, "/api/calibration/status").await;
    assert_eq!(json["data"]["ntcCalibrated"], true);
    assert_eq!(json["data"]["point2"]["temp"], 25.0);

    post(&app, "/api/calibration/reset", "").await;
    let (_, json) = get(&app, "/api/calibration/status").await;
    assert_eq!(json["data"]["ntcCalibrated"], false);
}

#[tokio::test]
async fn test_ota_endpoints_without_updater() {
    let (app, _state) = create_test_app();

    let (status, json) = get(&app, "/api/ota/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["githubRepo"], "Fridge_Control");
    assert_eq!(json["data"]["autoUpdatesEnabled"], true);

    let (status, _) = get(&app, "/api/ota/check").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

    let (status, json) = post(&app, "/api/ota/auto-updates", r#"{"enabled": false}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["autoUpdatesEnabled"], false);
}

#[tokio::test]
async fn test_index_serves_html() {
    let (app, _state) = create_test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("/api/status"));
}

#[tokio::test]
async fn test_not_found() {
    let (app, _state) = create_test_app();
    let (status, json) = get(&app, "/api/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}
