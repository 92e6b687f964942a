//! Axum-based HTTP server for the fridge controller API.
//!
//! Provides REST endpoints for:
//! - GET `/api/status` - Readings, actuators and status text
//! - GET/POST `/api/config` - Read or merge the thermostat tunables
//! - GET `/api/logs` - Temperature history
//! - POST `/api/system` - Enable or disable the system
//! - POST `/api/manual/compressor` - Manual compressor control
//! - POST `/api/manual/solenoid` - Manual valve control
//! - POST `/api/calibration/point1|point2|reset`, GET `/api/calibration/status`
//! - GET `/api/ota/status|check`, POST `/api/ota/update|auto-updates`
//! - GET `/` - Web UI (serves index.html)
//!
//! Every route delegates to [`HttpApiHandler`], so the desktop server and
//! the ESP32 server answer identically.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::commands::CalibrationSlot;
use crate::config::WebConfig;

use super::api::ApiResponse;
use super::http_handler::{ApiResult, HttpApiHandler};
use super::shared::StateProvider;

// ============================================================================
// Route Handlers
// ============================================================================

type Api<P> = State<HttpApiHandler<P>>;

async fn status<P: StateProvider>(State(api): Api<P>) -> ApiResult {
    api.handle_status()
}

async fn get_config<P: StateProvider>(State(api): Api<P>) -> ApiResult {
    api.handle_get_config()
}

async fn set_config<P: StateProvider>(State(api): Api<P>, body: Bytes) -> ApiResult {
    api.handle_set_config(&body)
}

async fn logs<P: StateProvider>(State(api): Api<P>) -> ApiResult {
    api.handle_logs()
}

async fn system<P: StateProvider>(State(api): Api<P>, body: Bytes) -> ApiResult {
    api.handle_system(&body)
}

async fn manual_compressor<P: StateProvider>(State(api): Api<P>, body: Bytes) -> ApiResult {
    api.handle_manual_compressor(&body)
}

async fn manual_solenoid<P: StateProvider>(State(api): Api<P>, body: Bytes) -> ApiResult {
    api.handle_manual_valve(&body)
}

async fn calibration_point1<P: StateProvider>(State(api): Api<P>, body: Bytes) -> ApiResult {
    api.handle_calibration_point(CalibrationSlot::Point1, &body)
}

async fn calibration_point2<P: StateProvider>(State(api): Api<P>, body: Bytes) -> ApiResult {
    api.handle_calibration_point(CalibrationSlot::Point2, &body)
}

async fn calibration_status<P: StateProvider>(State(api): Api<P>) -> ApiResult {
    api.handle_calibration_status()
}

async fn calibration_reset<P: StateProvider>(State(api): Api<P>) -> ApiResult {
    api.handle_calibration_reset()
}

async fn ota_status<P: StateProvider>(State(api): Api<P>) -> ApiResult {
    api.handle_ota_status()
}

/// The release lookup is a blocking HTTP call.
async fn ota_check<P: StateProvider + Clone + 'static>(State(api): Api<P>) -> ApiResult {
    tokio::task::spawn_blocking(move || api.handle_ota_check())
        .await
        .unwrap_or_else(|e| ApiResult::error(500, format!("update check aborted: {e}")))
}

async fn ota_update<P: StateProvider + Clone + 'static>(
    State(api): Api<P>,
    body: Bytes,
) -> ApiResult {
    tokio::task::spawn_blocking(move || api.handle_ota_update(&body))
        .await
        .unwrap_or_else(|e| ApiResult::error(500, format!("update request aborted: {e}")))
}

async fn auto_updates<P: StateProvider>(State(api): Api<P>, body: Bytes) -> ApiResult {
    api.handle_auto_updates(&body)
}

/// GET / - Serve the web UI
async fn index() -> impl IntoResponse {
    Html(include_str!("../../www/index.html"))
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_permissive: true,
        }
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<P>(provider: P, config: &WebServerConfig) -> Router
where
    P: StateProvider + Clone + 'static,
{
    let mut router = Router::new()
        .route("/api/status", get(status::<P>))
        .route("/api/config", get(get_config::<P>).post(set_config::<P>))
        .route("/api/logs", get(logs::<P>))
        .route("/api/system", post(system::<P>))
        .route("/api/manual/compressor", post(manual_compressor::<P>))
        .route("/api/manual/solenoid", post(manual_solenoid::<P>))
        .route("/api/calibration/point1", post(calibration_point1::<P>))
        .route("/api/calibration/point2", post(calibration_point2::<P>))
        .route("/api/calibration/status", get(calibration_status::<P>))
        .route("/api/calibration/reset", post(calibration_reset::<P>))
        .route("/api/ota/status", get(ota_status::<P>))
        .route("/api/ota/check", get(ota_check::<P>))
        .route("/api/ota/update", post(ota_update::<P>))
        .route("/api/ota/auto-updates", post(auto_updates::<P>))
        .route("/", get(index))
        .fallback(not_found)
        .with_state(HttpApiHandler::new(provider));

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server with shared state
///
/// The same provider is usually driven by a control loop task:
///
/// ```ignore
/// let state = Arc::new(SharedFridgeState::new(controller, updates));
///
/// tokio::spawn(control_loop(Arc::clone(&state)));
/// run_server_with_state(state, web_config).await?;
/// ```
pub async fn run_server_with_state<P>(
    provider: P,
    config: WebServerConfig,
) -> Result<(), std::io::Error>
where
    P: StateProvider + Clone + 'static,
{
    let router = build_router(provider, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    log::info!("Web server listening on http://{}", config.addr);

    axum::serve(listener, router).await
}
