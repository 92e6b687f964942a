//! Shared HTTP API handler logic for both desktop and ESP32.
//!
//! This module provides platform-agnostic request handling that is used by
//! both Axum (desktop) and esp-idf-svc (ESP32) HTTP servers.
//!
//! # Design
//!
//! [`HttpApiHandler`] contains the logic for all API endpoints. Request
//! bodies are parsed with `serde-json-core`; responses are JSON strings in
//! the [`ApiResponse`] envelope. Platform-specific servers only translate
//! an [`ApiResult`] into their native response.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_fridge::services::{HttpApiHandler, SharedFridgeState, UpdateService};
//! use rs_fridge::hal::{MemoryStorage, MockRelay, MockValve};
//! use rs_fridge::{FridgeController, UpdateConfig};
//!
//! let controller =
//!     FridgeController::new(MockRelay::new(), MockValve::new(), MemoryStorage::new());
//! let state = Arc::new(SharedFridgeState::new(
//!     controller,
//!     UpdateService::new(UpdateConfig::default()),
//! ));
//! let api = HttpApiHandler::new(state);
//!
//! let result = api.handle_manual_compressor(br#"{"action":"on"}"#);
//! assert!(result.is_ok());
//!
//! let result = api.handle_manual_compressor(br#"{"action":"sideways"}"#);
//! assert_eq!(result.status(), 400);
//! ```

use serde::Serialize;

use crate::commands::{CalibrationSlot, CommandOutcome, ControlCommand};
use crate::messages::{
    parse_auto_updates_request, parse_calibration_request, parse_compressor_request,
    parse_config_patch, parse_ota_install_request, parse_system_request, parse_valve_request,
};
use crate::update::CURRENT_VERSION;
use crate::FridgeError;

use super::api::{
    ApiResponse, AutoUpdatesResponse, CalibrationCaptureResponse, CalibrationStatus,
    CommandResponse, ConfigUpdateResponse, InstallResponse, StatusResponse,
};
use super::shared::{StateProvider, Submission};

// ============================================================================
// API Response Types
// ============================================================================

/// Result of an API operation.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiResult {
    /// Success with JSON response body.
    Ok(String),
    /// Error with status code and JSON body.
    Error(u16, String),
}

impl ApiResult {
    /// Serialize `data` in a success envelope.
    pub fn ok<T: Serialize>(data: T) -> Self {
        match serde_json::to_string(&ApiResponse::ok(data)) {
            Ok(json) => Self::Ok(json),
            Err(e) => Self::error(500, format!("serialization failed: {e}")),
        }
    }

    /// Error envelope with the given status code.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::to_string(&ApiResponse::<()>::err(message))
            .unwrap_or_else(|_| String::from(r#"{"success":false}"#));
        Self::Error(status, body)
    }

    /// Create a bad request (400) error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(400, message)
    }

    /// Check if this is a success response.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Get the JSON body.
    pub fn body(&self) -> &str {
        match self {
            Self::Ok(json) => json,
            Self::Error(_, json) => json,
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        match self {
            Self::Ok(_) => 200,
            Self::Error(status, _) => *status,
        }
    }
}

impl From<&FridgeError> for ApiResult {
    fn from(err: &FridgeError) -> Self {
        let status = match err {
            FridgeError::QueueFull => 503,
            FridgeError::NoReading => 409,
            FridgeError::Calibration(_) | FridgeError::Sensor(_) => 400,
            FridgeError::Relay(_)
            | FridgeError::Valve(_)
            | FridgeError::Indicator(_)
            | FridgeError::Storage(_) => 500,
        };
        ApiResult::error(status, err.to_string())
    }
}

// Axum integration: allow ApiResult to be returned directly from handlers
#[cfg(feature = "web")]
impl axum::response::IntoResponse for ApiResult {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, StatusCode};

        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = match self {
            ApiResult::Ok(json) | ApiResult::Error(_, json) => json,
        };
        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

// ============================================================================
// HTTP API Handler
// ============================================================================

/// Shared HTTP API handler for both desktop and ESP32.
#[derive(Clone)]
pub struct HttpApiHandler<S: StateProvider> {
    state: S,
}

impl<S: StateProvider> HttpApiHandler<S> {
    /// Create a new handler with the given state provider.
    pub fn new(state: S) -> Self {
        Self { state }
    }

    /// The wrapped state provider.
    pub fn provider(&self) -> &S {
        &self.state
    }

    fn submit_command(&self, cmd: ControlCommand) -> ApiResult {
        match self.state.submit(cmd) {
            Ok(Submission::Applied(_)) => ApiResult::ok(CommandResponse::applied(cmd.name())),
            Ok(Submission::Queued) => ApiResult::ok(CommandResponse::queued()),
            Err(e) => ApiResult::from(&e),
        }
    }

    /// GET /api/status - Readings, actuators, flags and status text.
    pub fn handle_status(&self) -> ApiResult {
        let snap = self.state.snapshot();
        ApiResult::ok(StatusResponse {
            state: snap.state,
            network: snap.network,
        })
    }

    /// GET /api/config - Tunables in force.
    pub fn handle_get_config(&self) -> ApiResult {
        ApiResult::ok(self.state.snapshot().config)
    }

    /// POST /api/config - Merge a partial config.
    ///
    /// Accepts any subset of the config keys, e.g. `{"leftSetpoint": 3.0}`.
    /// Out-of-range values are replaced by their defaults and reported with
    /// `corrected: true`.
    pub fn handle_set_config(&self, body: &[u8]) -> ApiResult {
        if is_blank(body) {
            return ApiResult::bad_request("No data");
        }
        let Some(patch) = parse_config_patch(body) else {
            return ApiResult::bad_request("Invalid config");
        };

        match self.state.submit(ControlCommand::UpdateConfig(patch)) {
            Ok(Submission::Applied(CommandOutcome::ConfigUpdated { config, corrected })) => {
                ApiResult::ok(ConfigUpdateResponse {
                    config,
                    corrected,
                    queued: false,
                })
            }
            Ok(Submission::Applied(_)) => ApiResult::error(500, "Unexpected command outcome"),
            Ok(Submission::Queued) => {
                let (config, corrected) = patch.merge(&self.state.snapshot().config);
                ApiResult::ok(ConfigUpdateResponse {
                    config,
                    corrected,
                    queued: true,
                })
            }
            Err(e) => ApiResult::from(&e),
        }
    }

    /// GET /api/logs - Temperature history, oldest first.
    pub fn handle_logs(&self) -> ApiResult {
        ApiResult::ok(self.state.history())
    }

    /// POST /api/system - `{"action": "enable" | "disable"}`
    pub fn handle_system(&self, body: &[u8]) -> ApiResult {
        match parse_system_request(body) {
            Some(req) => self.submit_command(req.action.command()),
            None => ApiResult::bad_request("No action specified"),
        }
    }

    /// POST /api/manual/compressor - `{"action": "on" | "off" | "auto"}`
    pub fn handle_manual_compressor(&self, body: &[u8]) -> ApiResult {
        match parse_compressor_request(body) {
            Some(req) => self.submit_command(req.action.command()),
            None => ApiResult::bad_request("No action specified"),
        }
    }

    /// POST /api/manual/solenoid - `{"action": "left" | "right" | "auto"}`
    pub fn handle_manual_valve(&self, body: &[u8]) -> ApiResult {
        match parse_valve_request(body) {
            Some(req) => self.submit_command(req.action.command()),
            None => ApiResult::bad_request("No action specified"),
        }
    }

    /// POST /api/calibration/point1|point2 - `{"actualTemp": 0.0}`
    pub fn handle_calibration_point(&self, slot: CalibrationSlot, body: &[u8]) -> ApiResult {
        let Some(req) = parse_calibration_request(body) else {
            return ApiResult::bad_request("Missing actualTemp");
        };

        match self.state.submit(req.command(slot)) {
            Ok(Submission::Applied(CommandOutcome::CalibrationCaptured { point, params })) => {
                ApiResult::ok(CalibrationCaptureResponse::new(slot, point, params))
            }
            Ok(Submission::Applied(_)) => ApiResult::error(500, "Unexpected command outcome"),
            Ok(Submission::Queued) => ApiResult::ok(CommandResponse::queued()),
            Err(e) => ApiResult::from(&e),
        }
    }

    /// GET /api/calibration/status
    pub fn handle_calibration_status(&self) -> ApiResult {
        ApiResult::ok(CalibrationStatus::from(&self.state.snapshot().calibration))
    }

    /// POST /api/calibration/reset
    pub fn handle_calibration_reset(&self) -> ApiResult {
        self.submit_command(ControlCommand::ResetCalibration)
    }

    /// GET /api/ota/status
    pub fn handle_ota_status(&self) -> ApiResult {
        let auto = self.state.snapshot().auto_updates_enabled;
        ApiResult::ok(self.state.updates().status(auto))
    }

    /// POST /api/ota/auto-updates - `{"enabled": bool}`
    pub fn handle_auto_updates(&self, body: &[u8]) -> ApiResult {
        if is_blank(body) {
            return ApiResult::bad_request("No data");
        }
        let Some(req) = parse_auto_updates_request(body) else {
            return ApiResult::bad_request("Invalid request");
        };
        let Some(enabled) = req.enabled else {
            return ApiResult::bad_request("Missing enabled field");
        };

        match self.state.submit(ControlCommand::SetAutoUpdates(enabled)) {
            Ok(_) => ApiResult::ok(AutoUpdatesResponse {
                auto_updates_enabled: enabled,
            }),
            Err(e) => ApiResult::from(&e),
        }
    }

    /// GET /api/ota/check - Look up the latest release without installing.
    pub fn handle_ota_check(&self) -> ApiResult {
        match self.state.updates().check(self.state.now_ms()) {
            None => ApiResult::error(501, "Firmware updates not supported"),
            Some(Err(e)) => ApiResult::error(502, format!("Update check failed: {e}")),
            Some(Ok(check)) => ApiResult::ok(check),
        }
    }

    /// POST /api/ota/update - `{"downloadUrl": "..."}` or an empty body.
    ///
    /// Without a URL the latest release is checked first. The install runs
    /// on the driver loop; the device restarts when it completes.
    pub fn handle_ota_update(&self, body: &[u8]) -> ApiResult {
        let updates = self.state.updates();
        if !updates.is_supported() {
            return ApiResult::error(501, "Firmware updates not supported");
        }
        let Some(req) = parse_ota_install_request(body) else {
            return ApiResult::bad_request("Invalid request");
        };

        let url = match req.download_url.filter(|u| !u.is_empty()) {
            Some(url) => String::from(url.as_str()),
            None => match updates.check(self.state.now_ms()) {
                None => return ApiResult::error(501, "Firmware updates not supported"),
                Some(Err(e)) => return ApiResult::error(502, format!("Update check failed: {e}")),
                Some(Ok(check)) if !check.update_available => {
                    return ApiResult::ok(InstallResponse {
                        started: false,
                        message: "No updates available".into(),
                        current_version: CURRENT_VERSION.into(),
                    });
                }
                Some(Ok(check)) => match check.download_url {
                    Some(url) => url,
                    None => return ApiResult::bad_request("No firmware download URL available"),
                },
            },
        };

        updates.request_install(&url);
        ApiResult::ok(InstallResponse {
            started: true,
            message: "Update installation started. Device will restart when complete.".into(),
            current_version: CURRENT_VERSION.into(),
        })
    }
}
