//! Response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use crate::commands::CalibrationSlot;
use crate::sensor::{CalibrationPoint, NtcCalibration, NtcParams};
use crate::settings::ControllerConfig;
use crate::FridgeState;

use super::shared::NetworkStatus;

// Re-export request types from messages module
pub use crate::messages::{
    AutoUpdatesRequest, CalibrationPointRequest, CompressorRequest, OtaInstallRequest,
    SystemRequest, ValveRequest,
};

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// `GET /api/status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Controller state
    #[serde(flatten)]
    pub state: FridgeState,
    /// Network link
    #[serde(flatten)]
    pub network: NetworkStatus,
}

/// Command result response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Whether the command was accepted
    pub accepted: bool,
    /// Result details
    pub result: String,
}

impl CommandResponse {
    /// Applied right away.
    pub fn applied(result: impl Into<String>) -> Self {
        Self {
            accepted: true,
            result: result.into(),
        }
    }

    /// Accepted for the next control loop pass.
    pub fn queued() -> Self {
        Self {
            accepted: true,
            result: "queued".into(),
        }
    }
}

/// `POST /api/config`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdateResponse {
    /// Config after the merge
    pub config: ControllerConfig,
    /// Some requested values were out of range and replaced by defaults
    pub corrected: bool,
    /// Will be applied on the next control loop pass
    pub queued: bool,
}

/// `GET /api/calibration/status`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationStatus {
    /// Calibrated mode active
    pub ntc_calibrated: bool,
    /// First reference point
    pub point1: CalibrationPoint,
    /// Second reference point
    pub point2: Option<CalibrationPoint>,
    /// Derived beta
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_beta: Option<f32>,
    /// Derived nominal temperature (°C)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_temp: Option<f32>,
    /// Derived nominal resistance (Ω)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_resistance: Option<f32>,
}

impl From<&NtcCalibration> for CalibrationStatus {
    fn from(cal: &NtcCalibration) -> Self {
        Self {
            ntc_calibrated: cal.is_calibrated(),
            point1: cal.point1,
            point2: cal.point2,
            custom_beta: cal.custom.map(|p| p.beta),
            nominal_temp: cal.custom.map(|p| p.nominal_temp_c),
            nominal_resistance: cal.custom.map(|p| p.nominal_resistance),
        }
    }
}

/// `POST /api/calibration/point1|point2`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationCaptureResponse {
    /// Which point was written (1 or 2)
    pub point: u8,
    /// Reference temperature (°C)
    pub temp: f32,
    /// Left thermistor resistance (Ω)
    pub resistance_left: f32,
    /// Right thermistor resistance (Ω)
    pub resistance_right: f32,
    /// Calibrated mode active (point 2 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibrated: Option<bool>,
    /// Derived beta (point 2 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f32>,
    /// Derived nominal temperature (point 2 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_temp: Option<f32>,
    /// Derived nominal resistance (point 2 only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_resistance: Option<f32>,
}

impl CalibrationCaptureResponse {
    /// Describe a stored point.
    pub fn new(slot: CalibrationSlot, point: CalibrationPoint, params: Option<NtcParams>) -> Self {
        let is_point2 = slot == CalibrationSlot::Point2;
        Self {
            point: if is_point2 { 2 } else { 1 },
            temp: point.temp,
            resistance_left: point.resistance_left,
            resistance_right: point.resistance_right,
            calibrated: is_point2.then_some(params.is_some()),
            beta: params.map(|p| p.beta),
            nominal_temp: params.map(|p| p.nominal_temp_c),
            nominal_resistance: params.map(|p| p.nominal_resistance),
        }
    }
}

/// `POST /api/ota/auto-updates`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoUpdatesResponse {
    /// New flag
    pub auto_updates_enabled: bool,
}

/// `POST /api/ota/update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResponse {
    /// An install was queued
    pub started: bool,
    /// Human-readable outcome
    pub message: String,
    /// Running version
    pub current_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_ok_omits_error() {
        let json = serde_json::to_string(&ApiResponse::ok(CommandResponse::queued())).unwrap();
        assert_eq!(
            json,
            r#"{"success":true,"data":{"accepted":true,"result":"queued"}}"#
        );
    }

    #[test]
    fn api_response_err_omits_data() {
        let json = serde_json::to_string(&ApiResponse::<()>::err("Not found")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"Not found"}"#);
    }

    #[test]
    fn calibration_status_default() {
        let status = CalibrationStatus::from(&NtcCalibration::default());
        let v = serde_json::to_value(&status).unwrap();
        assert_eq!(v["ntcCalibrated"], false);
        assert_eq!(v["point1"]["temp"], 25.0);
        assert_eq!(v["point1"]["resistanceLeft"], 2500.0);
        assert!(v["point2"].is_null());
        assert!(v.get("customBeta").is_none());
    }

    #[test]
    fn capture_response_point1_has_no_derivation() {
        let r = CalibrationCaptureResponse::new(
            CalibrationSlot::Point1,
            CalibrationPoint::FACTORY,
            None,
        );
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["point"], 1);
        assert!(v.get("calibrated").is_none());
    }

    #[test]
    fn capture_response_point2_reports_calibration() {
        let params = NtcParams {
            nominal_resistance: 2400.0,
            nominal_temp_c: 20.0,
            beta: 3950.0,
        };
        let r = CalibrationCaptureResponse::new(
            CalibrationSlot::Point2,
            CalibrationPoint::FACTORY,
            Some(params),
        );
        assert_eq!(r.point, 2);
        assert_eq!(r.calibrated, Some(true));
        assert_eq!(r.beta, Some(3950.0));
    }

    #[test]
    fn status_response_flattens_network() {
        use crate::engine::Status;
        let state = FridgeState {
            left_temp: Some(4.0),
            right_temp: None,
            compressor_on: false,
            left_cooling: false,
            right_cooling: false,
            current_zone: 0,
            current_zone_name: "Left",
            system_enabled: true,
            manual_mode: false,
            status: Status::Idle,
            phase: "idle",
            uptime: 12,
        };
        let resp = StatusResponse {
            state,
            network: NetworkStatus {
                connected: true,
                ssid: Some("lab".into()),
                ip: None,
            },
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["leftTemp"], 4.0);
        assert!(v["rightTemp"].is_null());
        assert_eq!(v["currentZoneName"], "Left");
        assert_eq!(v["status"], "Idle");
        assert_eq!(v["wifiConnected"], true);
        assert_eq!(v["wifiSSID"], "lab");
    }
}
