//! Request bodies of the HTTP API.
//!
//! These types are `no_std` compatible and can be deserialized using either
//! `serde_json` (desktop) or `serde-json-core` (ESP32). Each request maps to
//! the [`ControlCommand`] it asks for, so the desktop handlers and the
//! firmware queue share one translation.
//!
//! # Example
//!
//! ```
//! use rs_fridge::messages::CompressorRequest;
//! use rs_fridge::ControlCommand;
//!
//! #[cfg(feature = "std")]
//! {
//!     let req: CompressorRequest = serde_json::from_str(r#"{"action":"on"}"#).unwrap();
//!     assert_eq!(req.action.command(), ControlCommand::ManualCompressor(true));
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::commands::{CalibrationSlot, ControlCommand};
use crate::traits::Zone;

/// Maximum accepted length of a firmware download URL.
pub const MAX_URL_LEN: usize = 256;

// ============================================================================
// Actions
// ============================================================================

/// Action for `POST /api/system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemAction {
    /// Turn automatic control on (also leaves manual override).
    Enable,
    /// Global kill switch.
    Disable,
}

impl SystemAction {
    /// Command this action requests.
    pub fn command(self) -> ControlCommand {
        ControlCommand::SetSystemEnabled(self == SystemAction::Enable)
    }
}

/// Action for `POST /api/manual/compressor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressorAction {
    /// Force the compressor on.
    On,
    /// Force the compressor off.
    Off,
    /// Return to automatic control.
    Auto,
}

impl CompressorAction {
    /// Command this action requests.
    pub fn command(self) -> ControlCommand {
        match self {
            CompressorAction::On => ControlCommand::ManualCompressor(true),
            CompressorAction::Off => ControlCommand::ManualCompressor(false),
            CompressorAction::Auto => ControlCommand::SetManualOverride(false),
        }
    }
}

/// Action for `POST /api/manual/solenoid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValveAction {
    /// Route refrigerant to the left zone.
    Left,
    /// Route refrigerant to the right zone.
    Right,
    /// Return to automatic control.
    Auto,
}

impl ValveAction {
    /// Command this action requests.
    pub fn command(self) -> ControlCommand {
        match self {
            ValveAction::Left => ControlCommand::ManualValve(Zone::Left),
            ValveAction::Right => ControlCommand::ManualValve(Zone::Right),
            ValveAction::Auto => ControlCommand::SetManualOverride(false),
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// `{"action": "enable" | "disable"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemRequest {
    /// Requested action
    pub action: SystemAction,
}

/// `{"action": "on" | "off" | "auto"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressorRequest {
    /// Requested action
    pub action: CompressorAction,
}

/// `{"action": "left" | "right" | "auto"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValveRequest {
    /// Requested action
    pub action: ValveAction,
}

/// Reference temperature for a calibration capture.
///
/// ```json
/// {"actualTemp": 0.0}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationPointRequest {
    /// Temperature measured with a reference thermometer (°C)
    pub actual_temp: f32,
}

impl CalibrationPointRequest {
    /// Capture command for `slot`.
    pub fn command(self, slot: CalibrationSlot) -> ControlCommand {
        ControlCommand::CaptureCalibration {
            slot,
            actual_temp: self.actual_temp,
        }
    }
}

/// `{"enabled": bool}`. The field is optional so a missing value can be
/// reported instead of failing to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoUpdatesRequest {
    /// New auto-update flag
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Body of `POST /api/ota/update`. Without a URL the latest release is
/// checked first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtaInstallRequest {
    /// Explicit firmware image URL
    #[serde(default)]
    pub download_url: Option<heapless::String<MAX_URL_LEN>>,
}

// ============================================================================
// Parsing Functions (using serde-json-core for no_std compatibility)
// ============================================================================

/// Parse a system request from JSON bytes.
///
/// # Example
///
/// ```
/// use rs_fridge::messages::{parse_system_request, SystemAction};
///
/// let req = parse_system_request(br#"{"action": "disable"}"#).unwrap();
/// assert_eq!(req.action, SystemAction::Disable);
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_system_request(json: &[u8]) -> Option<SystemRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a manual compressor request from JSON bytes.
#[cfg(feature = "serde-json-core")]
pub fn parse_compressor_request(json: &[u8]) -> Option<CompressorRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a manual valve request from JSON bytes.
#[cfg(feature = "serde-json-core")]
pub fn parse_valve_request(json: &[u8]) -> Option<ValveRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a calibration capture request from JSON bytes.
///
/// ```
/// use rs_fridge::messages::parse_calibration_request;
///
/// let req = parse_calibration_request(br#"{"actualTemp": -18.5}"#).unwrap();
/// assert_eq!(req.actual_temp, -18.5);
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_calibration_request(json: &[u8]) -> Option<CalibrationPointRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse an auto-update toggle from JSON bytes.
#[cfg(feature = "serde-json-core")]
pub fn parse_auto_updates_request(json: &[u8]) -> Option<AutoUpdatesRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse an install request. An empty body is a request without a URL.
#[cfg(feature = "serde-json-core")]
pub fn parse_ota_install_request(json: &[u8]) -> Option<OtaInstallRequest> {
    if json.iter().all(u8::is_ascii_whitespace) {
        return Some(OtaInstallRequest::default());
    }
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a partial config update from JSON bytes.
///
/// ```
/// use rs_fridge::messages::parse_config_patch;
///
/// let patch = parse_config_patch(br#"{"leftSetpoint": 2.5, "rightEnabled": false}"#).unwrap();
/// assert_eq!(patch.left_setpoint, Some(2.5));
/// assert_eq!(patch.right_enabled, Some(false));
/// assert_eq!(patch.hysteresis, None);
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_config_patch(json: &[u8]) -> Option<crate::settings::ConfigPatch> {
    serde_json_core::from_slice(json).ok().map(|(patch, _)| patch)
}
