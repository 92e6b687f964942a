//! JSON encoding of the persisted [`ConfigRecord`] and a file-backed store.
//!
//! Decoding is lenient per field: a missing or non-numeric number becomes
//! `NaN` (which [`ConfigStore::load`](crate::store::ConfigStore::load) then
//! replaces with its default and writes back), a missing flag takes its
//! default, and unreadable calibration falls back to factory values.

use std::path::{Path, PathBuf};
use std::vec::Vec;

use serde_json::Value;
use thiserror::Error;

use crate::sensor::NtcCalibration;
use crate::settings::ControllerConfig;
use crate::store::ConfigRecord;
use crate::traits::ConfigStorage;

/// Errors from encoding or the file system.
#[derive(Debug, Error)]
pub enum PersistError {
    /// File system failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// Bytes were not JSON at all.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a record as compact JSON.
pub fn encode_record(record: &ConfigRecord) -> Result<Vec<u8>, PersistError> {
    Ok(serde_json::to_vec(record)?)
}

fn number(obj: &Value, key: &str) -> f32 {
    obj.get(key)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(f32::NAN)
}

fn flag(obj: &Value, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Decode a record, tolerating missing or mistyped fields.
///
/// Fails only when the bytes are not a JSON document.
pub fn decode_record(bytes: &[u8]) -> Result<ConfigRecord, PersistError> {
    let root: Value = serde_json::from_slice(bytes)?;
    let defaults = ControllerConfig::default();

    let version = root
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);

    let c = root.get("controller").unwrap_or(&Value::Null);
    let controller = ControllerConfig {
        left_setpoint: number(c, "leftSetpoint"),
        right_setpoint: number(c, "rightSetpoint"),
        hysteresis: number(c, "hysteresis"),
        min_run_time: number(c, "minRunTime"),
        min_stop_time: number(c, "minStopTime"),
        min_zone_switch_time: number(c, "minZoneSwitchTime"),
        max_run_time: number(c, "maxRunTime"),
        temperature_offset: number(c, "tempOffset"),
        left_enabled: flag(c, "leftEnabled", defaults.left_enabled),
        right_enabled: flag(c, "rightEnabled", defaults.right_enabled),
    };

    let calibration = root
        .get("calibration")
        .cloned()
        .and_then(|v| serde_json::from_value::<NtcCalibration>(v).ok())
        .unwrap_or_else(|| {
            log::warn!("stored calibration unreadable, using factory calibration");
            NtcCalibration::default()
        });

    Ok(ConfigRecord {
        version,
        controller,
        calibration,
        auto_updates_enabled: flag(&root, "autoUpdatesEnabled", true),
    })
}

/// Stores the record as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Use the file at `path`. Parent directories are created on save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStorage for JsonFileStorage {
    type Error = PersistError;

    fn load(&mut self) -> Result<Option<ConfigRecord>, PersistError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match decode_record(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // A corrupt file is treated like a missing one so it gets rewritten.
                log::warn!("{} is not valid JSON: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&mut self, record: &ConfigRecord) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = encode_record(record)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{CalibrationPoint, NtcParams};

    #[test]
    fn encode_then_decode_is_identity() {
        let mut rec = ConfigRecord::default();
        rec.controller.left_setpoint = -12.5;
        rec.controller.right_enabled = false;
        rec.calibration.point2 = Some(CalibrationPoint {
            temp: 0.0,
            resistance_left: 8200.0,
            resistance_right: 8100.0,
        });
        rec.calibration.custom = Some(NtcParams {
            nominal_resistance: 2500.0,
            nominal_temp_c: 25.0,
            beta: 3977.0,
        });
        rec.auto_updates_enabled = false;

        let bytes = encode_record(&rec).unwrap();
        assert_eq!(decode_record(&bytes).unwrap(), rec);
    }

    #[test]
    fn uses_api_field_names() {
        let json = String::from_utf8(encode_record(&ConfigRecord::default()).unwrap()).unwrap();
        assert!(json.contains("\"tempOffset\""));
        assert!(json.contains("\"minZoneSwitchTime\""));
        assert!(json.contains("\"autoUpdatesEnabled\""));
    }

    #[test]
    fn missing_numbers_become_nan() {
        let rec = decode_record(br#"{"version":1,"controller":{"leftSetpoint":2.0,"hysteresis":"wide"}}"#)
            .unwrap();
        assert_eq!(rec.controller.left_setpoint, 2.0);
        assert!(rec.controller.hysteresis.is_nan());
        assert!(rec.controller.right_setpoint.is_nan());
        assert!(rec.controller.left_enabled);
        assert!(rec.auto_updates_enabled);
        assert_eq!(rec.calibration, NtcCalibration::default());
    }

    #[test]
    fn missing_version_is_zero() {
        let rec = decode_record(b"{}").unwrap();
        assert_eq!(rec.version, 0);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(decode_record(b"not json"), Err(PersistError::Json(_))));
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonFileStorage::new(dir.path().join("nested/config.json"));
        assert!(storage.load().unwrap().is_none());

        let mut rec = ConfigRecord::default();
        rec.controller.hysteresis = 2.0;
        storage.save(&rec).unwrap();
        assert_eq!(storage.load().unwrap(), Some(rec));
    }

    #[test]
    fn corrupt_file_reads_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, b"{{{").unwrap();
        let mut storage = JsonFileStorage::new(&path);
        assert!(storage.load().unwrap().is_none());
    }
}
