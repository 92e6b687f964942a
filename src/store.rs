//! Configuration store: validated tunables plus their persisted record.
//!
//! The store owns the in-memory [`ConfigRecord`] and a [`ConfigStorage`]
//! medium. Memory is authoritative: a failed save is logged and the new
//! values stay in force, and the record is written again on the next change.
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::hal::MemoryStorage;
//! use rs_fridge::settings::ConfigPatch;
//! use rs_fridge::store::ConfigStore;
//!
//! // First boot: nothing stored, defaults are written back.
//! let mut store = ConfigStore::load(MemoryStorage::new());
//! assert_eq!(store.storage().save_count, 1);
//!
//! let (config, corrected) = store.update(&ConfigPatch {
//!     right_setpoint: Some(-2.0),
//!     ..Default::default()
//! });
//! assert_eq!(config.right_setpoint, -2.0);
//! assert!(!corrected);
//! assert_eq!(store.storage().save_count, 2);
//! ```

use crate::error::FridgeError;
use crate::sensor::NtcCalibration;
use crate::settings::{ConfigPatch, ControllerConfig};
use crate::traits::ConfigStorage;

/// Current layout version of [`ConfigRecord`].
pub const RECORD_VERSION: u32 = 1;

/// Everything persisted across reboots.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ConfigRecord {
    /// Layout version, [`RECORD_VERSION`] when written by this crate.
    pub version: u32,
    /// Thermostat tunables.
    pub controller: ControllerConfig,
    /// Thermistor calibration.
    pub calibration: NtcCalibration,
    /// Whether automatic firmware updates are allowed.
    pub auto_updates_enabled: bool,
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self {
            version: RECORD_VERSION,
            controller: ControllerConfig::default(),
            calibration: NtcCalibration::default(),
            auto_updates_enabled: true,
        }
    }
}

impl ConfigRecord {
    /// Repair every unusable field. Returns `true` if anything changed.
    pub fn sanitize(&mut self) -> bool {
        self.controller.sanitize() | self.calibration.sanitize()
    }
}

/// Owner of the persisted configuration.
pub struct ConfigStore<S: ConfigStorage> {
    storage: S,
    record: ConfigRecord,
    dirty: bool,
}

impl<S: ConfigStorage> ConfigStore<S> {
    /// Load from `storage`, repairing anything invalid.
    ///
    /// Never fails. A missing record, an unknown version, or any corrected
    /// field results in the repaired record being saved immediately. A read
    /// error falls back to defaults in memory without overwriting the medium.
    pub fn load(mut storage: S) -> Self {
        let (record, persist) = match storage.load() {
            Ok(Some(mut record)) if record.version == RECORD_VERSION => {
                let corrected = record.sanitize();
                if corrected {
                    log::warn!("stored config had invalid fields, defaults restored");
                }
                (record, corrected)
            }
            Ok(Some(record)) => {
                log::warn!(
                    "stored config version {} unsupported, using factory defaults",
                    record.version
                );
                (ConfigRecord::default(), true)
            }
            Ok(None) => {
                log::info!("no stored config, using factory defaults");
                (ConfigRecord::default(), true)
            }
            Err(e) => {
                log::warn!("config storage read failed: {:?}, using factory defaults", e);
                (ConfigRecord::default(), false)
            }
        };

        let mut store = Self {
            storage,
            record,
            dirty: !persist,
        };
        if persist {
            // Failure is already logged and leaves the store dirty.
            let _ = store.save();
        }
        store
    }

    /// Tunables in force.
    pub fn config(&self) -> &ControllerConfig {
        &self.record.controller
    }

    /// Calibration in force.
    pub fn calibration(&self) -> &NtcCalibration {
        &self.record.calibration
    }

    /// Whole record as it would be saved.
    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }

    /// Whether automatic firmware updates are allowed.
    pub fn auto_updates_enabled(&self) -> bool {
        self.record.auto_updates_enabled
    }

    /// Whether memory holds changes the medium does not.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Merge `patch`, validate and persist.
    ///
    /// Returns the config now in force and whether any requested field was
    /// out of range and replaced by its default.
    pub fn update(&mut self, patch: &ConfigPatch) -> (ControllerConfig, bool) {
        let (merged, corrected) = patch.merge(&self.record.controller);
        if corrected {
            log::warn!("config update had out-of-range fields, defaults substituted");
        }
        self.record.controller = merged;
        let _ = self.save();
        (merged, corrected)
    }

    /// Change the calibration in place and persist.
    pub fn update_calibration<R>(&mut self, f: impl FnOnce(&mut NtcCalibration) -> R) -> R {
        let result = f(&mut self.record.calibration);
        let _ = self.save();
        result
    }

    /// Enable or disable automatic updates and persist.
    pub fn set_auto_updates(&mut self, enabled: bool) {
        if self.record.auto_updates_enabled != enabled {
            self.record.auto_updates_enabled = enabled;
            let _ = self.save();
        }
    }

    /// Write the current record.
    pub fn save(&mut self) -> Result<(), FridgeError> {
        match self.storage.save(&self.record) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                log::warn!("config save failed: {:?}", e);
                self.dirty = true;
                Err(FridgeError::storage(e))
            }
        }
    }

    /// The storage medium.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the storage medium.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
