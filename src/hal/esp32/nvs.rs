//! Config record storage in the ESP-IDF NVS partition.
//!
//! The record is kept as one JSON blob (same encoding as the desktop
//! file store) under the `fridge` namespace.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::EspError;
use thiserror::Error;

use crate::persist::{decode_record, encode_record, PersistError};
use crate::store::ConfigRecord;
use crate::traits::ConfigStorage;

/// NVS namespace.
const NAMESPACE: &str = "fridge";
/// Key of the config blob.
const KEY: &str = "config";
/// Largest blob accepted on load.
const MAX_BLOB: usize = 1024;

/// Errors from the NVS store.
#[derive(Debug, Error)]
pub enum NvsStorageError {
    /// ESP-IDF NVS failure.
    #[error("nvs: {0}")]
    Nvs(#[from] EspError),
    /// Encoding failure.
    #[error("{0}")]
    Encode(#[from] PersistError),
}

/// [`ConfigStorage`] backed by NVS.
///
/// # Example
///
/// ```ignore
/// use esp_idf_svc::nvs::EspDefaultNvsPartition;
/// use rs_fridge::hal::esp32::NvsStorage;
///
/// let partition = EspDefaultNvsPartition::take()?;
/// let storage = NvsStorage::new(partition.clone())?;
/// ```
pub struct NvsStorage {
    nvs: EspNvs<NvsDefault>,
}

impl NvsStorage {
    /// Open (or create) the `fridge` namespace.
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, EspError> {
        Ok(Self {
            nvs: EspNvs::new(partition, NAMESPACE, true)?,
        })
    }
}

impl ConfigStorage for NvsStorage {
    type Error = NvsStorageError;

    fn load(&mut self) -> Result<Option<ConfigRecord>, NvsStorageError> {
        let mut buf = [0u8; MAX_BLOB];
        let Some(bytes) = self.nvs.get_blob(KEY, &mut buf)? else {
            return Ok(None);
        };
        match decode_record(bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                log::warn!("[NVS] stored config unreadable, rewriting: {}", e);
                Ok(None)
            }
        }
    }

    fn save(&mut self, record: &ConfigRecord) -> Result<(), NvsStorageError> {
        let bytes = encode_record(record)?;
        self.nvs.set_blob(KEY, &bytes)?;
        Ok(())
    }
}
