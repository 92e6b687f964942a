//! Persistence medium for the thermostat configuration record.

use crate::store::ConfigRecord;

/// Backing store for the single versioned [`ConfigRecord`].
///
/// Implementations only move whole records in and out; range checking and
/// default substitution happen in [`ConfigStore`](crate::store::ConfigStore).
/// A record whose numeric fields were missing or unreadable should come back
/// with those fields set to `NaN` so the store can detect and repair them.
///
/// # Implementations
///
/// - [`MemoryStorage`](crate::hal::MemoryStorage) for tests
/// - `JsonFileStorage` on desktop (`persist` feature)
/// - `NvsStorage` on ESP32 (`wifi` feature)
pub trait ConfigStorage {
    /// Error type for storage operations.
    type Error: core::fmt::Debug;

    /// Load the stored record, or `None` if nothing has been written yet.
    fn load(&mut self) -> Result<Option<ConfigRecord>, Self::Error>;

    /// Replace the stored record.
    fn save(&mut self, record: &ConfigRecord) -> Result<(), Self::Error>;
}
