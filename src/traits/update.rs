//! Remote firmware update interface.

use crate::update::ReleaseInfo;

/// Fetches release metadata and installs firmware images.
///
/// The scheduling rules (when a check is allowed, what happens after a
/// failure) live in [`UpdatePolicy`](crate::update::UpdatePolicy); an
/// implementation only performs the network and flash work.
pub trait FirmwareUpdater {
    /// Error type for check or install failures.
    type Error: core::fmt::Debug;

    /// Query the latest published release.
    fn latest_release(&mut self) -> Result<ReleaseInfo, Self::Error>;

    /// Download the image at `url` and write it to the inactive slot.
    ///
    /// Returns once the image is verified and marked bootable. The caller
    /// is responsible for restarting.
    fn install(&mut self, url: &str) -> Result<(), Self::Error>;
}
