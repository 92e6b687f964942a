//! Firmware update policy: version comparison, asset selection, scheduling.
//!
//! The network and flash work is behind [`FirmwareUpdater`]; this module
//! only decides *whether* to check and *which* image to install.
//!
//! Automatic checks run only when every condition holds:
//!
//! - auto-updates are enabled and the network is up
//! - no install is already running
//! - the compressor is off
//! - the boot grace period and the check interval have both elapsed
//!
//! A failed install disables auto-updates and pushes the next check out
//! by the retry back-off.
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::update::{is_firmware_asset, FirmwareVersion};
//!
//! let current = FirmwareVersion::parse("1.0.6").unwrap();
//! let remote = FirmwareVersion::parse("v1.1.0").unwrap();
//! assert!(remote > current);
//!
//! assert!(is_firmware_asset("firmware-esp32.bin"));
//! assert!(!is_firmware_asset("firmware-bootloader.bin"));
//! ```

use alloc::string::String;
use core::fmt;

use crate::traits::FirmwareUpdater;

/// Version string of this build.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `major.minor.patch` firmware version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct FirmwareVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

impl FirmwareVersion {
    /// Construct from components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `"1.2.3"`, `"v1.2.3"`, `"1.2"` or `"1.2.3-rc1"`.
    ///
    /// Missing components are zero and trailing suffixes are ignored. The
    /// major component must be present.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix(['v', 'V']).unwrap_or(s);
        let mut parts = s.splitn(3, '.');
        let major = leading_number(parts.next()?)?;
        let minor = parts.next().and_then(leading_number).unwrap_or(0);
        let patch = parts.next().and_then(leading_number).unwrap_or(0);
        Some(Self::new(major, minor, patch))
    }

    /// Version of the running firmware.
    pub fn current() -> Self {
        Self::parse(CURRENT_VERSION).unwrap_or_default()
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Whether a release asset is an application image.
///
/// Matches `firmware-*.bin`, excluding bootloader and partition table images.
pub fn is_firmware_asset(name: &str) -> bool {
    name.starts_with("firmware-")
        && name.ends_with(".bin")
        && !name.contains("bootloader")
        && !name.contains("partitions")
}

/// Download URL of the first firmware image among `(name, url)` pairs.
pub fn select_firmware_asset<'a, I>(assets: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    assets
        .into_iter()
        .find(|(name, _)| is_firmware_asset(name))
        .map(|(_, url)| url)
}

/// Latest published release as reported by the updater.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ReleaseInfo {
    /// Release tag, e.g. `v1.1.0`.
    pub tag: String,
    /// Firmware image URL, if the release carries one.
    pub download_url: Option<String>,
    /// Release notes.
    pub notes: String,
}

impl ReleaseInfo {
    /// Parsed version of the tag.
    pub fn version(&self) -> Option<FirmwareVersion> {
        FirmwareVersion::parse(&self.tag)
    }

    /// Whether this release is newer than `current`.
    pub fn is_newer_than(&self, current: FirmwareVersion) -> bool {
        self.version().is_some_and(|v| v > current)
    }
}

/// GitHub "latest release" payload, reduced to the fields used.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, serde::Deserialize)]
pub struct GithubRelease {
    /// Tag name.
    pub tag_name: String,
    /// Release notes.
    #[serde(default)]
    pub body: Option<String>,
    /// Attached files.
    #[serde(default)]
    pub assets: alloc::vec::Vec<GithubAsset>,
}

/// One file attached to a GitHub release.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, serde::Deserialize)]
pub struct GithubAsset {
    /// File name.
    pub name: String,
    /// Public download URL.
    pub browser_download_url: String,
}

#[cfg(feature = "serde")]
impl From<GithubRelease> for ReleaseInfo {
    fn from(r: GithubRelease) -> Self {
        let download_url = select_firmware_asset(
            r.assets
                .iter()
                .map(|a| (a.name.as_str(), a.browser_download_url.as_str())),
        )
        .map(String::from);
        ReleaseInfo {
            tag: r.tag_name,
            download_url,
            notes: r.body.unwrap_or_default(),
        }
    }
}

/// GitHub API URL of a repository's latest release.
pub fn latest_release_url(owner: &str, repo: &str) -> String {
    alloc::format!("https://api.github.com/repos/{owner}/{repo}/releases/latest")
}

/// Conditions sampled by the main loop before an automatic check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateConditions {
    /// Network is connected.
    pub connected: bool,
    /// Operator allows automatic updates.
    pub auto_enabled: bool,
    /// Compressor is running.
    pub compressor_on: bool,
    /// Monotonic time (ms since boot).
    pub now_ms: u64,
}

/// Result of [`UpdatePolicy::run_automatic`].
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOutcome {
    /// Conditions not met; nothing was done.
    Skipped,
    /// The release lookup failed.
    CheckFailed,
    /// Running the latest version already.
    UpToDate,
    /// A newer release has no firmware image attached.
    NoImage(FirmwareVersion),
    /// Installed; the caller must restart.
    Installed(FirmwareVersion),
    /// An operator-requested image was installed; the caller must restart.
    ManualInstalled,
    /// Install failed; auto-updates must be disabled.
    InstallFailed,
}

impl UpdateOutcome {
    /// A new image is in the OTA partition and the device must restart.
    pub fn needs_restart(&self) -> bool {
        matches!(self, UpdateOutcome::Installed(_) | UpdateOutcome::ManualInstalled)
    }
}

/// Answer to a manual update check.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UpdateCheck {
    /// Running version.
    pub current_version: String,
    /// Latest release tag.
    pub latest_version: String,
    /// Whether the latest release is newer.
    pub update_available: bool,
    /// Firmware image URL.
    pub download_url: Option<String>,
    /// Release notes.
    pub release_notes: String,
}

/// Scheduling state for update checks.
#[derive(Clone, Debug)]
pub struct UpdatePolicy {
    /// Interval between automatic checks (ms).
    pub check_interval_ms: u64,
    /// No automatic check before this uptime (ms).
    pub boot_grace_ms: u64,
    /// Delay before retrying after a failed install (ms).
    pub retry_backoff_ms: u64,
    last_check_ms: Option<u64>,
    not_before_ms: u64,
    in_progress: bool,
    current: FirmwareVersion,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self::new(60 * 60_000, 5 * 60_000, 24 * 60 * 60_000)
    }
}

impl UpdatePolicy {
    /// Policy for the running firmware version.
    pub fn new(check_interval_ms: u64, boot_grace_ms: u64, retry_backoff_ms: u64) -> Self {
        Self {
            check_interval_ms,
            boot_grace_ms,
            retry_backoff_ms,
            last_check_ms: None,
            not_before_ms: check_interval_ms,
            in_progress: false,
            current: FirmwareVersion::current(),
        }
    }

    /// Override the version considered current.
    pub fn with_current(mut self, current: FirmwareVersion) -> Self {
        self.current = current;
        self
    }

    /// Version considered current.
    pub fn current(&self) -> FirmwareVersion {
        self.current
    }

    /// Time of the last check, if any.
    pub fn last_check_ms(&self) -> Option<u64> {
        self.last_check_ms
    }

    /// Whether an install is running.
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Whether an automatic check may run now.
    pub fn should_check(&self, c: &UpdateConditions) -> bool {
        c.connected
            && c.auto_enabled
            && !self.in_progress
            && !c.compressor_on
            && c.now_ms > self.boot_grace_ms
            && c.now_ms > self.not_before_ms
    }

    /// Record that a check happened.
    pub fn record_check(&mut self, now_ms: u64) {
        self.last_check_ms = Some(now_ms);
        self.not_before_ms = now_ms.saturating_add(self.check_interval_ms);
    }

    /// Record a failed install: back off before the next attempt.
    pub fn record_failure(&mut self, now_ms: u64) {
        self.not_before_ms = now_ms.saturating_add(self.retry_backoff_ms);
    }

    /// Query the updater and describe the result.
    pub fn check<U: FirmwareUpdater>(
        &mut self,
        updater: &mut U,
        now_ms: u64,
    ) -> Result<UpdateCheck, U::Error> {
        self.record_check(now_ms);
        let release = updater.latest_release()?;
        Ok(UpdateCheck {
            current_version: alloc::format!("{}", self.current),
            update_available: release.is_newer_than(self.current),
            latest_version: release.tag,
            download_url: release.download_url,
            release_notes: release.notes,
        })
    }

    /// Install from `url`, tracking the in-progress flag.
    pub fn install<U: FirmwareUpdater>(&mut self, updater: &mut U, url: &str) -> Result<(), U::Error> {
        self.in_progress = true;
        let result = updater.install(url);
        self.in_progress = false;
        result
    }

    /// Install an image the operator asked for.
    ///
    /// A failure backs off automatic checks like a failed automatic install.
    pub fn install_requested<U: FirmwareUpdater>(
        &mut self,
        updater: &mut U,
        url: &str,
        now_ms: u64,
    ) -> UpdateOutcome {
        log::info!("installing requested firmware from {}", url);
        match self.install(updater, url) {
            Ok(()) => UpdateOutcome::ManualInstalled,
            Err(e) => {
                log::warn!("firmware install failed: {:?}", e);
                self.record_failure(now_ms);
                UpdateOutcome::InstallFailed
            }
        }
    }

    /// One automatic update pass.
    pub fn run_automatic<U: FirmwareUpdater>(
        &mut self,
        updater: &mut U,
        conditions: &UpdateConditions,
    ) -> UpdateOutcome {
        if !self.should_check(conditions) {
            return UpdateOutcome::Skipped;
        }
        let now = conditions.now_ms;
        self.record_check(now);

        let release = match updater.latest_release() {
            Ok(r) => r,
            Err(e) => {
                log::warn!("update check failed: {:?}", e);
                return UpdateOutcome::CheckFailed;
            }
        };
        let Some(version) = release.version().filter(|v| *v > self.current) else {
            log::info!("firmware {} is up to date", self.current);
            return UpdateOutcome::UpToDate;
        };
        let Some(url) = release.download_url.as_deref() else {
            log::warn!("release {} has no firmware image", release.tag);
            return UpdateOutcome::NoImage(version);
        };

        log::info!("installing firmware {} from {}", version, url);
        match self.install(updater, url) {
            Ok(()) => UpdateOutcome::Installed(version),
            Err(e) => {
                log::warn!("firmware install failed: {:?}", e);
                self.record_failure(now);
                UpdateOutcome::InstallFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockUpdater;

    const MIN: u64 = 60_000;

    fn release(tag: &str, url: Option<&str>) -> ReleaseInfo {
        ReleaseInfo {
            tag: tag.into(),
            download_url: url.map(String::from),
            notes: String::new(),
        }
    }

    fn ready(now_ms: u64) -> UpdateConditions {
        UpdateConditions {
            connected: true,
            auto_enabled: true,
            compressor_on: false,
            now_ms,
        }
    }

    // =========================================================================
    // Versions and assets
    // =========================================================================

    #[test]
    fn parse_versions() {
        assert_eq!(FirmwareVersion::parse("1.0.6"), Some(FirmwareVersion::new(1, 0, 6)));
        assert_eq!(FirmwareVersion::parse("v2.10.0"), Some(FirmwareVersion::new(2, 10, 0)));
        assert_eq!(FirmwareVersion::parse("1.2"), Some(FirmwareVersion::new(1, 2, 0)));
        assert_eq!(FirmwareVersion::parse("1.2.3-rc1"), Some(FirmwareVersion::new(1, 2, 3)));
        assert_eq!(FirmwareVersion::parse(""), None);
        assert_eq!(FirmwareVersion::parse("latest"), None);
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(FirmwareVersion::new(1, 10, 0) > FirmwareVersion::new(1, 9, 9));
        assert!(FirmwareVersion::new(2, 0, 0) > FirmwareVersion::new(1, 99, 99));
        assert!(!(FirmwareVersion::new(1, 0, 6) > FirmwareVersion::new(1, 0, 6)));
    }

    #[test]
    fn current_version_parses() {
        assert_eq!(
            alloc::format!("{}", FirmwareVersion::current()),
            CURRENT_VERSION
        );
    }

    #[test]
    fn asset_selection_skips_support_images() {
        let assets = [
            ("firmware-bootloader.bin", "u1"),
            ("firmware-partitions.bin", "u2"),
            ("README.md", "u3"),
            ("firmware-esp32.bin", "u4"),
            ("firmware-esp32s3.bin", "u5"),
        ];
        assert_eq!(select_firmware_asset(assets), Some("u4"));
        assert_eq!(select_firmware_asset([("fw.bin", "x")]), None);
    }

    #[test]
    fn release_url() {
        assert_eq!(
            latest_release_url("acme", "fridge"),
            "https://api.github.com/repos/acme/fridge/releases/latest"
        );
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    #[test]
    fn first_check_waits_for_interval_and_grace() {
        let p = UpdatePolicy::default();
        assert!(!p.should_check(&ready(4 * MIN)));
        assert!(!p.should_check(&ready(60 * MIN)));
        assert!(p.should_check(&ready(60 * MIN + 1)));
    }

    #[test]
    fn every_condition_blocks() {
        let p = UpdatePolicy::new(MIN, 0, MIN);
        let now = 10 * MIN;
        assert!(p.should_check(&ready(now)));
        assert!(!p.should_check(&UpdateConditions { connected: false, ..ready(now) }));
        assert!(!p.should_check(&UpdateConditions { auto_enabled: false, ..ready(now) }));
        assert!(!p.should_check(&UpdateConditions { compressor_on: true, ..ready(now) }));
    }

    #[test]
    fn boot_grace_blocks_short_interval() {
        let p = UpdatePolicy::new(MIN, 5 * MIN, MIN);
        assert!(!p.should_check(&ready(5 * MIN)));
        assert!(p.should_check(&ready(5 * MIN + 1)));
    }

    #[test]
    fn up_to_date_reschedules() {
        let mut p = UpdatePolicy::default().with_current(FirmwareVersion::new(1, 0, 6));
        let mut u = MockUpdater::with_release(release("v1.0.6", Some("url")));
        let now = 61 * MIN;
        assert_eq!(p.run_automatic(&mut u, &ready(now)), UpdateOutcome::UpToDate);
        assert_eq!(p.last_check_ms(), Some(now));
        assert_eq!(p.run_automatic(&mut u, &ready(now + MIN)), UpdateOutcome::Skipped);
        assert_eq!(u.check_count, 1);
    }

    #[test]
    fn newer_release_installs() {
        let mut p = UpdatePolicy::default().with_current(FirmwareVersion::new(1, 0, 6));
        let mut u = MockUpdater::with_release(release("v1.1.0", Some("https://x/fw.bin")));
        assert_eq!(
            p.run_automatic(&mut u, &ready(61 * MIN)),
            UpdateOutcome::Installed(FirmwareVersion::new(1, 1, 0))
        );
        assert_eq!(u.installs, ["https://x/fw.bin"]);
        assert!(!p.in_progress());
    }

    #[test]
    fn missing_image_is_reported() {
        let mut p = UpdatePolicy::default().with_current(FirmwareVersion::new(1, 0, 0));
        let mut u = MockUpdater::with_release(release("2.0.0", None));
        assert_eq!(
            p.run_automatic(&mut u, &ready(61 * MIN)),
            UpdateOutcome::NoImage(FirmwareVersion::new(2, 0, 0))
        );
        assert!(u.installs.is_empty());
    }

    #[test]
    fn failed_install_backs_off() {
        let mut p = UpdatePolicy::default().with_current(FirmwareVersion::new(1, 0, 0));
        let mut u = MockUpdater::with_release(release("1.0.1", Some("url")));
        u.fail_install = true;
        let now = 61 * MIN;
        assert_eq!(p.run_automatic(&mut u, &ready(now)), UpdateOutcome::InstallFailed);

        // Not even after the normal interval.
        assert!(!p.should_check(&ready(now + 61 * MIN)));
        assert!(p.should_check(&ready(now + 24 * 60 * MIN + 1)));
    }

    #[test]
    fn check_failure_propagates() {
        let mut p = UpdatePolicy::default();
        let mut u = MockUpdater::default();
        assert!(p.check(&mut u, 0).is_err());
        assert_eq!(
            p.run_automatic(&mut u, &ready(61 * MIN)),
            UpdateOutcome::CheckFailed
        );
    }

    #[test]
    fn manual_check_reports() {
        let mut p = UpdatePolicy::default().with_current(FirmwareVersion::new(1, 0, 6));
        let mut u = MockUpdater::with_release(release("v1.0.7", Some("url")));
        let check = p.check(&mut u, 1234).unwrap();
        assert!(check.update_available);
        assert_eq!(check.current_version, "1.0.6");
        assert_eq!(check.latest_version, "v1.0.7");
        assert_eq!(p.last_check_ms(), Some(1234));
    }

    #[test]
    fn requested_install() {
        let mut p = UpdatePolicy::new(MIN, 0, 10 * MIN);
        let mut u = MockUpdater::default();
        assert_eq!(
            p.install_requested(&mut u, "https://x/firmware-a.bin", 0),
            UpdateOutcome::ManualInstalled
        );
        u.fail_install = true;
        assert_eq!(
            p.install_requested(&mut u, "https://x/firmware-a.bin", 5 * MIN),
            UpdateOutcome::InstallFailed
        );
        assert!(!p.should_check(&ready(14 * MIN)));
        assert!(p.should_check(&ready(15 * MIN + 1)));
        assert_eq!(u.installs.len(), 2);
    }
}
