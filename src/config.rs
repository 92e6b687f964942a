//! Runtime configuration shared by the firmware and the desktop server.
//!
//! This is everything that is *not* a thermostat tunable: WiFi networks, the
//! HTTP server, device identity, loop timing and firmware update settings.
//! Thermostat tunables live in [`crate::settings`] and are persisted through
//! [`crate::store`].
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::config::{Config, WebConfig, WifiConfig, WifiNetwork};
//!
//! let config = Config::default()
//!     .with_wifi(
//!         WifiConfig::default()
//!             .with_network(WifiNetwork::new("Workshop", "hunter22"))
//!             .with_network(WifiNetwork::new("Phone", "hotspot")),
//!     )
//!     .with_web(WebConfig::default().with_port(3000));
//!
//! assert_eq!(config.wifi.networks.len(), 2);
//! assert_eq!(config.loop_timing.sample_period_ms, 2000);
//! ```

use heapless::String as HString;
use heapless::Vec as HVec;

/// Maximum length for short config strings (SSIDs, names)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (release repositories, URLs)
pub const MAX_LONG_STRING: usize = 128;

/// Maximum number of stored WiFi networks.
pub const MAX_WIFI_NETWORKS: usize = 5;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

fn utf8_prefix(s: &str, max: usize) -> &str {
    let end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= max)
        .last()
        .unwrap_or(0);
    &s[..end]
}

/// Create a ShortString from a &str, truncating on a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let _ = hs.push_str(utf8_prefix(s, MAX_SHORT_STRING));
    hs
}

/// Create a LongString from a &str, truncating on a char boundary if too long
pub fn long_string(s: &str) -> LongString {
    let mut hs = LongString::new();
    let _ = hs.push_str(utf8_prefix(s, MAX_LONG_STRING));
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete runtime configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi station configuration
    pub wifi: WifiConfig,
    /// Web server configuration
    pub web: WebConfig,
    /// Device identification
    pub device: DeviceConfig,
    /// Control loop timing
    pub loop_timing: LoopConfig,
    /// Firmware update settings
    pub update: UpdateConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set loop timing
    pub fn with_loop_timing(mut self, loop_timing: LoopConfig) -> Self {
        self.loop_timing = loop_timing;
        self
    }

    /// Set update configuration
    pub fn with_update(mut self, update: UpdateConfig) -> Self {
        self.update = update;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// One stored WiFi network.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiNetwork {
    /// Network SSID
    pub ssid: ShortString,
    /// Network password (empty for open networks)
    pub password: ShortString,
    /// Skipped when false
    pub enabled: bool,
}

impl WifiNetwork {
    /// Enabled network with the given credentials.
    pub fn new(ssid: &str, password: &str) -> Self {
        Self {
            ssid: short_string(ssid),
            password: short_string(password),
            enabled: true,
        }
    }

    /// Enable or disable this network
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// WiFi station configuration.
///
/// Networks are tried in the order they were added; the first one that
/// connects wins. While disconnected the firmware retries every
/// `reconnect_interval_ms`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// Networks in priority order
    pub networks: HVec<WifiNetwork, MAX_WIFI_NETWORKS>,
    /// Per-network connection timeout in milliseconds
    pub connect_timeout_ms: u32,
    /// Interval between reconnect attempts while offline
    pub reconnect_interval_ms: u32,
    /// Whether WiFi is enabled
    pub enabled: bool,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            networks: HVec::new(),
            connect_timeout_ms: 15_000,
            reconnect_interval_ms: 30_000,
            enabled: true,
        }
    }
}

impl WifiConfig {
    /// Append a network. Ignored once [`MAX_WIFI_NETWORKS`] are stored.
    pub fn with_network(mut self, network: WifiNetwork) -> Self {
        if self.networks.push(network).is_err() {
            log::warn!("WiFi network list full, ignoring extra entry");
        }
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the reconnect interval
    pub fn with_reconnect_interval_ms(mut self, ms: u32) -> Self {
        self.reconnect_interval_ms = ms;
        self
    }

    /// Enable or disable WiFi
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enabled networks with a non-empty SSID, in priority order.
    pub fn candidates(&self) -> impl Iterator<Item = &WifiNetwork> {
        self.networks
            .iter()
            .filter(|n| n.enabled && !n.ssid.is_empty())
    }

    /// Check if at least one network can be tried
    pub fn is_configured(&self) -> bool {
        self.enabled && self.candidates().next().is_some()
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
    /// Whether web server is enabled
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 80,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Enable or disable web server
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("rs-fridge"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Loop Config
// ============================================================================

/// Control loop timing.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopConfig {
    /// Sensor sampling and engine evaluation period
    pub sample_period_ms: u32,
    /// Main loop period (command drain, LED, housekeeping)
    pub loop_period_ms: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 2000,
            loop_period_ms: 100,
        }
    }
}

impl LoopConfig {
    /// Set the sampling period
    pub fn with_sample_period_ms(mut self, ms: u32) -> Self {
        self.sample_period_ms = ms.max(1);
        self
    }

    /// Set the loop period
    pub fn with_loop_period_ms(mut self, ms: u32) -> Self {
        self.loop_period_ms = ms.max(1);
        self
    }
}

// ============================================================================
// Update Config
// ============================================================================

/// Firmware update settings.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateConfig {
    /// Release repository owner
    pub owner: ShortString,
    /// Release repository name
    pub repo: ShortString,
    /// Minimum time between automatic checks
    pub check_interval_ms: u64,
    /// No automatic check before this much uptime
    pub boot_grace_ms: u64,
    /// Delay before retrying after a failed install
    pub retry_backoff_ms: u64,
    /// HTTP timeout for release queries and downloads
    pub http_timeout_ms: u32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            owner: short_string("jack-cbr2000"),
            repo: short_string("Fridge_Control"),
            check_interval_ms: 60 * 60_000,
            boot_grace_ms: 5 * 60_000,
            retry_backoff_ms: 24 * 60 * 60_000,
            http_timeout_ms: 15_000,
        }
    }
}

impl UpdateConfig {
    /// Set the release repository
    pub fn with_repository(mut self, owner: &str, repo: &str) -> Self {
        self.owner = short_string(owner);
        self.repo = short_string(repo);
        self
    }

    /// Set the check interval
    pub fn with_check_interval_ms(mut self, ms: u64) -> Self {
        self.check_interval_ms = ms;
        self
    }

    /// Set the boot grace period
    pub fn with_boot_grace_ms(mut self, ms: u64) -> Self {
        self.boot_grace_ms = ms;
        self
    }

    /// Set the retry back-off
    pub fn with_retry_backoff_ms(mut self, ms: u64) -> Self {
        self.retry_backoff_ms = ms;
        self
    }

    /// Check interval in whole minutes, as reported by the status API.
    pub fn check_interval_minutes(&self) -> u64 {
        self.check_interval_ms / 60_000
    }

    /// Build the update policy these settings describe.
    pub fn policy(&self) -> crate::update::UpdatePolicy {
        crate::update::UpdatePolicy::new(
            self.check_interval_ms,
            self.boot_grace_ms,
            self.retry_backoff_ms,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.web.port, 80);
        assert_eq!(config.loop_timing.sample_period_ms, 2000);
        assert_eq!(config.loop_timing.loop_period_ms, 100);
        assert_eq!(config.update.check_interval_minutes(), 60);
        assert!(!config.wifi.is_configured());
    }

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn long_string_truncation() {
        let long_input = "b".repeat(200);
        let s = long_string(&long_input);
        assert_eq!(s.len(), MAX_LONG_STRING);
    }

    #[test]
    fn string_helpers_utf8_boundary() {
        // 17 four-byte chars = 68 bytes, only 16 fit
        let input = "🧊".repeat(17);
        let s = short_string(&input);
        assert_eq!(s.len(), 64);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_web(WebConfig::default().with_port(3000).with_cors(false))
            .with_device(DeviceConfig::default().with_name("Garage fridge"))
            .with_loop_timing(LoopConfig::default().with_sample_period_ms(500))
            .with_update(UpdateConfig::default().with_repository("me", "fw"));

        assert_eq!(config.web.port, 3000);
        assert!(!config.web.cors_permissive);
        assert_eq!(config.device.name.as_str(), "Garage fridge");
        assert_eq!(config.loop_timing.sample_period_ms, 500);
        assert_eq!(config.update.owner.as_str(), "me");
        assert_eq!(config.update.repo.as_str(), "fw");
    }

    // =========================================================================
    // WifiConfig Tests
    // =========================================================================

    #[test]
    fn wifi_config_default() {
        let wifi = WifiConfig::default();
        assert!(wifi.networks.is_empty());
        assert_eq!(wifi.reconnect_interval_ms, 30_000);
        assert!(wifi.enabled);
    }

    #[test]
    fn wifi_candidates_keep_priority_order() {
        let wifi = WifiConfig::default()
            .with_network(WifiNetwork::new("first", "a"))
            .with_network(WifiNetwork::new("off", "b").with_enabled(false))
            .with_network(WifiNetwork::new("", "c"))
            .with_network(WifiNetwork::new("second", ""));

        let ssids: heapless::Vec<&str, 5> = wifi.candidates().map(|n| n.ssid.as_str()).collect();
        assert_eq!(ssids.as_slice(), &["first", "second"]);
        assert!(wifi.is_configured());
    }

    #[test]
    fn wifi_network_list_is_bounded() {
        let mut wifi = WifiConfig::default();
        for i in 0..7 {
            let ssid = if i < 5 { "kept" } else { "dropped" };
            wifi = wifi.with_network(WifiNetwork::new(ssid, ""));
        }
        assert_eq!(wifi.networks.len(), MAX_WIFI_NETWORKS);
        assert!(wifi.candidates().all(|n| n.ssid == "kept"));
    }

    #[test]
    fn wifi_disabled_is_not_configured() {
        let wifi = WifiConfig::default()
            .with_network(WifiNetwork::new("home", "pw"))
            .with_enabled(false);
        assert!(!wifi.is_configured());
    }

    // =========================================================================
    // Loop and Update Config Tests
    // =========================================================================

    #[test]
    fn loop_periods_never_zero() {
        let timing = LoopConfig::default()
            .with_sample_period_ms(0)
            .with_loop_period_ms(0);
        assert_eq!(timing.sample_period_ms, 1);
        assert_eq!(timing.loop_period_ms, 1);
    }

    #[test]
    fn update_defaults() {
        let update = UpdateConfig::default();
        assert_eq!(update.boot_grace_ms, 300_000);
        assert_eq!(update.retry_backoff_ms, 86_400_000);
        assert_eq!(update.http_timeout_ms, 15_000);
    }
}
