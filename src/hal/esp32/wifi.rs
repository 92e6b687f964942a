//! WiFi station management for the ESP32.
//!
//! Up to five networks can be configured; they are tried in order and the
//! first one that associates and gets an address wins. After a link loss
//! [`Esp32Wifi::maintain`] retries the whole list, at most once per
//! reconnect interval, so the control loop is never blocked for long.
//!
//! # Example
//!
//! ```ignore
//! use rs_fridge::hal::esp32::Esp32Wifi;
//! use rs_fridge::config::{WifiConfig, WifiNetwork};
//!
//! let config = WifiConfig::default()
//!     .with_network(WifiNetwork::new("Workshop", "secret123"))
//!     .with_network(WifiNetwork::new("Phone", "hotspot"));
//!
//! let mut wifi = Esp32Wifi::new(modem, sysloop, Some(nvs), &config)?;
//! loop {
//!     wifi.maintain(clock.now_ms());
//! }
//! ```

use std::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use crate::config::{WifiConfig, WifiNetwork};
use crate::services::NetworkStatus;

/// WiFi connection manager for ESP32.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
    config: WifiConfig,
    connected_ssid: Option<heapless::String<32>>,
    last_attempt_ms: Option<u64>,
}

impl<'a> Esp32Wifi<'a> {
    /// Start the driver and try each configured network once.
    ///
    /// Failing to connect is not an error: the controller runs offline and
    /// [`maintain`](Self::maintain) keeps retrying.
    ///
    /// # Errors
    ///
    /// Returns an error if the WiFi driver cannot be initialized.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let mut this = Self {
            wifi,
            config: config.clone(),
            connected_ssid: None,
            last_attempt_ms: None,
        };
        this.connect_any(0);
        Ok(this)
    }

    fn try_network(&mut self, network: &WifiNetwork) -> anyhow::Result<()> {
        let mut ssid: heapless::String<32> = heapless::String::new();
        ssid.push_str(network.ssid.as_str())
            .map_err(|_| anyhow::anyhow!("SSID longer than 32 bytes"))?;
        let mut password: heapless::String<64> = heapless::String::new();
        password
            .push_str(network.password.as_str())
            .map_err(|_| anyhow::anyhow!("password longer than 64 bytes"))?;

        if self.wifi.is_started()? {
            let _ = self.wifi.disconnect();
            self.wifi.stop()?;
        }
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid,
                password,
                ..Default::default()
            }))?;
        self.wifi.start()?;
        self.wifi.connect()?;
        self.wifi.wait_netif_up()?;
        Ok(())
    }

    /// Try every enabled network in order. Returns `true` once one is up.
    fn connect_any(&mut self, now_ms: u64) -> bool {
        self.last_attempt_ms = Some(now_ms);
        self.connected_ssid = None;

        let candidates: heapless::Vec<WifiNetwork, { crate::config::MAX_WIFI_NETWORKS }> =
            self.config.candidates().cloned().collect();
        for network in &candidates {
            log::info!("[WiFi] Connecting to '{}'...", network.ssid);
            match self.try_network(network) {
                Ok(()) => {
                    let mut ssid = heapless::String::new();
                    let _ = ssid.push_str(network.ssid.as_str());
                    self.connected_ssid = Some(ssid);
                    log::info!("[WiFi] Connected! IP: {:?}", self.ip_addr());
                    return true;
                }
                Err(e) => log::warn!("[WiFi] '{}' failed: {:?}", network.ssid, e),
            }
        }
        log::warn!("[WiFi] No configured network reachable");
        false
    }

    /// Reconnect after a link loss, rate-limited to the reconnect interval.
    pub fn maintain(&mut self, now_ms: u64) {
        if self.is_connected() || !self.config.is_configured() {
            return;
        }
        let due = self
            .last_attempt_ms
            .map_or(true, |t| {
                now_ms.saturating_sub(t) >= u64::from(self.config.reconnect_interval_ms)
            });
        if due {
            log::info!("[WiFi] Link down, reconnecting");
            self.connect_any(now_ms);
        }
    }

    /// Get the current IP address, if connected.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Check if WiFi is connected.
    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    /// Link state for the status response.
    pub fn status(&self) -> NetworkStatus {
        let connected = self.is_connected();
        NetworkStatus {
            connected,
            ssid: connected
                .then(|| self.connected_ssid.as_ref().map(|s| s.as_str().into()))
                .flatten(),
            ip: connected.then(|| self.ip_addr().map(|ip| ip.to_string())).flatten(),
        }
    }
}
