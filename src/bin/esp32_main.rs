//! ESP32 dual-zone fridge controller.
//!
//! This is the main entry point for the physical controller. It runs a
//! 10 Hz loop that:
//! - Applies commands queued by the HTTP API (if enabled)
//! - Samples both thermistors every 2 s and runs the control engine
//! - Mirrors the compressor state on the status LED
//! - Publishes state for the HTTP API and web UI (if enabled)
//! - Keeps WiFi up and runs firmware updates (if enabled)
//!
//! # Build
//!
//! ```bash
//! # Control only (settings are not persisted)
//! cargo build --release --features esp32
//!
//! # WiFi + HTTP API
//! WIFI_SSID=... WIFI_PASSWORD=... cargo build --release --features esp32-http
//!
//! # Everything, including firmware updates
//! cargo build --release --features esp32-net
//! ```

use std::thread;
use std::time::Duration;

use esp_idf_hal::adc::oneshot::AdcDriver;
use esp_idf_hal::peripherals::Peripherals;
use rs_fridge::hal::esp32::{Esp32Clock, Esp32Led, Esp32Relay, Esp32Thermistors, Esp32Valve};
use rs_fridge::traits::{Clock, ThermistorAdc};
use rs_fridge::{Config, FridgeController, FridgeError};

fn config() -> Config {
    #[allow(unused_mut)]
    let mut wifi = rs_fridge::WifiConfig::default();
    #[cfg(feature = "wifi")]
    for (ssid, password) in [
        (option_env!("WIFI_SSID"), option_env!("WIFI_PASSWORD")),
        (option_env!("WIFI_SSID_2"), option_env!("WIFI_PASSWORD_2")),
        (option_env!("WIFI_SSID_3"), option_env!("WIFI_PASSWORD_3")),
    ] {
        if let Some(ssid) = ssid.filter(|s| !s.is_empty()) {
            wifi = wifi.with_network(rs_fridge::WifiNetwork::new(ssid, password.unwrap_or("")));
        }
    }

    Config::default()
        .with_wifi(wifi)
        .with_web(rs_fridge::WebConfig::default().with_port(80))
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("rs-fridge {} starting", rs_fridge::update::CURRENT_VERSION);

    let config = config();
    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Outputs and sensors
    // =========================================================================
    let relay = Esp32Relay::new(peripherals.pins.gpio4)?;
    let valve = Esp32Valve::new(peripherals.pins.gpio2)?;
    let mut led = Esp32Led::new(peripherals.pins.gpio5)?;
    log::info!("[OK] Relay GPIO4, solenoid GPIO2, LED GPIO5");

    let adc1 = AdcDriver::new(peripherals.adc1)?;
    let mut thermistors =
        Esp32Thermistors::new(&adc1, peripherals.pins.gpio33, peripherals.pins.gpio32)?;
    log::info!("[OK] Thermistors on GPIO33 (left) and GPIO32 (right)");

    // =========================================================================
    // Storage and controller
    // =========================================================================
    #[cfg(feature = "wifi")]
    let nvs = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;

    #[cfg(feature = "wifi")]
    let storage = rs_fridge::hal::esp32::NvsStorage::new(nvs.clone())?;
    #[cfg(not(feature = "wifi"))]
    let storage = {
        log::warn!("[SKIP] No NVS without the wifi feature; settings will not persist");
        rs_fridge::hal::MemoryStorage::new()
    };

    let mut controller = FridgeController::new(relay, valve, storage);
    let clock = Esp32Clock::new();

    // =========================================================================
    // WiFi and wall clock
    // =========================================================================
    #[cfg(feature = "wifi")]
    let mut wifi = {
        let sysloop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
        rs_fridge::hal::esp32::Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs), &config.wifi)?
    };

    #[cfg(feature = "wifi")]
    let _sntp = esp_idf_svc::sntp::EspSntp::new_default()?;

    // =========================================================================
    // HTTP API and firmware updates
    // =========================================================================
    #[cfg(feature = "esp32-http")]
    let (shared, _server) = {
        use rs_fridge::hal::esp32::{Esp32HttpServer, Esp32SharedState};
        use rs_fridge::services::{FridgeSnapshot, UpdateService};
        use std::sync::Arc;

        #[allow(unused_mut)]
        let mut updates = UpdateService::new(config.update.clone());
        #[cfg(feature = "esp32-ota")]
        {
            updates = updates
                .with_updater(rs_fridge::hal::esp32::Esp32Updater::new(&config.update));
        }

        let snapshot = FridgeSnapshot::capture(&controller, clock.now_ms(), wifi.status());
        let shared = Arc::new(Esp32SharedState::new(snapshot, updates));
        let server = Esp32HttpServer::new(&config.web, shared.clone())?;
        (shared, server)
    };

    log::info!("Starting control loop");

    let sample_period_ms = u64::from(config.loop_timing.sample_period_ms);
    let loop_period = Duration::from_millis(u64::from(config.loop_timing.loop_period_ms));
    let mut last_sample_ms: Option<u64> = None;

    // =========================================================================
    // Main Control Loop
    // =========================================================================
    loop {
        let now = clock.now_ms();

        #[cfg(feature = "esp32-http")]
        shared.drain_into(&mut controller, now);

        // ---------------------------------------------------------------------
        // Sample and evaluate
        // ---------------------------------------------------------------------
        let sample_due = last_sample_ms.map_or(true, |t| now.saturating_sub(t) >= sample_period_ms);
        if sample_due {
            last_sample_ms = Some(now);
            // A sample is logged whenever both zones have a value, held or fresh.
            let logged = match thermistors.read_pair() {
                Ok(raw) => !matches!(
                    controller.record_sample(raw, clock.log_timestamp_s()),
                    Err(FridgeError::NoReading)
                ),
                Err(e) => {
                    log::warn!("thermistor read failed: {:?}", e);
                    false
                }
            };
            if let Err(e) = controller.tick(now) {
                log::error!("control tick failed: {}", e);
            }

            #[cfg(feature = "esp32-http")]
            if logged {
                if let Some(entry) = controller.history().latest() {
                    shared.record(*entry);
                }
            }
            #[cfg(not(feature = "esp32-http"))]
            let _ = logged;
        }

        if let Err(e) = controller.sync_indicator(&mut led) {
            log::warn!("{}", e);
        }

        #[cfg(feature = "wifi")]
        wifi.maintain(now);

        #[cfg(feature = "esp32-http")]
        shared.publish(rs_fridge::services::FridgeSnapshot::capture(
            &controller,
            now,
            wifi.status(),
        ));

        // ---------------------------------------------------------------------
        // Firmware updates
        // ---------------------------------------------------------------------
        #[cfg(feature = "esp32-ota")]
        if sample_due {
            use rs_fridge::update::UpdateConditions;

            let updates = shared.update_service();
            let held = if updates.has_pending_install() {
                log::info!("[OTA] Stopping compressor before install");
                controller.hold_for_install(now).unwrap_or_else(|e| {
                    log::warn!("[OTA] Could not stop compressor: {}", e);
                    false
                })
            } else {
                false
            };
            let _ = controller.sync_indicator(&mut led);

            let outcome = updates.poll(&UpdateConditions {
                connected: wifi.is_connected(),
                auto_enabled: controller.auto_updates_enabled(),
                compressor_on: controller.controller_state().compressor_on,
                now_ms: now,
            });
            if outcome.needs_restart() {
                log::info!("[OTA] Update installed, restarting");
                thread::sleep(Duration::from_secs(1));
                esp_idf_hal::reset::restart();
            }
            controller.finish_install(&outcome, held);
        }

        thread::sleep(loop_period);
    }
}
