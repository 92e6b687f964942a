//! Desktop server for trying the web UI against a simulated cabinet.
//!
//! Runs the real controller with mock relay and valve. A thermal model of
//! the two zones stands in for the thermistors, so the compressor and
//! valve behave the way they would on hardware (at real-time speed).
//!
//! - Web UI: http://localhost:8080
//! - API:    http://localhost:8080/api/status
//!
//! # Usage
//!
//! ```sh
//! cargo run --bin desktop_server --features web
//! ```
//!
//! Settings are stored in `fridge-config.json`, or the file named by the
//! `FRIDGE_CONFIG` environment variable.

use std::sync::Arc;
use std::time::Duration;

use rs_fridge::hal::{MockRelay, MockValve, SimulatedCabinet};
use rs_fridge::persist::JsonFileStorage;
use rs_fridge::services::{run_server_with_state, SharedFridgeState, UpdateService, WebServerConfig};
use rs_fridge::{Config, FridgeController, WebConfig};
use tracing_subscriber::filter::LevelFilter;

type DesktopState = SharedFridgeState<MockRelay, MockValve, JsonFileStorage>;

/// Ambient temperature of the simulated room (°C).
const AMBIENT_C: f32 = 22.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();

    let config = Config::default().with_web(WebConfig::default().with_port(8080));

    let path = std::env::var("FRIDGE_CONFIG").unwrap_or_else(|_| "fridge-config.json".into());
    log::info!("Settings file: {}", path);

    let controller = FridgeController::new(
        MockRelay::new(),
        MockValve::new(),
        JsonFileStorage::new(path),
    );
    let state = Arc::new(SharedFridgeState::new(
        controller,
        UpdateService::new(config.update.clone()),
    ));

    tokio::spawn(control_loop(
        Arc::clone(&state),
        u64::from(config.loop_timing.sample_period_ms),
    ));

    let web_config = WebServerConfig::from_config(&config.web);
    log::info!("Web UI: http://{}", web_config.addr);
    run_server_with_state(state, web_config).await?;
    Ok(())
}

/// Step the cabinet model and run one control cycle per sample period.
async fn control_loop(state: Arc<DesktopState>, period_ms: u64) {
    let mut cabinet = SimulatedCabinet::new(AMBIENT_C).with_temps(8.0, 6.0);
    let mut interval = tokio::time::interval(Duration::from_millis(period_ms));

    loop {
        interval.tick().await;

        let (running, zone) = state.with_controller(|c| (c.relay().running, c.valve().zone));
        cabinet.step(period_ms, running, zone);

        match state.run_cycle(&mut cabinet) {
            Ok(Some(decision)) => log::debug!("decision: {:?}", decision),
            Ok(None) => {}
            Err(e) => log::error!("control cycle failed: {}", e),
        }
        state.poll_updates(false);
    }
}
