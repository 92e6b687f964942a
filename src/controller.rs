//! The fridge controller: sensors in, engine decision, actuators out.
//!
//! [`FridgeController`] owns the compressor relay, the zone valve, the
//! configuration store, the engine state and the temperature history. The
//! periodic driver calls [`record_sample`](FridgeController::record_sample)
//! every sampling period and [`tick`](FridgeController::tick) every loop.
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::{FridgeController, Zone};
//! use rs_fridge::engine::Decision;
//! use rs_fridge::hal::{MemoryStorage, MockRelay, MockValve};
//! use rs_fridge::sensor::{resistance_to_adc, NtcParams};
//! use rs_fridge::traits::RawReadings;
//!
//! let mut controller =
//!     FridgeController::new(MockRelay::new(), MockValve::new(), MemoryStorage::new());
//!
//! // Left at 10 °C, right at 2 °C.
//! let p = NtcParams::DEFAULT;
//! let raw = RawReadings {
//!     left: resistance_to_adc(p.resistance_at(10.0)),
//!     right: resistance_to_adc(p.resistance_at(2.0)),
//! };
//!
//! let now = 5 * 60_000; // past the boot rest period
//! controller.record_sample(raw, now / 1000).unwrap();
//! assert_eq!(controller.tick(now).unwrap(), Some(Decision::Start(Zone::Left)));
//! assert!(controller.relay().running);
//! ```

use crate::commands::{CalibrationSlot, CommandOutcome, CommandQueue, ControlCommand};
use crate::engine::{
    self, Actuation, ControllerState, Decision, Phase, Status, Step, StopReason, Temperatures,
};
use crate::error::{CalibrationError, FridgeError, SensorError};
use crate::history::{LogEntry, TemperatureLog};
use crate::sensor::{read_zone_temperature, CalibrationPoint, NtcCalibration};
use crate::settings::ControllerConfig;
use crate::store::ConfigStore;
use crate::update::UpdateOutcome;
use crate::traits::{
    CompressorRelay, ConfigStorage, RawReadings, StatusIndicator, Zone, ZoneValve,
};

/// Main fridge controller.
///
/// # Type Parameters
///
/// - `R`: compressor relay ([`CompressorRelay`])
/// - `V`: zone valve ([`ZoneValve`])
/// - `S`: configuration medium ([`ConfigStorage`])
///
/// # Thread Safety
///
/// The controller itself is not thread-safe. The web layer wraps it in
/// `SharedFridgeState`; the ESP32 firmware keeps it on the main loop and
/// feeds it through a [`CommandQueue`].
pub struct FridgeController<R: CompressorRelay, V: ZoneValve, S: ConfigStorage> {
    relay: R,
    valve: V,
    store: ConfigStore<S>,
    state: ControllerState,
    temps: [Option<f32>; 2],
    raw: [Option<u16>; 2],
    history: TemperatureLog,
    last_decision: Option<Decision>,
}

impl<R: CompressorRelay, V: ZoneValve, S: ConfigStorage> FridgeController<R, V, S> {
    /// Create a controller, loading configuration from `storage`.
    ///
    /// Actuators are assumed to start de-energised (compressor off, valve on
    /// the left zone).
    pub fn new(relay: R, valve: V, storage: S) -> Self {
        Self {
            relay,
            valve,
            store: ConfigStore::load(storage),
            state: ControllerState::default(),
            temps: [None; 2],
            raw: [None; 2],
            history: TemperatureLog::default(),
            last_decision: None,
        }
    }

    /// Replace the history buffer with one of `capacity` entries.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = TemperatureLog::with_capacity(capacity);
        self
    }

    // ========================================================================
    // Periodic driver
    // ========================================================================

    /// Convert a raw sample pair and append it to the history.
    ///
    /// A zone whose sample cannot be converted keeps its previous value and
    /// the first such error is returned. The history entry is written as
    /// long as both zones have a value, held or fresh.
    pub fn record_sample(
        &mut self,
        raw: RawReadings,
        timestamp_s: u64,
    ) -> Result<Temperatures, FridgeError> {
        let params = self.store.calibration().active_params();
        let offset = self.store.config().temperature_offset;
        let mut first_error: Option<SensorError> = None;

        for zone in Zone::ALL {
            let value = raw.get(zone);
            match read_zone_temperature(value, &params, offset) {
                Ok(t) => {
                    self.temps[zone.index()] = Some(t);
                    self.raw[zone.index()] = Some(value);
                }
                Err(e) => {
                    log::warn!("{} sensor: {}, holding previous value", zone.as_str(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        let temps = self.temperatures().ok_or(FridgeError::NoReading)?;
        log::debug!("temps left={:.2} right={:.2}", temps.left, temps.right);

        let config = self.store.config();
        self.history.append(LogEntry {
            timestamp: timestamp_s,
            left_temp: temps.left,
            right_temp: temps.right,
            left_setpoint: config.left_setpoint,
            right_setpoint: config.right_setpoint,
        });

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(temps),
        }
    }

    /// Run one control cycle.
    ///
    /// Returns `None` before the first valid sample, when the engine cannot
    /// run. The kill switch still applies then, and a compressor left
    /// running without readings is stopped. In manual override the engine
    /// is skipped and `Some(Decision::Overridden)` is returned.
    ///
    /// If a hardware write fails the compressor is forced off, the state
    /// records it as off, and the error is returned.
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<Decision>, FridgeError> {
        if self.state.manual_override {
            self.state.phase = Phase::Manual;
            return Ok(Some(Decision::Overridden));
        }
        let step = match self.temperatures() {
            Some(temps) => engine::evaluate(&self.state, self.store.config(), temps, now_ms),
            None => {
                let decision = if !self.state.system_enabled {
                    Decision::Disable
                } else if self.state.compressor_on {
                    Decision::Stop(StopReason::NoReading)
                } else {
                    self.state.status = Status::NoReading;
                    return Ok(None);
                };
                let (state, actuation) = engine::apply(&self.state, decision, now_ms);
                Step {
                    decision,
                    actuation,
                    state,
                }
            }
        };
        self.log_step(&step);

        if let Err(e) = self.actuate(step.actuation) {
            self.fail_safe(step.state, now_ms);
            return Err(e);
        }

        self.state = step.state;
        self.last_decision = Some(step.decision);
        Ok(Some(step.decision))
    }

    fn actuate(&mut self, act: Actuation) -> Result<(), FridgeError> {
        // Valve before compressor so refrigerant never flows to the wrong zone.
        if let Some(zone) = act.valve {
            self.valve.select(zone).map_err(FridgeError::valve)?;
        }
        if let Some(on) = act.compressor {
            self.relay.set_running(on).map_err(FridgeError::relay)?;
        }
        Ok(())
    }

    fn fail_safe(&mut self, mut next: ControllerState, now_ms: u64) {
        if let Err(e) = self.relay.set_running(false) {
            log::warn!("relay release after fault failed: {:?}", e);
        }
        if next.compressor_on || self.state.compressor_on {
            next.stop(now_ms);
        }
        next.phase = Phase::Idle;
        next.status = Status::ActuatorFault;
        self.state = next;
    }

    fn log_step(&self, step: &Step) {
        if self.last_decision == Some(step.decision) {
            return;
        }
        match step.decision {
            Decision::Start(zone) => log::info!("compressor start, cooling {}", zone.as_str()),
            Decision::Stop(reason) => log::info!("compressor stop ({:?})", reason),
            Decision::Switch { from, to } => {
                log::info!("zone switch {} -> {}", from.as_str(), to.as_str())
            }
            Decision::Disable if self.state.compressor_on => {
                log::info!("system disabled, compressor stop")
            }
            other => log::debug!("control: {:?}", other),
        }
    }

    /// Mirror the compressor state on the status LED.
    pub fn sync_indicator<L: StatusIndicator>(&self, led: &mut L) -> Result<(), FridgeError> {
        led.set_lit(self.state.compressor_on)
            .map_err(FridgeError::indicator)
    }

    // ========================================================================
    // Operator commands
    // ========================================================================

    /// Apply an operator command.
    pub fn apply_command(
        &mut self,
        cmd: ControlCommand,
        now_ms: u64,
    ) -> Result<CommandOutcome, FridgeError> {
        log::debug!("command {}", cmd.name());
        match cmd {
            ControlCommand::SetSystemEnabled(enabled) => {
                self.state.system_enabled = enabled;
                // The kill switch always hands control back to the engine so
                // a manually started compressor is stopped on the next tick.
                self.state.manual_override = false;
                log::info!("system {}", if enabled { "enabled" } else { "disabled" });
            }
            ControlCommand::SetManualOverride(active) => {
                self.state.manual_override = active;
                if active {
                    self.state.phase = Phase::Manual;
                } else {
                    self.state.status = Status::ReturnedToAuto;
                    log::info!("returned to automatic control");
                }
            }
            ControlCommand::ManualCompressor(on) => {
                self.relay.set_running(on).map_err(FridgeError::relay)?;
                if on {
                    if !self.state.compressor_on {
                        self.state.compressor_on = true;
                        self.state.last_start_ms = now_ms;
                    }
                } else if self.state.compressor_on {
                    self.state.stop(now_ms);
                } else {
                    self.state.cooling = None;
                }
                self.enter_manual(Status::ManualCompressor(on));
            }
            ControlCommand::ManualValve(zone) => {
                self.valve.select(zone).map_err(FridgeError::valve)?;
                self.state.select_zone(zone, now_ms);
                if self.state.compressor_on {
                    self.state.cooling = Some(zone);
                }
                self.enter_manual(Status::ManualValve(zone));
            }
            ControlCommand::UpdateConfig(patch) => {
                let (config, corrected) = self.store.update(&patch);
                return Ok(CommandOutcome::ConfigUpdated { config, corrected });
            }
            ControlCommand::CaptureCalibration { slot, actual_temp } => {
                return self.capture_calibration(slot, actual_temp);
            }
            ControlCommand::ResetCalibration => {
                self.store.update_calibration(NtcCalibration::reset);
                log::info!("calibration reset to defaults");
            }
            ControlCommand::SetAutoUpdates(enabled) => {
                self.store.set_auto_updates(enabled);
                log::info!("auto-updates {}", if enabled { "enabled" } else { "disabled" });
            }
        }
        Ok(CommandOutcome::Applied)
    }

    fn enter_manual(&mut self, status: Status) {
        self.state.manual_override = true;
        self.state.phase = Phase::Manual;
        self.state.status = status;
        log::info!("manual: {}", status);
    }

    fn capture_calibration(
        &mut self,
        slot: CalibrationSlot,
        actual_temp: f32,
    ) -> Result<CommandOutcome, FridgeError> {
        if !actual_temp.is_finite() {
            return Err(CalibrationError::InvalidTemperature.into());
        }
        let raw = self.raw_readings().ok_or(FridgeError::NoReading)?;
        let point = CalibrationPoint::capture(actual_temp, raw)?;

        let params = match slot {
            CalibrationSlot::Point1 => {
                self.store.update_calibration(|cal| cal.set_point1(point));
                None
            }
            CalibrationSlot::Point2 => {
                let params = self.store.update_calibration(|cal| cal.set_point2(point))?;
                log::info!(
                    "calibration complete: beta={:.1} nominal {:.1} ohm at {:.1} C",
                    params.beta,
                    params.nominal_resistance,
                    params.nominal_temp_c
                );
                Some(params)
            }
        };
        Ok(CommandOutcome::CalibrationCaptured { point, params })
    }

    // ========================================================================
    // Firmware install hand-off
    // ========================================================================

    /// Stop the compressor and keep the engine off ahead of a firmware install.
    ///
    /// Returns `true` when this call entered manual override, in which case
    /// [`finish_install`](Self::finish_install) hands control back.
    pub fn hold_for_install(&mut self, now_ms: u64) -> Result<bool, FridgeError> {
        let was_manual = self.state.manual_override;
        self.apply_command(ControlCommand::ManualCompressor(false), now_ms)?;
        Ok(!was_manual)
    }

    /// Settle after an install attempt that did not end in a restart.
    ///
    /// A failed install turns automatic updates off. Control returns to the
    /// engine if [`hold_for_install`](Self::hold_for_install) took it.
    pub fn finish_install(&mut self, outcome: &UpdateOutcome, held: bool) {
        if *outcome == UpdateOutcome::InstallFailed {
            log::warn!("disabling automatic updates after failed install");
            self.store.set_auto_updates(false);
        }
        if held && !outcome.needs_restart() {
            self.state.manual_override = false;
            self.state.status = Status::ReturnedToAuto;
            log::info!("install finished, returned to automatic control");
        }
    }

    /// Apply every queued command in order. Returns how many were applied.
    ///
    /// A failing command is logged and does not stop the drain.
    pub fn drain_commands<const N: usize>(
        &mut self,
        queue: &mut CommandQueue<N>,
        now_ms: u64,
    ) -> usize {
        let mut applied = 0;
        while let Some(cmd) = queue.pop() {
            match self.apply_command(cmd, now_ms) {
                Ok(_) => applied += 1,
                Err(e) => log::warn!("command {} failed: {}", cmd.name(), e),
            }
        }
        applied
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Snapshot for UI/API.
    pub fn state(&self, now_ms: u64) -> FridgeState {
        let temps = self.temperatures();
        FridgeState {
            left_temp: temps.map(|t| t.left),
            right_temp: temps.map(|t| t.right),
            compressor_on: self.state.compressor_on,
            left_cooling: self.state.cooling == Some(Zone::Left),
            right_cooling: self.state.cooling == Some(Zone::Right),
            current_zone: self.state.active_zone.index(),
            current_zone_name: self.state.active_zone.label(),
            system_enabled: self.state.system_enabled,
            manual_mode: self.state.manual_override,
            status: self.state.status,
            phase: self.state.phase.as_str(),
            uptime: now_ms / 1000,
        }
    }

    /// Engine state.
    pub fn controller_state(&self) -> &ControllerState {
        &self.state
    }

    /// Latest temperatures, once both zones have a value.
    pub fn temperatures(&self) -> Option<Temperatures> {
        match self.temps {
            [Some(left), Some(right)] => Some(Temperatures { left, right }),
            _ => None,
        }
    }

    /// Last raw readings that converted successfully.
    pub fn raw_readings(&self) -> Option<RawReadings> {
        match self.raw {
            [Some(left), Some(right)] => Some(RawReadings { left, right }),
            _ => None,
        }
    }

    /// Tunables in force.
    pub fn config(&self) -> &ControllerConfig {
        self.store.config()
    }

    /// Calibration in force.
    pub fn calibration(&self) -> &NtcCalibration {
        self.store.calibration()
    }

    /// Whether automatic firmware updates are allowed.
    pub fn auto_updates_enabled(&self) -> bool {
        self.store.auto_updates_enabled()
    }

    /// Temperature history.
    pub fn history(&self) -> &TemperatureLog {
        &self.history
    }

    /// Configuration store.
    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    /// The compressor relay.
    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// Mutable access to the compressor relay.
    pub fn relay_mut(&mut self) -> &mut R {
        &mut self.relay
    }

    /// The zone valve.
    pub fn valve(&self) -> &V {
        &self.valve
    }

    /// Mutable access to the zone valve.
    pub fn valve_mut(&mut self) -> &mut V {
        &mut self.valve
    }

    /// Last decision taken by [`tick`](Self::tick).
    pub fn last_decision(&self) -> Option<Decision> {
        self.last_decision
    }
}

/// Full state snapshot for UI/API.
///
/// Serialises with the field names the web page expects.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FridgeState {
    /// Left temperature, once sampled.
    pub left_temp: Option<f32>,
    /// Right temperature, once sampled.
    pub right_temp: Option<f32>,
    /// Compressor relay state.
    pub compressor_on: bool,
    /// Engine is cooling the left zone.
    pub left_cooling: bool,
    /// Engine is cooling the right zone.
    pub right_cooling: bool,
    /// Valve position as an index (0 = left, 1 = right).
    pub current_zone: usize,
    /// Valve position as a label.
    pub current_zone_name: &'static str,
    /// Global kill switch.
    pub system_enabled: bool,
    /// Manual override active.
    pub manual_mode: bool,
    /// Status text.
    pub status: Status,
    /// Phase name.
    pub phase: &'static str,
    /// Seconds since boot.
    pub uptime: u64,
}
