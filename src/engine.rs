//! Zone arbitration and compressor protection.
//!
//! The engine is a pure function of the previous [`ControllerState`], the
//! active [`ControllerConfig`], the latest zone [`Temperatures`] and the
//! monotonic time. Each cycle is split in two steps:
//!
//! 1. [`decide`] inspects the inputs and picks one [`Decision`]
//! 2. [`apply`] turns that decision into the next state plus the
//!    [`Actuation`] the hardware layer must perform
//!
//! [`evaluate`] runs both. Nothing here touches hardware, so the whole
//! transition table is testable with plain values.
//!
//! # Transition table
//!
//! | Compressor | Condition | Decision |
//! |------------|-----------|----------|
//! | any | system disabled | [`Decision::Disable`] |
//! | on | max run exceeded or active zone satisfied, min run met | [`Decision::Stop`] |
//! | on | same, min run not met | [`Decision::HoldMinRun`] |
//! | on | warmer target differs, switch interval met | [`Decision::Switch`] |
//! | on | same, switch interval not met | [`Decision::AwaitSwitch`] |
//! | on | otherwise | [`Decision::Continue`] |
//! | off | target zone, min stop met | [`Decision::Start`] |
//! | off | target zone, min stop not met | [`Decision::AwaitMinStop`] |
//! | off | no target | [`Decision::Rest`] |
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::engine::{evaluate, ControllerState, Decision, Temperatures};
//! use rs_fridge::{ControllerConfig, Zone};
//!
//! let config = ControllerConfig::default(); // 4 °C setpoints, 1.5 °C band
//! let state = ControllerState::default();
//! let temps = Temperatures { left: 10.0, right: 2.0 };
//!
//! // Past the boot rest period, a warm left zone starts the compressor.
//! let step = evaluate(&state, &config, temps, config.min_stop_ms());
//! assert_eq!(step.decision, Decision::Start(Zone::Left));
//! assert_eq!(step.actuation.compressor, Some(true));
//! assert_eq!(step.actuation.valve, Some(Zone::Left));
//! ```

use core::fmt;

use crate::settings::ControllerConfig;
use crate::traits::Zone;

/// Latest converted temperature for each zone (°C).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Temperatures {
    /// Left zone temperature.
    pub left: f32,
    /// Right zone temperature.
    pub right: f32,
}

impl Temperatures {
    /// Temperature of one zone.
    #[inline]
    pub fn get(&self, zone: Zone) -> f32 {
        match zone {
            Zone::Left => self.left,
            Zone::Right => self.right,
        }
    }
}

/// Coarse controller phase, for display and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Global kill switch is off.
    Disabled,
    /// Compressor off.
    #[default]
    Idle,
    /// Compressor on, cooling the given zone.
    Cooling(Zone),
    /// Compressor on, a switch to `to` is waiting for the switch interval.
    SwitchPending {
        /// Zone being cooled.
        from: Zone,
        /// Zone that wants the compressor.
        to: Zone,
    },
    /// Actuators are driven by operator commands.
    Manual,
}

impl Phase {
    /// Short name for the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Disabled => "disabled",
            Phase::Idle => "idle",
            Phase::Cooling(_) => "cooling",
            Phase::SwitchPending { .. } => "switch_pending",
            Phase::Manual => "manual",
        }
    }
}

/// Why a running compressor wants to stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Continuous run time exceeded the maximum.
    MaxRunTime,
    /// The zone being cooled reached its lower threshold (or was disabled).
    ZoneSatisfied(Zone),
    /// No usable temperature reading; the compressor is not run blind.
    NoReading,
}

/// Why an idle compressor stays off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestReason {
    /// Both zones are at or below their lower thresholds.
    BothSatisfied,
    /// Only this zone is satisfied; the other is inside its deadband.
    ZoneSatisfied(Zone),
    /// Both zones are inside their deadbands.
    Idle,
}

/// What one engine cycle decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Manual override is active; the engine did nothing.
    Overridden,
    /// System disabled; the compressor is stopped if it was running.
    Disable,
    /// Start the compressor on a zone.
    Start(Zone),
    /// A zone needs cooling but the compressor has not rested long enough.
    AwaitMinStop(Zone),
    /// Nothing needs cooling.
    Rest(RestReason),
    /// Stop the compressor.
    Stop(StopReason),
    /// A stop is wanted but the minimum run time has not elapsed.
    HoldMinRun(StopReason),
    /// Move the valve to the warmer zone.
    Switch {
        /// Zone currently cooled.
        from: Zone,
        /// New zone.
        to: Zone,
    },
    /// A switch is wanted but the switch interval has not elapsed.
    AwaitSwitch {
        /// Zone currently cooled.
        from: Zone,
        /// Zone waiting for the compressor.
        to: Zone,
    },
    /// Keep cooling the current zone.
    Continue(Zone),
}

/// Human-readable explanation of the last decision.
///
/// Display only; never consulted by the control logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Status {
    /// Nothing to do.
    #[default]
    Idle,
    /// Global kill switch is off.
    SystemDisabled,
    /// Running past the maximum run time.
    MaxRunReached,
    /// A zone is satisfied.
    ZoneSatisfied(Zone),
    /// Waiting out the minimum rest time.
    WaitingMinStop,
    /// Both zones satisfied.
    BothSatisfied,
    /// Compressor cooling a zone.
    Cooling(Zone),
    /// Compressor just stopped.
    CompressorStopped,
    /// Operator switched the compressor.
    ManualCompressor(bool),
    /// Operator moved the valve.
    ManualValve(Zone),
    /// Operator handed control back to the engine.
    ReturnedToAuto,
    /// An actuator write failed and the compressor was forced off.
    ActuatorFault,
    /// No valid sensor sample yet.
    NoReading,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => f.write_str("Idle"),
            Status::SystemDisabled => f.write_str("System Disabled"),
            Status::MaxRunReached => f.write_str("Max run time reached"),
            Status::ZoneSatisfied(z) => write!(f, "{} zone satisfied", z.label()),
            Status::WaitingMinStop => f.write_str("Waiting for min stop time"),
            Status::BothSatisfied => f.write_str("Both zones satisfied"),
            Status::Cooling(z) => write!(f, "Cooling {} zone", z.label()),
            Status::CompressorStopped => f.write_str("Compressor stopped"),
            Status::ManualCompressor(true) => f.write_str("Manual Compressor ON"),
            Status::ManualCompressor(false) => f.write_str("Manual Compressor OFF"),
            Status::ManualValve(Zone::Left) => f.write_str("Manual Solenoid: LEFT zone"),
            Status::ManualValve(Zone::Right) => f.write_str("Manual Solenoid: RIGHT zone"),
            Status::ReturnedToAuto => f.write_str("Returned to automatic control"),
            Status::ActuatorFault => f.write_str("Actuator fault, compressor off"),
            Status::NoReading => f.write_str("No sensor reading"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<StopReason> for Status {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::MaxRunTime => Status::MaxRunReached,
            StopReason::ZoneSatisfied(z) => Status::ZoneSatisfied(z),
            StopReason::NoReading => Status::NoReading,
        }
    }
}

impl From<RestReason> for Status {
    fn from(reason: RestReason) -> Self {
        match reason {
            RestReason::BothSatisfied => Status::BothSatisfied,
            RestReason::ZoneSatisfied(z) => Status::ZoneSatisfied(z),
            RestReason::Idle => Status::Idle,
        }
    }
}

/// Compressor and valve bookkeeping.
///
/// Created at boot with all timers at zero and the compressor off. Only
/// [`apply`] and the manual actuator methods change it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerState {
    /// Compressor relay state.
    pub compressor_on: bool,
    /// Zone the valve points at.
    pub active_zone: Zone,
    /// Zone being actively cooled by the engine, if any.
    pub cooling: Option<Zone>,
    /// Monotonic time of the last compressor start (ms).
    pub last_start_ms: u64,
    /// Monotonic time of the last compressor stop (ms).
    pub last_stop_ms: u64,
    /// Monotonic time of the last valve movement (ms).
    pub last_switch_ms: u64,
    /// Global kill switch.
    pub system_enabled: bool,
    /// When set the engine is not run; actuators follow operator commands.
    pub manual_override: bool,
    /// Phase after the last cycle.
    pub phase: Phase,
    /// Explanation of the last decision.
    pub status: Status,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            compressor_on: false,
            active_zone: Zone::Left,
            cooling: None,
            last_start_ms: 0,
            last_stop_ms: 0,
            last_switch_ms: 0,
            system_enabled: true,
            manual_override: false,
            phase: Phase::Idle,
            status: Status::Idle,
        }
    }
}

impl ControllerState {
    /// Record a compressor start on `zone`. Returns `true` if it was off.
    pub fn start(&mut self, zone: Zone, now_ms: u64) -> bool {
        let was_off = !self.compressor_on;
        self.compressor_on = true;
        self.last_start_ms = now_ms;
        self.select_zone(zone, now_ms);
        self.cooling = Some(zone);
        was_off
    }

    /// Record a compressor stop. The valve keeps its position.
    /// Returns `true` if it was on.
    pub fn stop(&mut self, now_ms: u64) -> bool {
        let was_on = self.compressor_on;
        self.compressor_on = false;
        self.last_stop_ms = now_ms;
        self.cooling = None;
        was_on
    }

    /// Point the valve at `zone`, stamping the switch time only if it moved.
    /// Returns `true` if the zone changed.
    pub fn select_zone(&mut self, zone: Zone, now_ms: u64) -> bool {
        if zone == self.active_zone {
            return false;
        }
        self.active_zone = zone;
        self.last_switch_ms = now_ms;
        true
    }

    /// Milliseconds the compressor has been running (0 when off).
    pub fn run_time_ms(&self, now_ms: u64) -> u64 {
        if self.compressor_on {
            now_ms.saturating_sub(self.last_start_ms)
        } else {
            0
        }
    }
}

/// Hardware writes requested by one cycle. `None` means leave as is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Actuation {
    /// New compressor relay state.
    pub compressor: Option<bool>,
    /// New valve position.
    pub valve: Option<Zone>,
}

impl Actuation {
    /// No hardware change.
    pub const NONE: Self = Self {
        compressor: None,
        valve: None,
    };

    /// Whether nothing needs to be written.
    pub fn is_empty(&self) -> bool {
        self.compressor.is_none() && self.valve.is_none()
    }
}

/// Result of one [`evaluate`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// What the engine decided.
    pub decision: Decision,
    /// Hardware writes to perform.
    pub actuation: Actuation,
    /// State after the decision.
    pub state: ControllerState,
}

/// `temp > setpoint + hysteresis` on an enabled zone.
pub fn needs_cooling(config: &ControllerConfig, temps: Temperatures, zone: Zone) -> bool {
    config.enabled(zone) && temps.get(zone) > config.setpoint(zone) + config.hysteresis
}

/// Disabled, or `temp <= setpoint - hysteresis`.
pub fn is_satisfied(config: &ControllerConfig, temps: Temperatures, zone: Zone) -> bool {
    !config.enabled(zone) || temps.get(zone) <= config.setpoint(zone) - config.hysteresis
}

/// Zone that should get the compressor, if any.
///
/// When both need cooling the warmer one wins; exact ties go to the right
/// zone.
pub fn target_zone(config: &ControllerConfig, temps: Temperatures) -> Option<Zone> {
    match (
        needs_cooling(config, temps, Zone::Left),
        needs_cooling(config, temps, Zone::Right),
    ) {
        (true, true) if temps.left > temps.right => Some(Zone::Left),
        (true, true) => Some(Zone::Right),
        (true, false) => Some(Zone::Left),
        (false, true) => Some(Zone::Right),
        (false, false) => None,
    }
}

fn rest_reason(config: &ControllerConfig, temps: Temperatures) -> RestReason {
    match (
        is_satisfied(config, temps, Zone::Left),
        is_satisfied(config, temps, Zone::Right),
    ) {
        (true, true) => RestReason::BothSatisfied,
        (true, false) => RestReason::ZoneSatisfied(Zone::Left),
        (false, true) => RestReason::ZoneSatisfied(Zone::Right),
        (false, false) => RestReason::Idle,
    }
}

/// Pick this cycle's decision.
pub fn decide(
    state: &ControllerState,
    config: &ControllerConfig,
    temps: Temperatures,
    now_ms: u64,
) -> Decision {
    if state.manual_override {
        return Decision::Overridden;
    }
    if !state.system_enabled {
        return Decision::Disable;
    }

    let target = target_zone(config, temps);

    if state.compressor_on {
        let active = state.active_zone;
        let run_ms = now_ms.saturating_sub(state.last_start_ms);

        // Satisfaction is checked last so it names the reason.
        let mut stop = None;
        if run_ms > config.max_run_ms() {
            stop = Some(StopReason::MaxRunTime);
        }
        if is_satisfied(config, temps, active) {
            stop = Some(StopReason::ZoneSatisfied(active));
        }

        if let Some(reason) = stop {
            return if run_ms >= config.min_run_ms() {
                Decision::Stop(reason)
            } else {
                Decision::HoldMinRun(reason)
            };
        }

        match target {
            Some(to) if to != active => {
                let since_switch = now_ms.saturating_sub(state.last_switch_ms);
                if since_switch >= config.min_zone_switch_ms() {
                    Decision::Switch { from: active, to }
                } else {
                    Decision::AwaitSwitch { from: active, to }
                }
            }
            _ => Decision::Continue(active),
        }
    } else {
        match target {
            Some(zone) => {
                let since_stop = now_ms.saturating_sub(state.last_stop_ms);
                if since_stop >= config.min_stop_ms() {
                    Decision::Start(zone)
                } else {
                    Decision::AwaitMinStop(zone)
                }
            }
            None => Decision::Rest(rest_reason(config, temps)),
        }
    }
}

/// Apply a decision to a state.
pub fn apply(state: &ControllerState, decision: Decision, now_ms: u64) -> (ControllerState, Actuation) {
    let mut next = *state;
    let mut act = Actuation::NONE;

    match decision {
        Decision::Overridden => {}
        Decision::Disable => {
            if next.compressor_on {
                next.stop(now_ms);
                act.compressor = Some(false);
            }
            next.phase = Phase::Disabled;
            next.status = Status::SystemDisabled;
        }
        Decision::Start(zone) => {
            next.start(zone, now_ms);
            act.valve = Some(zone);
            act.compressor = Some(true);
            next.phase = Phase::Cooling(zone);
            next.status = Status::Cooling(zone);
        }
        Decision::AwaitMinStop(_) => {
            next.phase = Phase::Idle;
            next.status = Status::WaitingMinStop;
        }
        Decision::Rest(reason) => {
            next.phase = Phase::Idle;
            next.status = reason.into();
        }
        Decision::Stop(_) => {
            next.stop(now_ms);
            act.compressor = Some(false);
            next.phase = Phase::Idle;
            next.status = Status::CompressorStopped;
        }
        Decision::HoldMinRun(reason) => {
            next.cooling = Some(next.active_zone);
            next.phase = Phase::Cooling(next.active_zone);
            next.status = reason.into();
        }
        Decision::Switch { to, .. } => {
            next.select_zone(to, now_ms);
            next.cooling = Some(to);
            act.valve = Some(to);
            next.phase = Phase::Cooling(to);
            next.status = Status::Cooling(to);
        }
        Decision::AwaitSwitch { from, to } => {
            next.cooling = Some(from);
            next.phase = Phase::SwitchPending { from, to };
            next.status = Status::Cooling(from);
        }
        Decision::Continue(zone) => {
            next.cooling = Some(zone);
            next.phase = Phase::Cooling(zone);
            next.status = Status::Cooling(zone);
        }
    }

    (next, act)
}

/// Run one control cycle.
pub fn evaluate(
    state: &ControllerState,
    config: &ControllerConfig,
    temps: Temperatures,
    now_ms: u64,
) -> Step {
    let decision = decide(state, config, temps, now_ms);
    let (state, actuation) = apply(state, decision, now_ms);
    Step {
        decision,
        actuation,
        state,
    }
}
