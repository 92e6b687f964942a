//! Control engine scenarios and timing properties.

use proptest::prelude::*;
use rs_fridge::engine::{decide, evaluate, target_zone, RestReason, StopReason};
use rs_fridge::{ControllerConfig, ControllerState, Decision, Phase, Status, Temperatures, Zone};

const SEC: u64 = 1000;
const MIN: u64 = 60 * SEC;

fn temps(left: f32, right: f32) -> Temperatures {
    Temperatures { left, right }
}

fn running(zone: Zone, since: u64) -> ControllerState {
    let mut state = ControllerState::default();
    state.start(zone, since);
    state
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn warm_left_zone_starts_compressor_on_left() {
    let config = ControllerConfig::default();
    let step = evaluate(&ControllerState::default(), &config, temps(10.0, 2.0), 5 * MIN);

    assert_eq!(step.decision, Decision::Start(Zone::Left));
    assert!(step.state.compressor_on);
    assert_eq!(step.state.active_zone, Zone::Left);
    assert_eq!(step.state.cooling, Some(Zone::Left));
    assert_eq!(step.actuation.compressor, Some(true));
    assert_eq!(step.actuation.valve, Some(Zone::Left));
    assert_eq!(step.state.status, Status::Cooling(Zone::Left));
}

#[test]
fn min_run_time_guards_an_early_stop() {
    let config = ControllerConfig::default();
    let state = running(Zone::Left, 0);
    // Left at exactly setpoint - hysteresis
    let cold = temps(2.5, 3.0);

    let early = evaluate(&state, &config, cold, 30 * SEC);
    assert_eq!(
        early.decision,
        Decision::HoldMinRun(StopReason::ZoneSatisfied(Zone::Left))
    );
    assert!(early.state.compressor_on);
    assert_eq!(early.actuation.compressor, None);

    let late = evaluate(&early.state, &config, cold, 60 * SEC);
    assert_eq!(late.decision, Decision::Stop(StopReason::ZoneSatisfied(Zone::Left)));
    assert!(!late.state.compressor_on);
    assert_eq!(late.state.last_stop_ms, 60 * SEC);
    assert_eq!(late.state.active_zone, Zone::Left);
}

#[test]
fn warmer_zone_wins_when_both_need_cooling() {
    let config = ControllerConfig::default();
    assert_eq!(target_zone(&config, temps(8.0, 9.0)), Some(Zone::Right));

    let step = evaluate(&ControllerState::default(), &config, temps(8.0, 9.0), 10 * MIN);
    assert_eq!(step.decision, Decision::Start(Zone::Right));
}

#[test]
fn min_stop_time_delays_a_start() {
    let config = ControllerConfig::default();
    let state = ControllerState::default();
    let warm = temps(7.0, 3.0);

    let waiting = evaluate(&state, &config, warm, 100 * SEC);
    assert_eq!(waiting.decision, Decision::AwaitMinStop(Zone::Left));
    assert_eq!(waiting.state.status, Status::WaitingMinStop);
    assert!(!waiting.state.compressor_on);

    let started = evaluate(&waiting.state, &config, warm, 300 * SEC);
    assert_eq!(started.decision, Decision::Start(Zone::Left));
}

#[test]
fn switch_waits_for_min_zone_switch_time() {
    let config = ControllerConfig::default();
    let state = running(Zone::Left, 0);
    // Left still cooling, right now much warmer
    let t = temps(6.0, 12.0);

    let pending = evaluate(&state, &config, t, 2 * MIN);
    assert_eq!(
        pending.decision,
        Decision::AwaitSwitch {
            from: Zone::Left,
            to: Zone::Right
        }
    );
    assert_eq!(
        pending.state.phase,
        Phase::SwitchPending {
            from: Zone::Left,
            to: Zone::Right
        }
    );

    let switched = evaluate(&pending.state, &config, t, 5 * MIN);
    assert_eq!(
        switched.decision,
        Decision::Switch {
            from: Zone::Left,
            to: Zone::Right
        }
    );
    assert_eq!(switched.actuation.valve, Some(Zone::Right));
    assert_eq!(switched.actuation.compressor, None);
    assert!(switched.state.compressor_on);
    assert_eq!(switched.state.last_switch_ms, 5 * MIN);
    assert_eq!(switched.state.status.to_string(), "Cooling Right zone");
}

#[test]
fn max_run_time_stops_a_warm_zone() {
    let config = ControllerConfig::default();
    let state = running(Zone::Left, 0);

    let at_limit = decide(&state, &config, temps(9.0, 3.0), 30 * MIN);
    assert_eq!(at_limit, Decision::Continue(Zone::Left));

    let over = decide(&state, &config, temps(9.0, 3.0), 30 * MIN + 1);
    assert_eq!(over, Decision::Stop(StopReason::MaxRunTime));
}

#[test]
fn deadband_rests() {
    let config = ControllerConfig::default();
    let step = evaluate(&ControllerState::default(), &config, temps(4.0, 5.0), 10 * MIN);
    assert_eq!(step.decision, Decision::Rest(RestReason::Idle));
    assert_eq!(step.actuation.compressor, None);

    let cold = decide(&ControllerState::default(), &config, temps(0.0, 1.0), 10 * MIN);
    assert_eq!(cold, Decision::Rest(RestReason::BothSatisfied));
}

#[test]
fn disabled_zone_is_ignored() {
    let config = ControllerConfig {
        left_enabled: false,
        ..ControllerConfig::default()
    };
    assert_eq!(target_zone(&config, temps(20.0, 3.0)), None);

    // A running compressor on a disabled zone counts as satisfied.
    let state = running(Zone::Left, 0);
    let step = decide(&state, &config, temps(20.0, 3.0), 2 * MIN);
    assert_eq!(step, Decision::Stop(StopReason::ZoneSatisfied(Zone::Left)));
}

#[test]
fn disabling_the_system_stops_the_compressor() {
    let config = ControllerConfig::default();
    let mut state = running(Zone::Right, 0);
    state.system_enabled = false;

    let step = evaluate(&state, &config, temps(9.0, 9.0), 10 * SEC);
    assert_eq!(step.decision, Decision::Disable);
    assert_eq!(step.actuation.compressor, Some(false));
    assert!(!step.state.compressor_on);
    assert_eq!(step.state.phase, Phase::Disabled);

    let again = evaluate(&step.state, &config, temps(9.0, 9.0), 20 * SEC);
    assert_eq!(again.decision, Decision::Disable);
    assert!(again.actuation.is_empty());
}

#[test]
fn manual_override_skips_the_engine() {
    let mut state = ControllerState::default();
    state.manual_override = true;
    let step = evaluate(&state, &ControllerConfig::default(), temps(15.0, 15.0), 10 * MIN);
    assert_eq!(step.decision, Decision::Overridden);
    assert!(step.actuation.is_empty());
    assert_eq!(step.state, state);
}

// ============================================================================
// Properties
// ============================================================================

fn arb_state() -> impl Strategy<Value = ControllerState> {
    (
        any::<bool>(),
        prop_oneof![Just(Zone::Left), Just(Zone::Right)],
        0u64..2 * 60 * MIN,
        0u64..2 * 60 * MIN,
        0u64..2 * 60 * MIN,
    )
        .prop_map(|(on, zone, start, stop, switch)| {
            let mut s = ControllerState::default();
            s.compressor_on = on;
            s.active_zone = zone;
            s.cooling = on.then_some(zone);
            s.last_start_ms = start;
            s.last_stop_ms = stop;
            s.last_switch_ms = switch;
            s
        })
}

/// Any configuration inside the documented bounds.
fn arb_config() -> impl Strategy<Value = ControllerConfig> {
    (
        (-20.0f32..=10.0, -20.0f32..=10.0, 1.0f32..=8.0),
        (0.5f32..=10.0, 1.0f32..=15.0, 1.0f32..=10.0, 10.0f32..=45.0),
        (any::<bool>(), any::<bool>()),
    )
        .prop_map(
            |((left_sp, right_sp, hyst), (min_run, min_stop, min_switch, max_run), (le, re))| {
                ControllerConfig {
                    left_setpoint: left_sp,
                    right_setpoint: right_sp,
                    hysteresis: hyst,
                    min_run_time: min_run,
                    min_stop_time: min_stop,
                    min_zone_switch_time: min_switch,
                    max_run_time: max_run,
                    left_enabled: le,
                    right_enabled: re,
                    ..ControllerConfig::default()
                }
            },
        )
}

/// Time step and readings for one control cycle.
fn arb_cycles() -> impl Strategy<Value = Vec<(u64, f32, f32)>> {
    prop::collection::vec((0u64..3 * MIN, -25.0f32..20.0, -25.0f32..20.0), 1..200)
}

proptest! {
    #[test]
    fn timing_holds_over_long_runs(config in arb_config(), cycles in arb_cycles()) {
        let mut state = ControllerState::default();
        let mut now = 0u64;
        // Boot counts as a stop and as the last valve movement.
        let (mut last_start, mut last_stop, mut last_move) = (0u64, 0u64, 0u64);
        let mut valve = Zone::Left;

        for (dt, left, right) in cycles {
            now += dt;
            let readings = temps(left, right);
            let step = evaluate(&state, &config, readings, now);

            match step.decision {
                Decision::Start(zone) => {
                    prop_assert!(now - last_stop >= config.min_stop_ms());
                    last_start = now;
                    if zone != valve {
                        valve = zone;
                        last_move = now;
                    }
                }
                Decision::Stop(_) => {
                    prop_assert!(now - last_start >= config.min_run_ms());
                    last_stop = now;
                }
                Decision::Switch { to, .. } => {
                    prop_assert!(now - last_move >= config.min_zone_switch_ms());
                    valve = to;
                    last_move = now;
                }
                _ => {}
            }
            prop_assert_eq!(step.state.active_zone, valve);

            // Same inputs again: a fixed point, nothing more to switch.
            let again = evaluate(&step.state, &config, readings, now);
            prop_assert!(again.actuation.is_empty(), "repeated {:?}", again.decision);
            prop_assert_eq!(again.state.compressor_on, step.state.compressor_on);

            state = step.state;
        }
    }

    #[test]
    fn compressor_timing_is_never_violated(
        state in arb_state(),
        left in -15.0f32..25.0,
        right in -15.0f32..25.0,
        now in 0u64..3 * 60 * MIN,
    ) {
        let config = ControllerConfig::default();
        let step = evaluate(&state, &config, temps(left, right), now);

        match step.decision {
            Decision::Start(_) => {
                prop_assert!(now.saturating_sub(state.last_stop_ms) >= config.min_stop_ms());
            }
            Decision::Stop(_) => {
                prop_assert!(now.saturating_sub(state.last_start_ms) >= config.min_run_ms());
            }
            Decision::Switch { .. } => {
                prop_assert!(
                    now.saturating_sub(state.last_switch_ms) >= config.min_zone_switch_ms()
                );
            }
            _ => {}
        }
    }

    #[test]
    fn actuation_matches_the_new_state(
        state in arb_state(),
        left in -15.0f32..25.0,
        right in -15.0f32..25.0,
        now in 0u64..3 * 60 * MIN,
    ) {
        let step = evaluate(&state, &ControllerConfig::default(), temps(left, right), now);
        if let Some(on) = step.actuation.compressor {
            prop_assert_eq!(on, step.state.compressor_on);
            prop_assert_ne!(on, state.compressor_on);
        }
        if let Some(zone) = step.actuation.valve {
            prop_assert_eq!(zone, step.state.active_zone);
        }
        prop_assert_eq!(step.state.cooling.is_some(), step.state.compressor_on);
    }

    #[test]
    fn target_is_the_warmer_zone(left in 6.0f32..25.0, right in 6.0f32..25.0) {
        let expected = if left > right { Zone::Left } else { Zone::Right };
        prop_assert_eq!(target_zone(&ControllerConfig::default(), temps(left, right)), Some(expected));
    }
}
