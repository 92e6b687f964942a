//! Persistence of the config record through the JSON file store.

#![cfg(feature = "persist")]

use rs_fridge::hal::{MockRelay, MockValve};
use rs_fridge::persist::JsonFileStorage;
use rs_fridge::settings::ConfigPatch;
use rs_fridge::{ConfigStore, ControlCommand, ControllerConfig, FridgeController};

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[test]
fn first_boot_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fridge.json");

    let store = ConfigStore::load(JsonFileStorage::new(&path));
    assert_eq!(*store.config(), ControllerConfig::default());
    assert!(!store.is_dirty());

    let json = read_json(&path);
    assert_eq!(json["version"], 1);
    assert_eq!(json["controller"]["leftSetpoint"], 4.0);
    assert_eq!(json["autoUpdatesEnabled"], true);
}

#[test]
fn settings_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("fridge.json");

    {
        let mut c = FridgeController::new(MockRelay::new(), MockValve::new(), JsonFileStorage::new(&path));
        let patch = ConfigPatch {
            left_setpoint: Some(-15.0),
            hysteresis: Some(3.0),
            ..Default::default()
        };
        c.apply_command(ControlCommand::UpdateConfig(patch), 0).unwrap();
        c.apply_command(ControlCommand::SetAutoUpdates(false), 0).unwrap();
    }

    let c = FridgeController::new(MockRelay::new(), MockValve::new(), JsonFileStorage::new(&path));
    assert_eq!(c.config().left_setpoint, -15.0);
    assert_eq!(c.config().hysteresis, 3.0);
    assert!(!c.auto_updates_enabled());
}

#[test]
fn out_of_range_fields_are_repaired_and_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fridge.json");
    std::fs::write(
        &path,
        r#"{"version":1,"controller":{"leftSetpoint":-2.0,"rightSetpoint":55.0,"hysteresis":"wide"},"autoUpdatesEnabled":false}"#,
    )
    .unwrap();

    let store = ConfigStore::load(JsonFileStorage::new(&path));
    let defaults = ControllerConfig::default();
    assert_eq!(store.config().left_setpoint, -2.0);
    assert_eq!(store.config().right_setpoint, defaults.right_setpoint);
    assert_eq!(store.config().hysteresis, defaults.hysteresis);
    assert_eq!(store.config().max_run_time, defaults.max_run_time);
    assert!(!store.auto_updates_enabled());

    let json = read_json(&path);
    assert_eq!(json["controller"]["rightSetpoint"], 4.0);
    assert_eq!(json["controller"]["maxRunTime"], 30.0);
}

#[test]
fn corrupt_file_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fridge.json");
    std::fs::write(&path, b"\x00\x01 not json").unwrap();

    let store = ConfigStore::load(JsonFileStorage::new(&path));
    assert_eq!(*store.config(), ControllerConfig::default());
    assert_eq!(read_json(&path)["version"], 1);
}

#[test]
fn unknown_version_resets_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fridge.json");
    std::fs::write(
        &path,
        r#"{"version":7,"controller":{"leftSetpoint":-9.0},"autoUpdatesEnabled":false}"#,
    )
    .unwrap();

    let store = ConfigStore::load(JsonFileStorage::new(&path));
    assert_eq!(store.config().left_setpoint, 4.0);
    assert!(store.auto_updates_enabled());
    assert_eq!(read_json(&path)["version"], 1);
}
