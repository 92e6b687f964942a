//! Shared state behind the HTTP API.
//!
//! [`StateProvider`] is what the request handlers see. Desktop builds use
//! [`SharedFridgeState`], which applies commands directly under one mutex.
//! The ESP32 firmware implements the same trait on a snapshot published by
//! its main loop and hands commands over through a
//! [`CommandQueue`](crate::CommandQueue).
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_fridge::services::{SharedFridgeState, StateProvider, Submission, UpdateService};
//! use rs_fridge::hal::{MemoryStorage, MockRelay, MockValve};
//! use rs_fridge::{ControlCommand, FridgeController, UpdateConfig};
//!
//! let controller =
//!     FridgeController::new(MockRelay::new(), MockValve::new(), MemoryStorage::new());
//! let state = Arc::new(SharedFridgeState::new(
//!     controller,
//!     UpdateService::new(UpdateConfig::default()),
//! ));
//!
//! let result = state.submit(ControlCommand::SetSystemEnabled(false)).unwrap();
//! assert!(matches!(result, Submission::Applied(_)));
//! assert!(!state.snapshot().state.system_enabled);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::config::UpdateConfig;
use crate::hal::StdClock;
use crate::sensor::NtcCalibration;
use crate::settings::ControllerConfig;
use crate::traits::{
    Clock, CompressorRelay, ConfigStorage, FirmwareUpdater, ThermistorAdc, ZoneValve,
};
use crate::update::{ReleaseInfo, UpdateCheck, UpdateConditions, UpdateOutcome, UpdatePolicy};
use crate::{
    CommandOutcome, ControlCommand, Decision, FridgeController, FridgeError, FridgeState, LogEntry,
};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Snapshot Types
// ============================================================================

/// Network link as reported in the status response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    /// Station is associated.
    #[serde(rename = "wifiConnected")]
    pub connected: bool,
    /// SSID of the current network.
    #[serde(rename = "wifiSSID")]
    pub ssid: Option<String>,
    /// Station IP address.
    #[serde(rename = "wifiIP")]
    pub ip: Option<String>,
}

/// Everything a read-only request can ask about.
#[derive(Clone, Debug, PartialEq)]
pub struct FridgeSnapshot {
    /// Readings, actuators and status.
    pub state: FridgeState,
    /// Tunables in force.
    pub config: ControllerConfig,
    /// Thermistor calibration.
    pub calibration: NtcCalibration,
    /// Automatic firmware updates allowed.
    pub auto_updates_enabled: bool,
    /// Network link.
    pub network: NetworkStatus,
}

impl FridgeSnapshot {
    /// Capture the controller's current view.
    pub fn capture<R, V, S>(
        controller: &FridgeController<R, V, S>,
        now_ms: u64,
        network: NetworkStatus,
    ) -> Self
    where
        R: CompressorRelay,
        V: ZoneValve,
        S: ConfigStorage,
    {
        Self {
            state: controller.state(now_ms),
            config: *controller.config(),
            calibration: *controller.calibration(),
            auto_updates_enabled: controller.auto_updates_enabled(),
            network,
        }
    }
}

/// Firmware update status response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtaStatus {
    /// Running version.
    pub current_version: String,
    /// Automatic updates allowed.
    pub auto_updates_enabled: bool,
    /// An install is queued or running.
    pub update_in_progress: bool,
    /// Uptime (ms) of the last release check.
    pub last_checked: Option<u64>,
    /// Release repository owner.
    pub github_owner: String,
    /// Release repository name.
    pub github_repo: String,
    /// Interval between automatic checks.
    pub check_interval_minutes: u64,
}

/// Result of [`StateProvider::submit`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Submission {
    /// Applied immediately.
    Applied(CommandOutcome),
    /// Queued for the control loop.
    Queued,
}

// ============================================================================
// State Provider Trait
// ============================================================================

/// What the HTTP handlers need from the platform.
pub trait StateProvider: Send + Sync {
    /// Current snapshot.
    fn snapshot(&self) -> FridgeSnapshot;

    /// Temperature history, oldest first.
    fn history(&self) -> Vec<LogEntry>;

    /// Apply or queue an operator command.
    fn submit(&self, cmd: ControlCommand) -> Result<Submission, FridgeError>;

    /// Firmware update service.
    fn updates(&self) -> &UpdateService;

    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;
}

// ============================================================================
// Update Service
// ============================================================================

trait DynUpdater: Send {
    fn latest_release(&mut self) -> Result<ReleaseInfo, String>;
    fn install(&mut self, url: &str) -> Result<(), String>;
}

impl<U: FirmwareUpdater + Send> DynUpdater for U {
    fn latest_release(&mut self) -> Result<ReleaseInfo, String> {
        FirmwareUpdater::latest_release(self).map_err(|e| format!("{e:?}"))
    }

    fn install(&mut self, url: &str) -> Result<(), String> {
        FirmwareUpdater::install(self, url).map_err(|e| format!("{e:?}"))
    }
}

struct BoxedUpdater(Box<dyn DynUpdater>);

impl FirmwareUpdater for BoxedUpdater {
    type Error = String;

    fn latest_release(&mut self) -> Result<ReleaseInfo, String> {
        self.0.latest_release()
    }

    fn install(&mut self, url: &str) -> Result<(), String> {
        self.0.install(url)
    }
}

/// Firmware update checks and installs shared by the API and the driver loop.
///
/// Request handlers only check and queue installs; the image is written by
/// [`poll`](Self::poll) on the driver loop.
pub struct UpdateService {
    config: UpdateConfig,
    policy: Mutex<UpdatePolicy>,
    updater: Option<Mutex<BoxedUpdater>>,
    pending: Mutex<Option<String>>,
    installing: AtomicBool,
    last_check_ms: AtomicU64,
}

impl UpdateService {
    /// Service without an updater: checks and installs are unsupported.
    pub fn new(config: UpdateConfig) -> Self {
        Self {
            policy: Mutex::new(config.policy()),
            config,
            updater: None,
            pending: Mutex::new(None),
            installing: AtomicBool::new(false),
            last_check_ms: AtomicU64::new(u64::MAX),
        }
    }

    /// Attach the platform updater.
    pub fn with_updater<U>(mut self, updater: U) -> Self
    where
        U: FirmwareUpdater + Send + 'static,
    {
        self.updater = Some(Mutex::new(BoxedUpdater(Box::new(updater))));
        self
    }

    /// Replace the scheduling policy.
    pub fn with_policy(self, policy: UpdatePolicy) -> Self {
        *lock(&self.policy) = policy;
        self
    }

    /// Whether an updater is attached.
    pub fn is_supported(&self) -> bool {
        self.updater.is_some()
    }

    /// Update settings.
    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Whether an operator-requested install is waiting for the driver loop.
    pub fn has_pending_install(&self) -> bool {
        lock(&self.pending).is_some()
    }

    /// Status report. Never blocks on a running install.
    pub fn status(&self, auto_updates_enabled: bool) -> OtaStatus {
        let last = self.last_check_ms.load(Ordering::Relaxed);
        OtaStatus {
            current_version: crate::update::CURRENT_VERSION.into(),
            auto_updates_enabled,
            update_in_progress: self.installing.load(Ordering::Relaxed)
                || self.has_pending_install(),
            last_checked: (last != u64::MAX).then_some(last),
            github_owner: self.config.owner.as_str().into(),
            github_repo: self.config.repo.as_str().into(),
            check_interval_minutes: self.config.check_interval_minutes(),
        }
    }

    /// Query the latest release. `None` when no updater is attached.
    pub fn check(&self, now_ms: u64) -> Option<Result<UpdateCheck, String>> {
        let mut updater = lock(self.updater.as_ref()?);
        let result = lock(&self.policy).check(&mut *updater, now_ms);
        self.last_check_ms.store(now_ms, Ordering::Relaxed);
        Some(result)
    }

    /// Queue an install of `url`. Returns `false` when no updater is attached.
    pub fn request_install(&self, url: &str) -> bool {
        if !self.is_supported() {
            return false;
        }
        *lock(&self.pending) = Some(url.into());
        true
    }

    /// Driver loop hook: run a queued install, otherwise an automatic pass.
    ///
    /// A queued install waits while the compressor runs.
    pub fn poll(&self, conditions: &UpdateConditions) -> UpdateOutcome {
        let Some(updater) = self.updater.as_ref() else {
            return UpdateOutcome::Skipped;
        };
        if conditions.compressor_on {
            return UpdateOutcome::Skipped;
        }
        let pending = lock(&self.pending).take();
        let mut updater = lock(updater);
        let mut policy = lock(&self.policy);

        self.installing.store(true, Ordering::Relaxed);
        let outcome = match pending {
            Some(url) => policy.install_requested(&mut *updater, &url, conditions.now_ms),
            None => policy.run_automatic(&mut *updater, conditions),
        };
        self.installing.store(false, Ordering::Relaxed);

        if let Some(t) = policy.last_check_ms() {
            self.last_check_ms.store(t, Ordering::Relaxed);
        }
        outcome
    }
}

impl Debug for UpdateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateService")
            .field("config", &self.config)
            .field("supported", &self.is_supported())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Shared Fridge State
// ============================================================================

/// Desktop shared state: one controller behind a mutex.
///
/// All API mutations and the driver task serialize through the same lock.
pub struct SharedFridgeState<R, V, S>
where
    R: CompressorRelay,
    V: ZoneValve,
    S: ConfigStorage,
{
    controller: Mutex<FridgeController<R, V, S>>,
    clock: StdClock,
    updates: UpdateService,
    network: Mutex<NetworkStatus>,
}

impl<R, V, S> SharedFridgeState<R, V, S>
where
    R: CompressorRelay,
    V: ZoneValve,
    S: ConfigStorage,
{
    /// Wrap a controller. Time starts at zero now.
    pub fn new(controller: FridgeController<R, V, S>, updates: UpdateService) -> Self {
        Self {
            controller: Mutex::new(controller),
            clock: StdClock::new(),
            updates,
            network: Mutex::new(NetworkStatus::default()),
        }
    }

    /// Milliseconds since creation.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Access the controller with the lock held.
    pub fn with_controller<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut FridgeController<R, V, S>) -> T,
    {
        let mut guard = lock(&self.controller);
        f(&mut guard)
    }

    /// Report a network change.
    pub fn set_network(&self, network: NetworkStatus) {
        *lock(&self.network) = network;
    }

    /// One sampling pass: read both thermistors, log, evaluate.
    ///
    /// A failed read or conversion is logged and the engine runs on the
    /// held values.
    pub fn run_cycle<A: ThermistorAdc>(&self, adc: &mut A) -> Result<Option<Decision>, FridgeError> {
        let now_ms = self.now_ms();
        let timestamp_s = self.clock.log_timestamp_s();
        self.with_controller(|c| {
            match adc.read_pair() {
                Ok(raw) => {
                    // record_sample logs bad zones itself
                    let _ = c.record_sample(raw, timestamp_s);
                }
                Err(e) => log::warn!("thermistor read failed: {:?}", e),
            }
            c.tick(now_ms)
        })
    }

    /// Driver hook for firmware updates.
    ///
    /// A queued install first stops the compressor. When the install does not
    /// end in a restart the engine takes over again, and a failure turns
    /// automatic updates off.
    pub fn poll_updates(&self, connected: bool) -> UpdateOutcome {
        let now_ms = self.now_ms();
        let held = if self.updates.has_pending_install() {
            self.with_controller(|c| c.hold_for_install(now_ms))
                .unwrap_or_else(|e| {
                    log::warn!("cannot stop compressor for install: {}", e);
                    false
                })
        } else {
            false
        };
        let (auto_enabled, compressor_on) = self.with_controller(|c| {
            (c.auto_updates_enabled(), c.controller_state().compressor_on)
        });
        let outcome = self.updates.poll(&UpdateConditions {
            connected,
            auto_enabled,
            compressor_on,
            now_ms,
        });
        self.with_controller(|c| c.finish_install(&outcome, held));
        outcome
    }
}

// ============================================================================
// StateProvider Implementation for Arc<SharedFridgeState>
// ============================================================================

impl<R, V, S> StateProvider for Arc<SharedFridgeState<R, V, S>>
where
    R: CompressorRelay + Send + 'static,
    V: ZoneValve + Send + 'static,
    S: ConfigStorage + Send + 'static,
{
    fn snapshot(&self) -> FridgeSnapshot {
        let now_ms = self.now_ms();
        let network = lock(&self.network).clone();
        self.with_controller(|c| FridgeSnapshot::capture(c, now_ms, network))
    }

    fn history(&self) -> Vec<LogEntry> {
        self.with_controller(|c| c.history().snapshot())
    }

    fn submit(&self, cmd: ControlCommand) -> Result<Submission, FridgeError> {
        let now_ms = self.now_ms();
        self.with_controller(|c| c.apply_command(cmd, now_ms))
            .map(Submission::Applied)
    }

    fn updates(&self) -> &UpdateService {
        &self.updates
    }

    fn now_ms(&self) -> u64 {
        SharedFridgeState::now_ms(self)
    }
}
