//! Operator commands and the hand-off queue between API and control loop.
//!
//! Everything an operator can change at runtime is a [`ControlCommand`].
//! On desktop the web handlers apply commands directly under the shared
//! mutex. On ESP32 the HTTP callbacks run on another task, so they push
//! into a [`CommandQueue`] that the main loop drains at the top of each
//! tick; the controller is never touched from two threads.
//!
//! # Example
//!
//! ```rust
//! use rs_fridge::{CommandQueue, ControlCommand, Zone};
//!
//! let mut queue: CommandQueue<4> = CommandQueue::new();
//! queue.push(ControlCommand::ManualValve(Zone::Right)).unwrap();
//! queue.push(ControlCommand::SetManualOverride(false)).unwrap();
//!
//! // FIFO order
//! assert_eq!(queue.pop(), Some(ControlCommand::ManualValve(Zone::Right)));
//! assert_eq!(queue.pop(), Some(ControlCommand::SetManualOverride(false)));
//! assert_eq!(queue.pop(), None);
//! ```

use heapless::Deque;

use crate::error::FridgeError;
use crate::sensor::{CalibrationPoint, NtcParams};
use crate::settings::{ConfigPatch, ControllerConfig};
use crate::traits::Zone;

/// Which calibration point a capture writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CalibrationSlot {
    /// First point; stored without deriving constants.
    Point1,
    /// Second point; derives constants and enables calibrated mode.
    Point2,
}

/// A runtime change requested by an operator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlCommand {
    /// Global kill switch. Enabling also leaves manual override.
    SetSystemEnabled(bool),
    /// Enter or leave manual override.
    SetManualOverride(bool),
    /// Switch the compressor directly (enters manual override).
    ManualCompressor(bool),
    /// Move the zone valve directly (enters manual override).
    ManualValve(Zone),
    /// Merge a partial config and persist it.
    UpdateConfig(ConfigPatch),
    /// Capture a calibration point from the current raw readings.
    CaptureCalibration {
        /// Which point to write.
        slot: CalibrationSlot,
        /// Reference temperature measured by the operator (°C).
        actual_temp: f32,
    },
    /// Restore factory calibration.
    ResetCalibration,
    /// Enable or disable automatic firmware updates.
    SetAutoUpdates(bool),
}

impl ControlCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::SetSystemEnabled(_) => "system_enabled",
            ControlCommand::SetManualOverride(_) => "manual_override",
            ControlCommand::ManualCompressor(_) => "manual_compressor",
            ControlCommand::ManualValve(_) => "manual_valve",
            ControlCommand::UpdateConfig(_) => "update_config",
            ControlCommand::CaptureCalibration { .. } => "capture_calibration",
            ControlCommand::ResetCalibration => "reset_calibration",
            ControlCommand::SetAutoUpdates(_) => "auto_updates",
        }
    }
}

/// What applying a command produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CommandOutcome {
    /// Applied with nothing further to report.
    Applied,
    /// Config merged; `corrected` is set when out-of-range fields were
    /// replaced by defaults.
    ConfigUpdated {
        /// Config now in force.
        config: ControllerConfig,
        /// Whether any requested value was rejected.
        corrected: bool,
    },
    /// A calibration point was stored.
    CalibrationCaptured {
        /// The stored point.
        point: CalibrationPoint,
        /// Derived constants after a point 2 capture.
        params: Option<NtcParams>,
    },
}

/// Bounded FIFO of pending commands.
///
/// A full queue rejects new commands rather than dropping queued ones, so
/// the caller can report the failure to the operator.
#[derive(Debug)]
pub struct CommandQueue<const N: usize> {
    items: Deque<ControlCommand, N>,
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CommandQueue<N> {
    /// Creates an empty queue.
    pub const fn new() -> Self {
        Self {
            items: Deque::new(),
        }
    }

    /// Enqueue a command.
    pub fn push(&mut self, cmd: ControlCommand) -> Result<(), FridgeError> {
        self.items.push_back(cmd).map_err(|rejected| {
            log::warn!("command queue full, dropping {}", rejected.name());
            FridgeError::QueueFull
        })
    }

    /// Take the oldest command.
    pub fn pop(&mut self) -> Option<ControlCommand> {
        self.items.pop_front()
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop everything pending.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let mut q: CommandQueue<3> = CommandQueue::new();
        q.push(ControlCommand::SetSystemEnabled(false)).unwrap();
        q.push(ControlCommand::ResetCalibration).unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(ControlCommand::SetSystemEnabled(false)));
        assert_eq!(q.pop(), Some(ControlCommand::ResetCalibration));
        assert!(q.is_empty());
    }

    #[test]
    fn full_queue_rejects_newest() {
        let mut q: CommandQueue<2> = CommandQueue::new();
        q.push(ControlCommand::ManualCompressor(true)).unwrap();
        q.push(ControlCommand::ManualCompressor(false)).unwrap();
        assert_eq!(
            q.push(ControlCommand::SetAutoUpdates(true)),
            Err(FridgeError::QueueFull)
        );
        // Queued commands survive.
        assert_eq!(q.pop(), Some(ControlCommand::ManualCompressor(true)));
        assert_eq!(q.pop(), Some(ControlCommand::ManualCompressor(false)));
    }

    #[test]
    fn clear_empties() {
        let mut q: CommandQueue<2> = CommandQueue::default();
        q.push(ControlCommand::ResetCalibration).unwrap();
        q.clear();
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn command_names() {
        assert_eq!(ControlCommand::ManualValve(Zone::Left).name(), "manual_valve");
        assert_eq!(
            ControlCommand::CaptureCalibration {
                slot: CalibrationSlot::Point1,
                actual_temp: 0.0
            }
            .name(),
            "capture_calibration"
        );
    }
}
