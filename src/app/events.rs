//! Outbound application events.
//!
//! The [`Controller`](super::controller::Controller) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them; on the device they go to the serial
//! log.

use super::calibration::CalibrationOutcome;
use super::feedback::ColorState;
use super::measurement::CycleReport;
use super::mode::Mode;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot sequence finished; carries the number of failed steps.
    Started { failed_steps: u8 },

    /// The operational mode changed.
    ModeChanged { from: Mode, to: Mode },

    /// A measurement cycle ran.
    Measured(CycleReport),

    /// The CO2 display was blanked or restored.
    DisplayToggled { enabled: bool },

    /// Forced recalibration finished (successfully or not).
    Calibrated(CalibrationOutcome),

    /// The node joined a network.
    Joined,

    /// The node left its network.
    Left,

    /// Network credentials were erased by a long hold.
    FactoryReset,
}
