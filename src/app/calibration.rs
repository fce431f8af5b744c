//! Forced recalibration of the CO2 sensor.
//!
//! Runs synchronously and blocks the application context for the duration
//! of the sensor exchange (about a second on the SCD4x). The measurement
//! cycle is suspended first so no firing can interleave, and always
//! resumed afterwards, even when the sensor rejects the recalibration.

use log::{info, warn};

use super::measurement::MeasurementCycle;
use super::ports::{Indicator, IndicatorPort, SensorPort, TimerPort};
use crate::error::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationOutcome {
    pub reference_ppm: u16,
    /// Correction applied by the sensor, or the first failing step.
    pub result: Result<i16, SensorError>,
}

impl CalibrationOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Suspend → busy on → stop / recalibrate / restart → busy off → resume.
pub fn run<H>(
    hw: &mut H,
    timers: &mut impl TimerPort,
    cycle: &mut MeasurementCycle,
    reference_ppm: u16,
) -> CalibrationOutcome
where
    H: SensorPort + IndicatorPort,
{
    cycle.suspend(timers);
    hw.set_indicator(Indicator::Status, true);

    let result = recalibrate(hw, reference_ppm);
    match result {
        Ok(correction) => info!("CO2 recalibrated to {reference_ppm} ppm (correction {correction} ppm)"),
        Err(e) => warn!("CO2 recalibration failed: {e}; resuming normal operation"),
    }

    hw.set_indicator(Indicator::Status, false);
    cycle.resume(timers);

    CalibrationOutcome {
        reference_ppm,
        result,
    }
}

fn recalibrate(sensor: &mut impl SensorPort, reference_ppm: u16) -> Result<i16, SensorError> {
    sensor.stop_periodic()?;
    let frc = sensor.forced_recalibration(reference_ppm);
    // Sampling restarts whatever the recalibration returned.
    let restart = sensor.start_periodic();
    let correction = frc?;
    restart?;
    Ok(correction)
}
