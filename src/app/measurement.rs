//! Periodic measure → encode → publish → display cycle.
//!
//! ```text
//!   Idle ──arm_initial──▶ Scheduled ──fire──▶ Scheduled ──fire──▶ …
//!                             │  ▲
//!                     suspend │  │ resume
//!                             ▼  │
//!                          Suspended
//! ```
//!
//! Each firing re-arms the cycle exactly once, whatever failed inside it.

use embassy_time::Duration;
use log::{debug, error, warn};

use super::encoder::AttributeEncoder;
use super::feedback::{ColorState, LedFeedback};
use super::ports::{AttributeStore, PixelPort, Quantity, SensorPort, TimerId, TimerPort};
use crate::error::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Never armed.
    Idle,
    Scheduled,
    /// Held by calibration.
    Suspended,
}

/// Physical values read in one cycle. `None` where the read failed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
    pub co2_ppm: Option<f32>,
}

impl Measurement {
    fn set(&mut self, quantity: Quantity, value: f32) {
        match quantity {
            Quantity::Temperature => self.temperature_c = Some(value),
            Quantity::Humidity => self.humidity_pct = Some(value),
            Quantity::Co2 => self.co2_ppm = Some(value),
        }
    }
}

/// Outcome of one firing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// 1-based firing count.
    pub cycle: u32,
    pub measurement: Measurement,
    /// Quantities whose attribute write succeeded.
    pub published: u8,
    /// Colour fed to the LED, if CO2 was published.
    pub color: Option<ColorState>,
    /// Set when the sample fetch failed and nothing was published.
    pub fetch_error: Option<SensorError>,
}

#[derive(Debug)]
pub struct MeasurementCycle {
    encoder: AttributeEncoder,
    period: Duration,
    initial_delay: Duration,
    state: CycleState,
    fired: u32,
    missed_reschedules: u32,
}

impl MeasurementCycle {
    pub fn new(encoder: AttributeEncoder, period: Duration, initial_delay: Duration) -> Self {
        Self {
            encoder,
            period,
            initial_delay,
            state: CycleState::Idle,
            fired: 0,
            missed_reschedules: 0,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn fired(&self) -> u32 {
        self.fired
    }

    /// Times re-arming failed; each one risks a stopped report loop.
    pub fn missed_reschedules(&self) -> u32 {
        self.missed_reschedules
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Schedule the first firing after the initial delay. Once the cycle is
    /// running, repeated start signals leave it alone.
    pub fn arm_initial(&mut self, timers: &mut impl TimerPort) {
        if self.state != CycleState::Idle && timers.is_scheduled(TimerId::MeasurementCycle) {
            debug!("measurement cycle already armed");
            return;
        }
        self.arm(timers, self.initial_delay);
    }

    /// Cancel the pending firing until [`resume`](Self::resume).
    pub fn suspend(&mut self, timers: &mut impl TimerPort) {
        if let Err(e) = timers.cancel(TimerId::MeasurementCycle) {
            error!("measurement cycle cancel failed: {e}");
        }
        self.state = CycleState::Suspended;
    }

    /// Re-arm at the steady-state period.
    pub fn resume(&mut self, timers: &mut impl TimerPort) {
        self.arm(timers, self.period);
    }

    /// Run one cycle and re-arm.
    pub fn fire<H>(
        &mut self,
        hw: &mut H,
        feedback: &mut LedFeedback,
        timers: &mut impl TimerPort,
    ) -> CycleReport
    where
        H: SensorPort + AttributeStore + PixelPort,
    {
        self.fired = self.fired.wrapping_add(1);
        let report = self.measure(hw, feedback);
        self.arm(timers, self.period);
        report
    }

    fn measure<H>(&self, hw: &mut H, feedback: &mut LedFeedback) -> CycleReport
    where
        H: SensorPort + AttributeStore + PixelPort,
    {
        let mut report = CycleReport {
            cycle: self.fired,
            measurement: Measurement::default(),
            published: 0,
            color: None,
            fetch_error: None,
        };

        if let Err(e) = hw.fetch_sample() {
            warn!("cycle {}: sample fetch failed: {e}", self.fired);
            report.fetch_error = Some(e);
            return report;
        }

        for quantity in Quantity::ALL {
            let value = match hw.read(quantity) {
                Ok(v) => v,
                Err(e) => {
                    warn!("cycle {}: {:?} read failed: {e}", self.fired, quantity);
                    continue;
                }
            };
            report.measurement.set(quantity, value);

            match self.encoder.publish(quantity, value, hw) {
                Ok(published) => {
                    report.published += 1;
                    if quantity == Quantity::Co2 {
                        report.color = Some(feedback.show_co2(published, hw));
                    }
                }
                Err(e) => warn!("cycle {}: {e}", self.fired),
            }
        }

        report
    }

    fn arm(&mut self, timers: &mut impl TimerPort, delay: Duration) {
        match timers.schedule(TimerId::MeasurementCycle, delay) {
            Ok(()) => self.state = CycleState::Scheduled,
            Err(e) => {
                self.missed_reschedules += 1;
                error!("measurement cycle schedule failed: {e}");
            }
        }
    }
}
