//! Simulated sensor for host builds.
//!
//! Returns whatever sample was last injected. Injection happens through
//! the struct itself rather than statics so parallel tests stay isolated.

use log::debug;

use super::scd4x::Sample;
use crate::app::ports::{Quantity, SensorPort};
use crate::error::SensorError;

#[derive(Debug)]
pub struct SimSensor {
    next: Sample,
    latest: Option<Sample>,
    running: bool,
    initialised: bool,
    /// Error returned by the next `fetch_sample`, then cleared.
    pub fail_next_fetch: Option<SensorError>,
}

impl Default for SimSensor {
    fn default() -> Self {
        Self::new(Sample {
            co2_ppm: 600.0,
            temperature_c: 22.0,
            humidity_pct: 40.0,
        })
    }
}

impl SimSensor {
    pub fn new(sample: Sample) -> Self {
        Self {
            next: sample,
            latest: None,
            running: false,
            initialised: false,
            fail_next_fetch: None,
        }
    }

    /// Value returned by the next fetch.
    pub fn inject(&mut self, sample: Sample) {
        self.next = sample;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl SensorPort for SimSensor {
    fn init(&mut self) -> Result<(), SensorError> {
        self.initialised = true;
        self.running = true;
        Ok(())
    }

    fn fetch_sample(&mut self) -> Result<(), SensorError> {
        if !self.initialised {
            return Err(SensorError::NotInitialised);
        }
        if let Some(e) = self.fail_next_fetch.take() {
            return Err(e);
        }
        if !self.running {
            return Err(SensorError::DataNotReady);
        }
        debug!("sim sensor: {:?}", self.next);
        self.latest = Some(self.next);
        Ok(())
    }

    fn read(&mut self, quantity: Quantity) -> Result<f32, SensorError> {
        self.latest
            .map(|s| s.get(quantity))
            .ok_or(SensorError::NoSample)
    }

    fn start_periodic(&mut self) -> Result<(), SensorError> {
        self.running = true;
        Ok(())
    }

    fn stop_periodic(&mut self) -> Result<(), SensorError> {
        self.running = false;
        Ok(())
    }

    fn forced_recalibration(&mut self, reference_ppm: u16) -> Result<i16, SensorError> {
        if self.running {
            // The real sensor refuses FRC while measuring.
            return Err(SensorError::CalibrationFailed);
        }
        let correction = f32::from(reference_ppm) - self.next.co2_ppm;
        self.next.co2_ppm = f32::from(reference_ppm);
        Ok(correction.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16)
    }
}
