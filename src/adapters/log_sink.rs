//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per
//! [`AppEvent`] to the ESP-IDF logger (UART / USB-CDC on the device,
//! stderr under simulation).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// `--` for a value that could not be read.
struct Reading(Option<f32>, usize);

impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.*}", self.1, v),
            None => f.write_str("--"),
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Measured(r) => {
                if let Some(e) = r.fetch_error {
                    warn!("MEAS  | #{} | fetch failed: {}", r.cycle, e);
                    return;
                }
                let m = &r.measurement;
                info!(
                    "MEAS  | #{} | T={}\u{00b0}C RH={}% CO2={}ppm | published={}/3 | led={:?}",
                    r.cycle,
                    Reading(m.temperature_c, 2),
                    Reading(m.humidity_pct, 1),
                    Reading(m.co2_ppm, 0),
                    r.published,
                    r.color,
                );
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE  | {:?} -> {:?}", from, to);
            }
            AppEvent::DisplayToggled { enabled } => {
                info!("LED   | display {}", if *enabled { "on" } else { "off" });
            }
            AppEvent::Calibrated(outcome) => match outcome.result {
                Ok(correction) => info!(
                    "CAL   | ref={}ppm correction={}ppm",
                    outcome.reference_ppm, correction
                ),
                Err(e) => warn!("CAL   | ref={}ppm failed: {}", outcome.reference_ppm, e),
            },
            AppEvent::Joined => info!("NET   | joined"),
            AppEvent::Left => info!("NET   | left"),
            AppEvent::FactoryReset => info!("NET   | factory reset"),
            AppEvent::Started { failed_steps } => {
                if *failed_steps == 0 {
                    info!("START | all boot steps ok");
                } else {
                    warn!("START | {} boot step(s) failed", failed_steps);
                }
            }
        }
    }
}
