//! Sensor drivers.
//!
//! The node carries one Sensirion SCD4x that measures CO2, temperature and
//! relative humidity in a single sample. [`scd4x::Scd4x`] implements
//! [`SensorPort`](crate::app::ports::SensorPort) over any `embedded-hal`
//! I²C bus; [`sim::SimSensor`] stands in for it on host builds.

pub mod scd4x;
pub mod sim;
