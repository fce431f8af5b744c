//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (sensor, attribute store, network stack, LEDs, timers,
//! event sinks, config storage) implement these traits. The
//! [`Controller`](super::controller::Controller) consumes them via generics,
//! so the domain core never touches hardware directly.

use embassy_time::{Duration, Instant};

use crate::config::DeviceConfig;
use crate::error::{InitError, NetworkError, ScheduleError, SensorError};
use crate::events::{NetworkSignal, SignalBuffer};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// The three physical quantities produced by the combined sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// Degrees Celsius.
    Temperature,
    /// Percent relative humidity.
    Humidity,
    /// CO2 concentration in ppm.
    Co2,
}

impl Quantity {
    pub const ALL: [Self; 3] = [Self::Temperature, Self::Humidity, Self::Co2];
}

/// Combined temperature / humidity / CO2 sensor.
///
/// `read` returns the quantity from the most recent successful
/// `fetch_sample`; it never touches the bus.
pub trait SensorPort {
    /// Must succeed before any other call.
    fn init(&mut self) -> Result<(), SensorError>;

    /// Latch a fresh sample of all three quantities.
    fn fetch_sample(&mut self) -> Result<(), SensorError>;

    /// Physical value of `quantity` from the latched sample.
    fn read(&mut self, quantity: Quantity) -> Result<f32, SensorError>;

    fn start_periodic(&mut self) -> Result<(), SensorError>;

    fn stop_periodic(&mut self) -> Result<(), SensorError>;

    /// Forced recalibration against a known reference concentration.
    /// Returns the correction applied by the sensor, in ppm.
    fn forced_recalibration(&mut self, reference_ppm: u16) -> Result<i16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Attribute store (driven adapter: domain → network data model)
// ───────────────────────────────────────────────────────────────

/// The Zigbee data model's attribute table for the sensor endpoint.
pub trait AttributeStore {
    /// Create the endpoint and its clusters.
    fn register_device(&mut self) -> Result<(), InitError>;

    /// Write raw little-endian attribute bytes. Returns the ZCL status;
    /// zero is success.
    fn set_attribute(&mut self, cluster: u16, attribute: u16, value: &[u8]) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain ↔ mesh stack)
// ───────────────────────────────────────────────────────────────

pub trait NetworkPort {
    /// Whether the node is currently joined to a network.
    fn is_joined(&self) -> bool;

    /// Start the stack; asynchronous signals follow.
    fn enable(&mut self) -> Result<(), InitError>;

    /// Route identify notifications into the event queue.
    fn register_identify_handler(&mut self) -> Result<(), InitError>;

    /// `false` makes this a sleepy end device.
    fn set_rx_on_when_idle(&mut self, on: bool);

    /// Begin network steering (join).
    fn start_steering(&mut self) -> Result<(), NetworkError>;

    /// Enter identify mode; completion arrives as an identify notification.
    fn start_identify(&mut self) -> Result<(), NetworkError>;

    /// Leave identify mode early.
    fn cancel_identify(&mut self) -> Result<(), NetworkError>;

    /// Erase network credentials and restart.
    fn factory_reset(&mut self);

    /// Stack-side default processing for a signal the app has seen.
    fn default_signal_handler(&mut self, signal: &NetworkSignal);

    /// Hand a signal buffer back to the stack.
    fn release_buffer(&mut self, buffer: SignalBuffer);
}

// ───────────────────────────────────────────────────────────────
// LEDs (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Discrete single-colour indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Pairing and calibration-busy state.
    Status,
    /// Identify blink.
    Identify,
}

pub trait IndicatorPort {
    /// Configure indicator GPIOs and the colour LED peripheral.
    fn init_leds(&mut self) -> Result<(), InitError>;

    fn set_indicator(&mut self, led: Indicator, on: bool);

    fn toggle_indicator(&mut self, led: Indicator);
}

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Addressable colour LED chain.
pub trait PixelPort {
    /// Push `pixels` to the chain. `Err` carries the driver status code.
    fn update_pixels(&mut self, pixels: &[Rgb]) -> Result<(), i32>;
}

// ───────────────────────────────────────────────────────────────
// Timers (driven adapter: domain ↔ deferred work)
// ───────────────────────────────────────────────────────────────

/// Named one-shot timers. Each id has at most one pending expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerId {
    MeasurementCycle,
    IdentifyBlink,
    FactoryResetHold,
}

/// Cancellable one-shot timers on the controller's own execution context.
///
/// Scheduling an id that is already pending replaces its expiry. Expired
/// timers are handed back through [`pop_due`](Self::pop_due) and are
/// removed; a periodic job re-arms itself from its handler.
pub trait TimerPort {
    /// Current time as last seen by [`advance_to`](Self::advance_to).
    fn now(&self) -> Instant;

    /// Move the clock forward. Going backwards is ignored.
    fn advance_to(&mut self, now: Instant);

    fn schedule(&mut self, id: TimerId, delay: Duration) -> Result<(), ScheduleError>;

    /// Cancelling an id that is not pending is a no-op.
    fn cancel(&mut self, id: TimerId) -> Result<(), ScheduleError>;

    fn is_scheduled(&self, id: TimerId) -> bool;

    /// Remove and return the earliest expired timer, if any.
    fn pop_due(&mut self) -> Option<TimerId>;

    fn next_deadline(&self) -> Option<Instant>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists device configuration.
///
/// Implementations MUST validate before persisting. Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Returns [`DeviceConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<DeviceConfig, ConfigError>;

    fn save(&self, config: &DeviceConfig) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field is out of range.
    ValidationFailed(&'static str),
    /// The stored blob could not be decoded.
    Corrupted,
    /// The underlying storage failed.
    Storage(i32),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(why) => write!(f, "invalid config: {why}"),
            Self::Corrupted => write!(f, "stored config corrupted"),
            Self::Storage(rc) => write!(f, "config storage error (rc={rc})"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Aggregate
// ───────────────────────────────────────────────────────────────

/// Everything the controller drives on the device side.
pub trait DevicePorts:
    SensorPort + AttributeStore + NetworkPort + IndicatorPort + PixelPort
{
}

impl<T> DevicePorts for T where
    T: SensorPort + AttributeStore + NetworkPort + IndicatorPort + PixelPort
{
}
