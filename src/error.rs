//! Unified error types for the Airmon firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! controller's recover-and-log policy stays uniform. All variants are
//! `Copy`; nothing here allocates.
//!
//! | Variant    | Raised by                         | Recovery                     |
//! |------------|-----------------------------------|------------------------------|
//! | `Init`     | boot steps                        | log, continue bring-up       |
//! | `Sensor`   | fetch / read / calibration        | skip quantity or cycle       |
//! | `Encode`   | attribute encoder range check     | skip attribute               |
//! | `Publish`  | attribute store rejected a write  | skip attribute               |
//! | `Schedule` | alarm queue                       | log (liveness risk)          |
//! | `Network`  | steering / identify requests      | log                          |

use core::fmt;

use crate::app::mode::Mode;
use crate::app::ports::Quantity;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    Init(InitError),
    Sensor(SensorError),
    Encode(EncodeError),
    Publish(PublishError),
    Schedule(ScheduleError),
    Network(NetworkError),
    /// A requested mode change would overlap with the active mode.
    ModeConflict { active: Mode, requested: Mode },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Encode(e) => write!(f, "encode: {e}"),
            Self::Publish(e) => write!(f, "publish: {e}"),
            Self::Schedule(e) => write!(f, "schedule: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::ModeConflict { active, requested } => {
                write!(f, "cannot enter {requested:?} while {active:?}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Init errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The device or peripheral did not report ready.
    NotReady(&'static str),
    /// A driver or stack call returned a non-zero status.
    Status(&'static str, i32),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady(what) => write!(f, "{what} not ready"),
            Self::Status(what, rc) => write!(f, "{what} failed (rc={rc})"),
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// `init()` has not succeeded yet.
    NotInitialised,
    /// The bus transaction failed (NACK, arbitration loss, timeout).
    Bus,
    /// A received word failed its CRC-8 check.
    Crc,
    /// No fresh sample was available.
    DataNotReady,
    /// `read()` was called before any successful `fetch_sample()`.
    NoSample,
    /// Forced recalibration was rejected by the sensor.
    CalibrationFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialised => write!(f, "sensor not initialised"),
            Self::Bus => write!(f, "bus transaction failed"),
            Self::Crc => write!(f, "CRC mismatch"),
            Self::DataNotReady => write!(f, "data not ready"),
            Self::NoSample => write!(f, "no sample fetched"),
            Self::CalibrationFailed => write!(f, "forced recalibration failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Encode / publish errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodeError {
    /// Physical value outside the quantity's configured valid range.
    OutOfRange { quantity: Quantity, value: f32 },
    /// Reading was NaN or infinite.
    NotFinite(Quantity),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { quantity, value } => {
                write!(f, "{quantity:?} value {value} out of range")
            }
            Self::NotFinite(quantity) => write!(f, "{quantity:?} value not finite"),
        }
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishError {
    pub cluster: u16,
    pub attribute: u16,
    /// Non-zero ZCL status returned by the attribute store.
    pub status: u8,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attribute 0x{:04x}/0x{:04x} rejected (status=0x{:02x})",
            self.cluster, self.attribute, self.status
        )
    }
}

impl From<PublishError> for Error {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}

// ---------------------------------------------------------------------------
// Scheduling errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// No free alarm slot.
    QueueFull,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "alarm queue full"),
        }
    }
}

impl From<ScheduleError> for Error {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// The stack refused the request in its current state.
    InvalidState,
    /// Any other non-zero stack status.
    Status(i32),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState => write!(f, "invalid stack state"),
            Self::Status(rc) => write!(f, "stack error (rc={rc})"),
        }
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
