//! Sensirion SCD4x CO2 / temperature / humidity sensor over I²C.
//!
//! ## Wire format
//!
//! Commands are 16-bit big-endian words. Every 16-bit data word on the bus
//! is followed by a CRC-8 (poly 0x31, init 0xFF), so a three-word
//! measurement is a nine-byte frame:
//!
//! ```text
//!  [CO2 hi][CO2 lo][crc] [T hi][T lo][crc] [RH hi][RH lo][crc]
//! ```
//!
//! ## Conversions
//!
//! | Word | Quantity            | Formula                 |
//! |------|---------------------|-------------------------|
//! | 0    | CO2 (ppm)           | `w`                     |
//! | 1    | temperature (°C)    | `-45 + 175 · w / 65535` |
//! | 2    | humidity (% RH)     | `100 · w / 65535`       |

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::app::ports::{Quantity, SensorPort};
use crate::error::SensorError;

pub const SCD4X_ADDR: u8 = 0x62;

const CMD_START_PERIODIC: u16 = 0x21b1;
const CMD_READ_MEASUREMENT: u16 = 0xec05;
const CMD_STOP_PERIODIC: u16 = 0x3f86;
const CMD_GET_DATA_READY: u16 = 0xe4b8;
const CMD_PERFORM_FRC: u16 = 0x362f;

/// Settle time after `stop_periodic_measurement`.
const STOP_DELAY_MS: u32 = 500;
/// Execution time of `perform_forced_recalibration`.
const FRC_DELAY_MS: u32 = 400;
/// Execution time of read commands.
const READ_DELAY_MS: u32 = 1;

/// FRC result word reported when recalibration failed.
const FRC_FAILED: u16 = 0xFFFF;
/// Lower 11 bits of the data-ready word; all zero = no new sample.
const DATA_READY_MASK: u16 = 0x07FF;

/// Sensirion CRC-8 over one data word.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Split a frame of `[hi, lo, crc]` triples into verified words.
///
/// Fails on a CRC mismatch or a frame that is not exactly `N` triples.
pub fn decode_words<const N: usize>(frame: &[u8]) -> Result<[u16; N], SensorError> {
    if frame.len() != N * 3 {
        return Err(SensorError::Bus);
    }
    let mut words = [0u16; N];
    for (word, chunk) in words.iter_mut().zip(frame.chunks_exact(3)) {
        if crc8(&chunk[..2]) != chunk[2] {
            return Err(SensorError::Crc);
        }
        *word = u16::from_be_bytes([chunk[0], chunk[1]]);
    }
    Ok(words)
}

/// Decode a nine-byte measurement frame into `[co2, t, rh]` raw words.
pub fn decode_frame(frame: &[u8]) -> Result<[u16; 3], SensorError> {
    decode_words::<3>(frame)
}

/// One decoded sample in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub co2_ppm: f32,
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl Sample {
    pub fn from_words([co2, t, rh]: [u16; 3]) -> Self {
        Self {
            co2_ppm: f32::from(co2),
            temperature_c: -45.0 + 175.0 * f32::from(t) / 65535.0,
            humidity_pct: 100.0 * f32::from(rh) / 65535.0,
        }
    }

    pub fn get(&self, quantity: Quantity) -> f32 {
        match quantity {
            Quantity::Temperature => self.temperature_c,
            Quantity::Humidity => self.humidity_pct,
            Quantity::Co2 => self.co2_ppm,
        }
    }
}

pub struct Scd4x<I, D> {
    i2c: I,
    delay: D,
    initialised: bool,
    latest: Option<Sample>,
}

impl<I: I2c, D: DelayNs> Scd4x<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            i2c,
            delay,
            initialised: false,
            latest: None,
        }
    }

    /// Give the bus back, e.g. for tests.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn command(&mut self, cmd: u16) -> Result<(), SensorError> {
        self.i2c
            .write(SCD4X_ADDR, &cmd.to_be_bytes())
            .map_err(|_| SensorError::Bus)
    }

    fn command_with_arg(&mut self, cmd: u16, arg: u16) -> Result<(), SensorError> {
        let [c0, c1] = cmd.to_be_bytes();
        let [a0, a1] = arg.to_be_bytes();
        let crc = crc8(&[a0, a1]);
        self.i2c
            .write(SCD4X_ADDR, &[c0, c1, a0, a1, crc])
            .map_err(|_| SensorError::Bus)
    }

    fn read_words<const N: usize, const B: usize>(
        &mut self,
        wait_ms: u32,
    ) -> Result<[u16; N], SensorError> {
        self.delay.delay_ms(wait_ms);
        let mut buf = [0u8; B];
        self.i2c
            .read(SCD4X_ADDR, &mut buf)
            .map_err(|_| SensorError::Bus)?;
        decode_words::<N>(&buf)
    }

    fn ensure_init(&self) -> Result<(), SensorError> {
        if self.initialised {
            Ok(())
        } else {
            Err(SensorError::NotInitialised)
        }
    }

    pub fn data_ready(&mut self) -> Result<bool, SensorError> {
        self.command(CMD_GET_DATA_READY)?;
        let [status] = self.read_words::<1, 3>(READ_DELAY_MS)?;
        Ok(status & DATA_READY_MASK != 0)
    }

    pub fn latest(&self) -> Option<Sample> {
        self.latest
    }
}

impl<I: I2c, D: DelayNs> SensorPort for Scd4x<I, D> {
    fn init(&mut self) -> Result<(), SensorError> {
        // A warm reset leaves the sensor measuring; it ignores most
        // commands until stopped.
        self.command(CMD_STOP_PERIODIC)?;
        self.delay.delay_ms(STOP_DELAY_MS);
        self.command(CMD_START_PERIODIC)?;
        self.initialised = true;
        info!("scd4x: periodic measurement started");
        Ok(())
    }

    fn fetch_sample(&mut self) -> Result<(), SensorError> {
        self.ensure_init()?;
        if !self.data_ready()? {
            return Err(SensorError::DataNotReady);
        }
        self.command(CMD_READ_MEASUREMENT)?;
        let words = self.read_words::<3, 9>(READ_DELAY_MS)?;
        let sample = Sample::from_words(words);
        debug!(
            "scd4x: co2={} t={:.2} rh={:.1}",
            sample.co2_ppm, sample.temperature_c, sample.humidity_pct
        );
        self.latest = Some(sample);
        Ok(())
    }

    fn read(&mut self, quantity: Quantity) -> Result<f32, SensorError> {
        self.ensure_init()?;
        self.latest
            .map(|s| s.get(quantity))
            .ok_or(SensorError::NoSample)
    }

    fn start_periodic(&mut self) -> Result<(), SensorError> {
        self.ensure_init()?;
        self.command(CMD_START_PERIODIC)
    }

    fn stop_periodic(&mut self) -> Result<(), SensorError> {
        self.ensure_init()?;
        self.command(CMD_STOP_PERIODIC)?;
        self.delay.delay_ms(STOP_DELAY_MS);
        Ok(())
    }

    fn forced_recalibration(&mut self, reference_ppm: u16) -> Result<i16, SensorError> {
        self.ensure_init()?;
        self.command_with_arg(CMD_PERFORM_FRC, reference_ppm)?;
        let [word] = self.read_words::<1, 3>(FRC_DELAY_MS)?;
        if word == FRC_FAILED {
            warn!("scd4x: sensor rejected forced recalibration");
            return Err(SensorError::CalibrationFailed);
        }
        Ok(word.wrapping_sub(0x8000) as i16)
    }
}
