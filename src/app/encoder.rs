//! Physical reading → ZCL measured-value attribute.
//!
//! | Quantity    | Cluster | Encoding                         |
//! |-------------|---------|----------------------------------|
//! | Temperature | 0x0402  | `i16`, value × 100 (0.01 °C)     |
//! | Humidity    | 0x0405  | `i16`, value × 100 (0.01 %RH)    |
//! | CO2         | 0x040D  | `f32`, ppm × 1e-6 (fraction)     |
//!
//! Values outside the configured valid range are never written.

use heapless::Vec;
use log::debug;

use super::ports::{AttributeStore, Quantity};
use crate::error::{EncodeError, PublishError, Result};
use crate::zcl;

/// Inclusive (min, max) physical range per quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidRanges {
    pub temperature_c: (f32, f32),
    pub humidity_pct: (f32, f32),
    pub co2_ppm: (f32, f32),
}

impl ValidRanges {
    pub fn for_quantity(&self, quantity: Quantity) -> (f32, f32) {
        match quantity {
            Quantity::Temperature => self.temperature_c,
            Quantity::Humidity => self.humidity_pct,
            Quantity::Co2 => self.co2_ppm,
        }
    }
}

/// Wire representation of one measured value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Encoded {
    I16(i16),
    F32(f32),
}

impl Encoded {
    pub fn to_le_bytes(self) -> Vec<u8, 4> {
        let mut out = Vec::new();
        // Both widths fit the 4-byte capacity.
        let _ = match self {
            Self::I16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
        };
        out
    }
}

/// Cluster carrying `quantity`.
pub const fn cluster_for(quantity: Quantity) -> u16 {
    match quantity {
        Quantity::Temperature => zcl::CLUSTER_TEMPERATURE,
        Quantity::Humidity => zcl::CLUSTER_HUMIDITY,
        Quantity::Co2 => zcl::CLUSTER_CO2,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttributeEncoder {
    ranges: ValidRanges,
}

impl AttributeEncoder {
    pub fn new(ranges: ValidRanges) -> Self {
        Self { ranges }
    }

    /// Range-check and scale. Pure.
    pub fn encode(&self, quantity: Quantity, value: f32) -> core::result::Result<Encoded, EncodeError> {
        if !value.is_finite() {
            return Err(EncodeError::NotFinite(quantity));
        }
        let (min, max) = self.ranges.for_quantity(quantity);
        if value < min || value > max {
            return Err(EncodeError::OutOfRange { quantity, value });
        }
        Ok(match quantity {
            Quantity::Temperature | Quantity::Humidity => Encoded::I16(zcl::centi(value)),
            Quantity::Co2 => Encoded::F32(value * 1e-6),
        })
    }

    /// Encode and write the measured-value attribute. Returns the physical
    /// value that was published.
    pub fn publish(
        &self,
        quantity: Quantity,
        value: f32,
        store: &mut impl AttributeStore,
    ) -> Result<f32> {
        let encoded = self.encode(quantity, value)?;
        let cluster = cluster_for(quantity);
        let status = store.set_attribute(cluster, zcl::ATTR_MEASURED_VALUE, &encoded.to_le_bytes());
        if status != zcl::STATUS_SUCCESS {
            return Err(PublishError {
                cluster,
                attribute: zcl::ATTR_MEASURED_VALUE,
                status,
            }
            .into());
        }
        debug!("{:?} = {} published", quantity, value);
        Ok(value)
    }
}
