//! Zigbee Cluster Library catalogue for the sensor endpoint.
//!
//! Cluster and attribute identifiers, the unknown-value sentinels, and the
//! attribute values written once at boot before the first measurement.

use heapless::Vec;

use crate::app::encoder::ValidRanges;

/// Application endpoint carrying every sensor cluster. Zigbee2MQTT's
/// converter for this device binds endpoint 1.
pub const ENDPOINT: u8 = 1;
/// Home Automation profile.
pub const PROFILE_HA: u16 = 0x0104;
/// HA "Temperature Sensor" device id; the closest standard match.
pub const DEVICE_ID: u16 = 0x0302;

// ── Clusters ─────────────────────────────────────────────────

pub const CLUSTER_BASIC: u16 = 0x0000;
pub const CLUSTER_IDENTIFY: u16 = 0x0003;
pub const CLUSTER_TEMPERATURE: u16 = 0x0402;
pub const CLUSTER_HUMIDITY: u16 = 0x0405;
pub const CLUSTER_CO2: u16 = 0x040D;

// ── Attributes ───────────────────────────────────────────────

/// Basic cluster attribute ids.
pub mod basic {
    pub const ZCL_VERSION: u16 = 0x0000;
    pub const APP_VERSION: u16 = 0x0001;
    pub const STACK_VERSION: u16 = 0x0002;
    pub const HW_VERSION: u16 = 0x0003;
    pub const MANUFACTURER_NAME: u16 = 0x0004;
    pub const MODEL_IDENTIFIER: u16 = 0x0005;
    pub const DATE_CODE: u16 = 0x0006;
    pub const POWER_SOURCE: u16 = 0x0007;
}

/// Identify cluster `IdentifyTime` (seconds remaining).
pub const ATTR_IDENTIFY_TIME: u16 = 0x0000;

/// Identify period requested by a local button press, in seconds.
pub const IDENTIFY_TIME_SECS: u16 = 180;

/// Measurement cluster attribute ids (shared by 0x0402, 0x0405, 0x040D).
pub const ATTR_MEASURED_VALUE: u16 = 0x0000;
pub const ATTR_MIN_MEASURED_VALUE: u16 = 0x0001;
pub const ATTR_MAX_MEASURED_VALUE: u16 = 0x0002;
pub const ATTR_TOLERANCE: u16 = 0x0003;

/// ZCL success status.
pub const STATUS_SUCCESS: u8 = 0x00;
pub const STATUS_FAILURE: u8 = 0x01;
pub const STATUS_UNSUPPORTED_ATTRIBUTE: u8 = 0x86;

// ── Device identity ──────────────────────────────────────────

pub const MANUFACTURER: &str = "DIY";
pub const MODEL: &str = "AirQualityMonitor_v1.0";
pub const DATE_CODE: &str = "20230105";
pub const APP_VERSION: u8 = 1;
pub const STACK_VERSION: u8 = 3;
pub const HW_VERSION: u8 = 1;
pub const ZCL_VERSION: u8 = 3;
/// Basic cluster power source: DC source.
pub const POWER_SOURCE_DC: u8 = 0x04;

// ── Unknown-value sentinels ──────────────────────────────────

pub const TEMPERATURE_UNKNOWN: i16 = i16::MIN; // 0x8000
pub const HUMIDITY_UNKNOWN: u16 = 0xFFFF;

/// Longest ZCL character string we write (length byte + payload).
pub const MAX_ATTR_LEN: usize = 33;

/// A typed attribute value, serialised little-endian as ZCL expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrValue {
    U8(u8),
    U16(u16),
    I16(i16),
    F32(f32),
    /// Octet-length-prefixed character string.
    Str(&'static str),
}

impl AttrValue {
    pub fn to_bytes(&self) -> Vec<u8, MAX_ATTR_LEN> {
        let mut out = Vec::new();
        // Capacity holds every numeric width; strings are truncated below.
        let _ = match *self {
            Self::U8(v) => out.extend_from_slice(&[v]),
            Self::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::I16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::Str(s) => return zcl_string(s),
        };
        out
    }
}

/// Encode `s` as a ZCL character string, truncating to fit.
pub fn zcl_string(s: &str) -> Vec<u8, MAX_ATTR_LEN> {
    let bytes = s.as_bytes();
    let len = bytes.len().min(MAX_ATTR_LEN - 1);
    let mut out = Vec::new();
    let _ = out.push(len as u8);
    let _ = out.extend_from_slice(&bytes[..len]);
    out
}

/// One attribute written at boot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeDefault {
    pub cluster: u16,
    pub attribute: u16,
    pub value: AttrValue,
}

const fn attr(cluster: u16, attribute: u16, value: AttrValue) -> AttributeDefault {
    AttributeDefault {
        cluster,
        attribute,
        value,
    }
}

pub const BOOT_DEFAULT_COUNT: usize = 19;

/// Identity strings, ranges and tolerances, with every measured value set
/// to its unknown sentinel so no stale reading is reported before the first
/// cycle.
pub fn boot_defaults(ranges: &ValidRanges) -> Vec<AttributeDefault, BOOT_DEFAULT_COUNT> {
    let (t_min, t_max) = ranges.temperature_c;
    let (h_min, h_max) = ranges.humidity_pct;
    let (c_min, c_max) = ranges.co2_ppm;

    let table = [
        // Basic
        attr(CLUSTER_BASIC, basic::ZCL_VERSION, AttrValue::U8(ZCL_VERSION)),
        attr(CLUSTER_BASIC, basic::APP_VERSION, AttrValue::U8(APP_VERSION)),
        attr(CLUSTER_BASIC, basic::STACK_VERSION, AttrValue::U8(STACK_VERSION)),
        attr(CLUSTER_BASIC, basic::HW_VERSION, AttrValue::U8(HW_VERSION)),
        attr(CLUSTER_BASIC, basic::MANUFACTURER_NAME, AttrValue::Str(MANUFACTURER)),
        attr(CLUSTER_BASIC, basic::MODEL_IDENTIFIER, AttrValue::Str(MODEL)),
        attr(CLUSTER_BASIC, basic::DATE_CODE, AttrValue::Str(DATE_CODE)),
        attr(CLUSTER_BASIC, basic::POWER_SOURCE, AttrValue::U8(POWER_SOURCE_DC)),
        // Temperature: 0.01 °C units
        attr(CLUSTER_TEMPERATURE, ATTR_MEASURED_VALUE, AttrValue::I16(TEMPERATURE_UNKNOWN)),
        attr(CLUSTER_TEMPERATURE, ATTR_MIN_MEASURED_VALUE, AttrValue::I16(centi(t_min))),
        attr(CLUSTER_TEMPERATURE, ATTR_MAX_MEASURED_VALUE, AttrValue::I16(centi(t_max))),
        attr(CLUSTER_TEMPERATURE, ATTR_TOLERANCE, AttrValue::U16(100)),
        // Humidity: 0.01 %RH units
        attr(CLUSTER_HUMIDITY, ATTR_MEASURED_VALUE, AttrValue::U16(HUMIDITY_UNKNOWN)),
        attr(CLUSTER_HUMIDITY, ATTR_MIN_MEASURED_VALUE, AttrValue::I16(centi(h_min))),
        attr(CLUSTER_HUMIDITY, ATTR_MAX_MEASURED_VALUE, AttrValue::I16(centi(h_max))),
        // CO2: fraction of one (ppm × 1e-6)
        attr(CLUSTER_CO2, ATTR_MEASURED_VALUE, AttrValue::F32(f32::NAN)),
        attr(CLUSTER_CO2, ATTR_MIN_MEASURED_VALUE, AttrValue::F32(c_min * 1e-6)),
        attr(CLUSTER_CO2, ATTR_MAX_MEASURED_VALUE, AttrValue::F32(c_max * 1e-6)),
        attr(CLUSTER_CO2, ATTR_TOLERANCE, AttrValue::F32(100.0 * 1e-6)),
    ];

    let mut out = Vec::new();
    for entry in table {
        let _ = out.push(entry);
    }
    out
}

/// Scale a physical value to the signed 0.01-unit attribute encoding.
pub fn centi(value: f32) -> i16 {
    (value * 100.0)
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}
