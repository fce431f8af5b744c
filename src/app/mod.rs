//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the behaviour of the air-quality node: the
//! measurement cycle, button dispatch, CO2 colour feedback, identify blink,
//! forced calibration and the operational controller that ties them
//! together. All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod buttons;
pub mod calibration;
pub mod commands;
pub mod controller;
pub mod encoder;
pub mod events;
pub mod factory_reset;
pub mod feedback;
pub mod identify;
pub mod measurement;
pub mod mode;
pub mod ports;
