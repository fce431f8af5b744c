//! Airmon firmware library.
//!
//! The application core in [`app`] is plain Rust and runs on the host. The
//! device side (Zigbee stack, NVS, GPIO, LEDC, I2C) sits behind
//! `#[cfg(target_os = "espidf")]` inside each adapter or driver, with an
//! in-memory stand-in compiled for host builds and tests.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod zcl;

pub mod pins;

// Hardware-facing modules; host builds get in-memory simulation stubs.
pub mod adapters;
pub mod drivers;
pub mod sensors;
