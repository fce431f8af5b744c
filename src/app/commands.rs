//! Inbound commands to the operational controller.
//!
//! The [`ButtonDispatcher`](super::buttons::ButtonDispatcher) turns raw
//! button edges into these; the
//! [`Controller`](super::controller::Controller) decides whether the
//! current mode allows them and carries them out.

/// Actions requested by the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Start identify if idle, cancel it if identifying (joined only).
    ToggleIdentify,

    /// Light the status LED and start network steering (not joined).
    StartPairing,

    /// Forced recalibration of the CO2 sensor.
    Calibrate,

    /// Blank or restore the CO2 colour LED.
    ToggleDisplay,
}
