//! Factory reset by long hold on the pairing button.
//!
//! Sees every raw event on the shared button, independently of the
//! dispatcher's own short/long classification. When the hold timer expires
//! with the button still down, the network stack is reset and a one-shot
//! flag is raised so the dispatcher can swallow the matching release.

use embassy_time::Duration;
use log::{error, info, warn};

use super::ports::{NetworkPort, TimerId, TimerPort};
use crate::events::ButtonEvent;

#[derive(Debug)]
pub struct FactoryResetWatcher {
    mask: u32,
    hold: Duration,
    holding: bool,
    performed: bool,
}

impl FactoryResetWatcher {
    pub fn new(mask: u32, hold: Duration) -> Self {
        Self {
            mask,
            hold,
            holding: false,
            performed: false,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }

    pub fn on_button_event(&mut self, event: ButtonEvent, timers: &mut impl TimerPort) {
        if event.went_down(self.mask) {
            self.holding = true;
            self.performed = false;
            if let Err(e) = timers.schedule(TimerId::FactoryResetHold, self.hold) {
                error!("factory reset timer schedule failed: {e}");
            }
        } else if event.went_up(self.mask) {
            self.holding = false;
            if let Err(e) = timers.cancel(TimerId::FactoryResetHold) {
                error!("factory reset timer cancel failed: {e}");
            }
        }
    }

    /// Hold timer expired. Returns `true` if the reset was performed.
    pub fn on_hold_elapsed(&mut self, network: &mut impl NetworkPort) -> bool {
        if !self.holding {
            warn!("stale factory reset timer ignored");
            return false;
        }
        info!("button held {} ms: factory reset", self.hold.as_millis());
        network.factory_reset();
        self.performed = true;
        true
    }

    /// `true` once after a reset; clears the flag.
    pub fn take_reset_performed(&mut self) -> bool {
        core::mem::take(&mut self.performed)
    }
}
