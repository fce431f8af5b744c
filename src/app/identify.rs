//! Identify blinker: toggles the identify LED at a fixed interval while the
//! endpoint is in identify mode.

use embassy_time::Duration;
use log::{debug, error};

use super::ports::{Indicator, IndicatorPort, TimerId, TimerPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkState {
    Off,
    Blinking,
}

#[derive(Debug)]
pub struct IdentifyBlinker {
    state: BlinkState,
    interval: Duration,
}

impl IdentifyBlinker {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: BlinkState::Off,
            interval,
        }
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    pub fn is_blinking(&self) -> bool {
        self.state == BlinkState::Blinking
    }

    /// Toggle immediately and arm the repeat. A second start while already
    /// blinking does nothing, so there is never more than one toggle timer.
    pub fn start(&mut self, leds: &mut impl IndicatorPort, timers: &mut impl TimerPort) {
        if self.is_blinking() {
            return;
        }
        self.state = BlinkState::Blinking;
        debug!("identify blink start");
        leds.toggle_indicator(Indicator::Identify);
        self.arm(timers);
    }

    /// Cancel the toggle timer and leave the LED off.
    pub fn stop(&mut self, leds: &mut impl IndicatorPort, timers: &mut impl TimerPort) {
        if let Err(e) = timers.cancel(TimerId::IdentifyBlink) {
            error!("identify timer cancel failed: {e}");
        }
        if self.is_blinking() {
            debug!("identify blink stop");
        }
        self.state = BlinkState::Off;
        leds.set_indicator(Indicator::Identify, false);
    }

    /// Toggle timer expired.
    pub fn on_timer(&mut self, leds: &mut impl IndicatorPort, timers: &mut impl TimerPort) {
        if !self.is_blinking() {
            return;
        }
        leds.toggle_indicator(Indicator::Identify);
        self.arm(timers);
    }

    fn arm(&self, timers: &mut impl TimerPort) {
        if let Err(e) = timers.schedule(TimerId::IdentifyBlink, self.interval) {
            error!("identify timer schedule failed: {e}");
        }
    }
}
