//! Button dispatcher: debounced edges → [`AppCommand`]s.
//!
//! ## Mapping
//!
//! | Button    | Edge    | Condition               | Command            |
//! |-----------|---------|-------------------------|--------------------|
//! | Pair      | release | joined                  | `ToggleIdentify`   |
//! | Pair      | release | not joined              | `StartPairing`     |
//! | Pair      | release | reset just performed    | (suppressed)       |
//! | Calibrate | release | held ≥ long-press       | `Calibrate`        |
//! | Calibrate | release | held < long-press       | `ToggleDisplay`    |
//!
//! Every event reaches the [`FactoryResetWatcher`] first, whatever the
//! dispatcher makes of it.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use log::debug;

use super::commands::AppCommand;
use super::factory_reset::FactoryResetWatcher;
use super::ports::TimerPort;
use crate::events::ButtonEvent;

/// Physical buttons and their bit in [`ButtonEvent`] masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Pairing / identify, shared with factory reset.
    Pair,
    Calibrate,
}

impl Button {
    pub const fn mask(self) -> u32 {
        match self {
            Self::Pair => 1 << 0,
            Self::Calibrate => 1 << 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    ShortPress,
    LongPress,
}

/// `held >= threshold` is a long press.
pub fn classify_press(held: Duration, threshold: Duration) -> PressKind {
    if held >= threshold {
        PressKind::LongPress
    } else {
        PressKind::ShortPress
    }
}

/// Held-duration timer: started on the press edge, read and reset on the
/// release edge.
#[derive(Debug, Default)]
pub struct PressTimer {
    started: Option<Instant>,
}

impl PressTimer {
    pub fn start(&mut self, now: Instant) {
        self.started = Some(now);
    }

    /// `None` if no press was seen, e.g. a release right after boot.
    pub fn finish(&mut self, now: Instant, threshold: Duration) -> Option<PressKind> {
        let started = self.started.take()?;
        Some(classify_press(
            now.saturating_duration_since(started),
            threshold,
        ))
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

#[derive(Debug)]
pub struct ButtonDispatcher {
    long_press: Duration,
    calibrate_timer: PressTimer,
}

impl ButtonDispatcher {
    pub fn new(long_press: Duration) -> Self {
        Self {
            long_press,
            calibrate_timer: PressTimer::default(),
        }
    }

    /// Handle one `(pressed, changed)` event. At most one command per
    /// button.
    pub fn dispatch(
        &mut self,
        event: ButtonEvent,
        joined: bool,
        reset: &mut FactoryResetWatcher,
        timers: &mut impl TimerPort,
    ) -> Vec<AppCommand, 2> {
        reset.on_button_event(event, timers);

        let mut out = Vec::new();
        let now = timers.now();

        if event.went_up(Button::Pair.mask()) {
            if reset.take_reset_performed() {
                debug!("pair release after factory reset suppressed");
            } else {
                let cmd = if joined {
                    AppCommand::ToggleIdentify
                } else {
                    AppCommand::StartPairing
                };
                let _ = out.push(cmd);
            }
        }

        let calibrate = Button::Calibrate.mask();
        if event.went_down(calibrate) {
            self.calibrate_timer.start(now);
        } else if event.went_up(calibrate) {
            match self.calibrate_timer.finish(now, self.long_press) {
                Some(PressKind::LongPress) => {
                    let _ = out.push(AppCommand::Calibrate);
                }
                Some(PressKind::ShortPress) => {
                    let _ = out.push(AppCommand::ToggleDisplay);
                }
                None => debug!("calibrate release without press ignored"),
            }
        }

        out
    }
}
