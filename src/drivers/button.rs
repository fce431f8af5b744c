//! Polled button debouncer.
//!
//! ## Hardware
//!
//! Two active-low momentary switches with pull-ups. A periodic esp_timer
//! (task dispatch, not ISR) samples both levels every
//! [`BUTTON_SCAN_PERIOD_MS`](crate::pins::BUTTON_SCAN_PERIOD_MS) and feeds
//! the raw mask into [`ButtonDebouncer::sample`]. A level must hold for
//! the debounce time before it is reported as a [`ButtonEvent`] on the
//! global event queue.
//!
//! Timestamps are `u32` milliseconds and compared with `wrapping_sub`, so
//! the 49-day rollover is harmless.

use crate::app::buttons::Button;
use crate::events::ButtonEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonDebouncer {
    debounce_ms: u32,
    /// Last reported mask.
    stable: u32,
    /// Mask being confirmed.
    candidate: u32,
    since_ms: u32,
}

impl ButtonDebouncer {
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            stable: 0,
            candidate: 0,
            since_ms: 0,
        }
    }

    /// Feed one raw sample (bit set = pressed). Returns an event once a new
    /// level has been stable for the debounce time.
    pub fn sample(&mut self, raw: u32, now_ms: u32) -> Option<ButtonEvent> {
        if raw != self.candidate {
            self.candidate = raw;
            self.since_ms = now_ms;
            return None;
        }
        if self.candidate == self.stable || now_ms.wrapping_sub(self.since_ms) < self.debounce_ms {
            return None;
        }
        let changed = self.stable ^ self.candidate;
        self.stable = self.candidate;
        Some(ButtonEvent::new(self.stable, changed))
    }

    pub fn pressed(&self) -> u32 {
        self.stable
    }
}

/// Raw pressed mask from the button GPIOs.
pub fn read_raw() -> u32 {
    use crate::drivers::hw_init::gpio_read;
    use crate::pins;

    let mut mask = 0;
    if !gpio_read(pins::BUTTON_PAIR_GPIO) {
        mask |= Button::Pair.mask();
    }
    if !gpio_read(pins::BUTTON_CALIBRATE_GPIO) {
        mask |= Button::Calibrate.mask();
    }
    mask
}

// ── Scan timer ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod scan {
    use core::cell::RefCell;

    use embassy_sync::blocking_mutex::Mutex;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use esp_idf_svc::sys::*;
    use log::info;

    use super::{ButtonDebouncer, read_raw};
    use crate::error::InitError;
    use crate::events::{EVENTS, Event};
    use crate::pins;

    static DEBOUNCER: Mutex<CriticalSectionRawMutex, RefCell<ButtonDebouncer>> =
        Mutex::new(RefCell::new(ButtonDebouncer::new(50)));

    unsafe extern "C" fn scan_cb(_arg: *mut core::ffi::c_void) {
        let raw = read_raw();
        // SAFETY: high-resolution counter read.
        let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
        let event = DEBOUNCER.lock(|d| d.borrow_mut().sample(raw, now_ms));
        if let Some(ev) = event {
            EVENTS.push(Event::Button(ev));
        }
    }

    pub fn start(debounce_ms: u32) -> Result<(), InitError> {
        DEBOUNCER.lock(|d| *d.borrow_mut() = ButtonDebouncer::new(debounce_ms));

        let args = esp_timer_create_args_t {
            callback: Some(scan_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"buttons".as_ptr(),
            skip_unhandled_events: true,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: the handle lives for the rest of the program; the timer
        // is never deleted.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK {
            return Err(InitError::Status("button timer create", ret));
        }
        let period_us = u64::from(pins::BUTTON_SCAN_PERIOD_MS) * 1_000;
        let ret = unsafe { esp_timer_start_periodic(handle, period_us) };
        if ret != ESP_OK {
            return Err(InitError::Status("button timer start", ret));
        }
        info!("buttons: scanning every {} ms", pins::BUTTON_SCAN_PERIOD_MS);
        Ok(())
    }
}

/// Configure the inputs and start the periodic scan.
#[cfg(target_os = "espidf")]
pub fn start_scanning(debounce_ms: u32) -> Result<(), crate::error::InitError> {
    crate::drivers::hw_init::init_button_inputs()?;
    scan::start(debounce_ms)
}
