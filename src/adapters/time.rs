//! Monotonic clock adapter.
//!
//! Feeds the controller's [`TimerPort`](crate::app::ports::TimerPort) with
//! the current time as an [`embassy_time::Instant`].
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` (microseconds
//!   since boot).
//! - **`not(target_os = "espidf")`**: `std::time::Instant` from adapter
//!   creation, for simulation.

use embassy_time::Instant;

pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads the always-running high-resolution timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since the clock was created.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn now(&self) -> Instant {
        Instant::from_micros(self.uptime_us())
    }
}
