//! Alarm queue for deferred work on the main loop.
//!
//! Every timer the controller uses is a named one-shot. The main loop
//! advances the queue's clock and pops expired ids; the controller runs the
//! matching handler, which may re-arm the timer. Nothing fires from
//! interrupt context.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Main loop                             │
//! │                                                              │
//! │   advance_to(now) ──▶ pop_due() ──▶ Controller::on_timer()   │
//! │                                         │                    │
//! │                           schedule(id, delay) (re-arm)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use embassy_time::{Duration, Instant};
use heapless::Vec;
use log::trace;

use crate::app::ports::{TimerId, TimerPort};
use crate::error::ScheduleError;

// ═══════════════════════════════════════════════════════════════
//  Alarm queue
// ═══════════════════════════════════════════════════════════════

/// Maximum number of simultaneously pending alarms.
pub const MAX_ALARMS: usize = 4;

#[derive(Debug, Clone, Copy)]
struct Alarm {
    id: TimerId,
    due: Instant,
    /// Insertion order; breaks ties between equal deadlines.
    seq: u32,
}

/// Fixed-capacity one-shot timer queue, one entry per [`TimerId`].
#[derive(Debug)]
pub struct AlarmQueue {
    now: Instant,
    alarms: Vec<Alarm, MAX_ALARMS>,
    seq: u32,
}

impl AlarmQueue {
    /// Create an empty queue whose clock starts at `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            alarms: Vec::new(),
            seq: 0,
        }
    }

    /// Number of pending alarms.
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// Deadline of `id`, if pending.
    pub fn due_at(&self, id: TimerId) -> Option<Instant> {
        self.alarms.iter().find(|a| a.id == id).map(|a| a.due)
    }

    /// Time left until the next expiry, zero if one is already due.
    pub fn time_to_next(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|due| due.saturating_duration_since(self.now))
    }

    fn remove(&mut self, id: TimerId) -> bool {
        match self.alarms.iter().position(|a| a.id == id) {
            Some(idx) => {
                self.alarms.swap_remove(idx);
                true
            }
            None => false,
        }
    }
}

impl Default for AlarmQueue {
    fn default() -> Self {
        Self::new(Instant::from_ticks(0))
    }
}

impl TimerPort for AlarmQueue {
    fn now(&self) -> Instant {
        self.now
    }

    fn advance_to(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    fn schedule(&mut self, id: TimerId, delay: Duration) -> Result<(), ScheduleError> {
        let replaced = self.remove(id);
        let alarm = Alarm {
            id,
            due: self.now + delay,
            seq: self.seq,
        };
        self.seq = self.seq.wrapping_add(1);
        self.alarms
            .push(alarm)
            .map_err(|_| ScheduleError::QueueFull)?;
        trace!(
            "alarm {:?} {} in {} ms",
            id,
            if replaced { "re-armed" } else { "armed" },
            delay.as_millis()
        );
        Ok(())
    }

    fn cancel(&mut self, id: TimerId) -> Result<(), ScheduleError> {
        if self.remove(id) {
            trace!("alarm {:?} cancelled", id);
        }
        Ok(())
    }

    fn is_scheduled(&self, id: TimerId) -> bool {
        self.alarms.iter().any(|a| a.id == id)
    }

    fn pop_due(&mut self) -> Option<TimerId> {
        let now = self.now;
        let idx = self
            .alarms
            .iter()
            .enumerate()
            .filter(|(_, a)| a.due <= now)
            .min_by_key(|(_, a)| (a.due, a.seq))
            .map(|(i, _)| i)?;
        Some(self.alarms.swap_remove(idx).id)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.alarms.iter().map(|a| a.due).min()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
