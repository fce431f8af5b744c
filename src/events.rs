//! Inbound event queue.
//!
//! Events are produced by:
//! - the button scanner (debounced level changes)
//! - the Zigbee stack task (network signals, identify notifications)
//!
//! and consumed one at a time by the main loop, which hands each to the
//! [`Controller`](crate::app::controller::Controller). Everything the
//! controller does therefore runs on a single execution context.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Button scan  │────▶│              │     │              │
//! │ Zigbee task  │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ Identify cb  │────▶│  (bounded)   │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 16;

/// One debounced button transition.
///
/// Bit `n` of each mask belongs to button `n`
/// (see [`Button`](crate::app::buttons::Button)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonEvent {
    /// Buttons currently held down.
    pub pressed: u32,
    /// Buttons whose state changed in this event.
    pub changed: u32,
}

impl ButtonEvent {
    pub const fn new(pressed: u32, changed: u32) -> Self {
        Self { pressed, changed }
    }

    /// `mask` went down in this event.
    pub const fn went_down(&self, mask: u32) -> bool {
        self.changed & mask != 0 && self.pressed & mask != 0
    }

    /// `mask` came up in this event.
    pub const fn went_up(&self, mask: u32) -> bool {
        self.changed & mask != 0 && self.pressed & mask == 0
    }
}

// ── Network signals ───────────────────────────────────────────

/// Kinds of stack lifecycle signal the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Stack initialised; the app may start its own work.
    SkipStartup,
    /// First boot on a factory-new device.
    DeviceFirstStart,
    /// Restart with stored network credentials.
    DeviceReboot,
    /// Network steering finished.
    Steering,
    /// Node left (or was removed from) the network.
    Leave,
    /// Any other signal, by raw stack id.
    Other(u32),
}

impl SignalKind {
    /// Map the stack's numeric signal id.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::SkipStartup,
            3 => Self::Leave,
            5 => Self::DeviceFirstStart,
            6 => Self::DeviceReboot,
            10 => Self::Steering,
            other => Self::Other(other),
        }
    }
}

/// Opaque stack buffer that carried a signal.
///
/// Not `Clone`: the controller releases it exactly once by value.
#[derive(Debug, PartialEq, Eq)]
pub struct SignalBuffer(pub u32);

/// A stack lifecycle signal.
#[derive(Debug, PartialEq, Eq)]
pub struct NetworkSignal {
    pub kind: SignalKind,
    /// Zero on success.
    pub status: i32,
    /// Present when the stack expects the app to free the buffer.
    pub buffer: Option<SignalBuffer>,
}

impl NetworkSignal {
    pub const fn new(kind: SignalKind, status: i32) -> Self {
        Self {
            kind,
            status,
            buffer: None,
        }
    }

    pub const fn is_ok(&self) -> bool {
        self.status == 0
    }
}

// ── Queue ─────────────────────────────────────────────────────

/// Events consumed by the main loop.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    Button(ButtonEvent),
    Network(NetworkSignal),
    /// Identify started (`true`) or ended (`false`) on the endpoint.
    Identify(bool),
}

/// Bounded multi-producer queue into the main loop.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_CAP>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue without blocking. Returns `false` if the queue is full and
    /// the event was dropped.
    pub fn push(&self, event: Event) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("event queue full, dropping event");
                false
            }
        }
    }

    pub fn pop(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    /// Drain all pending events into a callback, FIFO.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Firmware-wide queue fed by ISRs and the stack task.
pub static EVENTS: EventQueue = EventQueue::new();
