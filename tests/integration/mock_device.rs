//! Mock device for integration tests.
//!
//! Records every port call, and every timer schedule / cancel, into one
//! shared log so tests can assert on cross-port ordering.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use airmon::app::events::AppEvent;
use airmon::app::ports::{
    AttributeStore, EventSink, Indicator, IndicatorPort, NetworkPort, PixelPort, Quantity, Rgb,
    SensorPort, TimerId, TimerPort,
};
use airmon::error::{InitError, NetworkError, ScheduleError, SensorError};
use airmon::events::{NetworkSignal, SignalBuffer, SignalKind};
use airmon::scheduler::AlarmQueue;
use airmon::zcl;
use embassy_time::{Duration, Instant};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SensorInit,
    Fetch,
    StartPeriodic,
    StopPeriodic,
    Frc(u16),
    SetAttribute(u16, u16),
    Indicator(Indicator, bool),
    Toggle(Indicator),
    Pixels(Rgb),
    RegisterDevice,
    RegisterIdentify,
    RxOnWhenIdle(bool),
    Enable,
    Steering,
    StartIdentify,
    CancelIdentify,
    FactoryReset,
    DefaultHandler(SignalKind),
    Release(u32),
    Schedule(TimerId),
    Cancel(TimerId),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

// ── MockDevice ────────────────────────────────────────────────

pub struct MockDevice {
    pub log: CallLog,
    pub attributes: HashMap<(u16, u16), Vec<u8>>,
    pub co2_ppm: f32,
    pub fail_fetch: bool,
    pub fail_frc: bool,
    pub joined: bool,
    pub steering_error: Option<NetworkError>,
    pub identify_led: bool,
    pub status_led: bool,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            attributes: HashMap::new(),
            co2_ppm: 800.0,
            fail_fetch: false,
            fail_frc: false,
            joined: true,
            steering_error: None,
            identify_led: false,
            status_led: false,
        }
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn count(&self, call: &Call) -> usize {
        self.log.borrow().iter().filter(|c| *c == call).count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.log.borrow().iter().position(|c| c == call)
    }

    pub fn last_pixel(&self) -> Option<Rgb> {
        self.log.borrow().iter().rev().find_map(|c| match c {
            Call::Pixels(rgb) => Some(*rgb),
            _ => None,
        })
    }

    pub fn attribute(&self, cluster: u16, attribute: u16) -> Option<&[u8]> {
        self.attributes.get(&(cluster, attribute)).map(Vec::as_slice)
    }
}

impl SensorPort for MockDevice {
    fn init(&mut self) -> Result<(), SensorError> {
        self.record(Call::SensorInit);
        Ok(())
    }

    fn fetch_sample(&mut self) -> Result<(), SensorError> {
        self.record(Call::Fetch);
        if self.fail_fetch {
            Err(SensorError::Bus)
        } else {
            Ok(())
        }
    }

    fn read(&mut self, quantity: Quantity) -> Result<f32, SensorError> {
        Ok(match quantity {
            Quantity::Temperature => 21.5,
            Quantity::Humidity => 48.0,
            Quantity::Co2 => self.co2_ppm,
        })
    }

    fn start_periodic(&mut self) -> Result<(), SensorError> {
        self.record(Call::StartPeriodic);
        Ok(())
    }

    fn stop_periodic(&mut self) -> Result<(), SensorError> {
        self.record(Call::StopPeriodic);
        Ok(())
    }

    fn forced_recalibration(&mut self, reference_ppm: u16) -> Result<i16, SensorError> {
        self.record(Call::Frc(reference_ppm));
        if self.fail_frc {
            Err(SensorError::CalibrationFailed)
        } else {
            Ok(35)
        }
    }
}

impl AttributeStore for MockDevice {
    fn register_device(&mut self) -> Result<(), InitError> {
        self.record(Call::RegisterDevice);
        Ok(())
    }

    fn set_attribute(&mut self, cluster: u16, attribute: u16, value: &[u8]) -> u8 {
        self.record(Call::SetAttribute(cluster, attribute));
        self.attributes.insert((cluster, attribute), value.to_vec());
        zcl::STATUS_SUCCESS
    }
}

impl NetworkPort for MockDevice {
    fn is_joined(&self) -> bool {
        self.joined
    }

    fn enable(&mut self) -> Result<(), InitError> {
        self.record(Call::Enable);
        Ok(())
    }

    fn register_identify_handler(&mut self) -> Result<(), InitError> {
        self.record(Call::RegisterIdentify);
        Ok(())
    }

    fn set_rx_on_when_idle(&mut self, on: bool) {
        self.record(Call::RxOnWhenIdle(on));
    }

    fn start_steering(&mut self) -> Result<(), NetworkError> {
        self.record(Call::Steering);
        self.steering_error.map_or(Ok(()), Err)
    }

    fn start_identify(&mut self) -> Result<(), NetworkError> {
        self.record(Call::StartIdentify);
        Ok(())
    }

    fn cancel_identify(&mut self) -> Result<(), NetworkError> {
        self.record(Call::CancelIdentify);
        Ok(())
    }

    fn factory_reset(&mut self) {
        self.record(Call::FactoryReset);
        self.joined = false;
    }

    fn default_signal_handler(&mut self, signal: &NetworkSignal) {
        self.record(Call::DefaultHandler(signal.kind));
    }

    fn release_buffer(&mut self, buffer: SignalBuffer) {
        self.record(Call::Release(buffer.0));
    }
}

impl IndicatorPort for MockDevice {
    fn init_leds(&mut self) -> Result<(), InitError> {
        Ok(())
    }

    fn set_indicator(&mut self, led: Indicator, on: bool) {
        self.record(Call::Indicator(led, on));
        match led {
            Indicator::Status => self.status_led = on,
            Indicator::Identify => self.identify_led = on,
        }
    }

    fn toggle_indicator(&mut self, led: Indicator) {
        self.record(Call::Toggle(led));
        match led {
            Indicator::Status => self.status_led = !self.status_led,
            Indicator::Identify => self.identify_led = !self.identify_led,
        }
    }
}

impl PixelPort for MockDevice {
    fn update_pixels(&mut self, pixels: &[Rgb]) -> Result<(), i32> {
        if let Some(&rgb) = pixels.first() {
            self.record(Call::Pixels(rgb));
        }
        Ok(())
    }
}

// ── RecordingTimers ───────────────────────────────────────────

/// [`AlarmQueue`] that also logs schedule / cancel into the device log.
pub struct RecordingTimers {
    inner: AlarmQueue,
    log: CallLog,
}

impl RecordingTimers {
    pub fn new(log: CallLog) -> Self {
        Self {
            inner: AlarmQueue::new(Instant::from_millis(0)),
            log,
        }
    }
}

impl TimerPort for RecordingTimers {
    fn now(&self) -> Instant {
        self.inner.now()
    }

    fn advance_to(&mut self, now: Instant) {
        self.inner.advance_to(now);
    }

    fn schedule(&mut self, id: TimerId, delay: Duration) -> Result<(), ScheduleError> {
        self.log.borrow_mut().push(Call::Schedule(id));
        self.inner.schedule(id, delay)
    }

    fn cancel(&mut self, id: TimerId) -> Result<(), ScheduleError> {
        self.log.borrow_mut().push(Call::Cancel(id));
        self.inner.cancel(id)
    }

    fn is_scheduled(&self, id: TimerId) -> bool {
        self.inner.is_scheduled(id)
    }

    fn pop_due(&mut self) -> Option<TimerId> {
        self.inner.pop_due()
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.inner.next_deadline()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
