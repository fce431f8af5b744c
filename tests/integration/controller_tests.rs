//! Controller scenarios against the recording mock device.
//!
//! Every test drives the controller only through its public inputs
//! (queued events and elapsed time), the way the main loop does.

use airmon::app::buttons::Button;
use airmon::app::calibration::CalibrationOutcome;
use airmon::app::controller::Controller;
use airmon::app::events::AppEvent;
use airmon::app::feedback::ColorState;
use airmon::app::mode::Mode;
use airmon::app::ports::{Indicator, Rgb, TimerId};
use airmon::config::DeviceConfig;
use airmon::error::{NetworkError, SensorError};
use airmon::events::{ButtonEvent, Event, NetworkSignal, SignalBuffer, SignalKind};
use airmon::zcl;
use embassy_time::Instant;

use crate::mock_device::{Call, CallLog, MockDevice, RecordingSink, RecordingTimers};

const PAIR: u32 = Button::Pair.mask();
const CAL: u32 = Button::Calibrate.mask();

struct Rig {
    c: Controller<RecordingTimers>,
    dev: MockDevice,
    sink: RecordingSink,
    now_ms: u64,
    held: u32,
}

impl Rig {
    fn new() -> Self {
        Self::with_config(DeviceConfig::default())
    }

    fn with_config(config: DeviceConfig) -> Self {
        let log = CallLog::default();
        Self {
            c: Controller::new(config, RecordingTimers::new(log.clone())),
            dev: MockDevice::new(log),
            sink: RecordingSink::new(),
            now_ms: 0,
            held: 0,
        }
    }

    /// Boot and deliver the stack's startup signal.
    fn started() -> Self {
        let mut r = Self::new();
        r.c.boot(&mut r.dev, &mut r.sink);
        r.signal(SignalKind::SkipStartup, 0);
        r
    }

    fn now(&self) -> Instant {
        Instant::from_millis(self.now_ms)
    }

    fn event(&mut self, event: Event) {
        let now = self.now();
        self.c.handle_event(event, now, &mut self.dev, &mut self.sink);
    }

    fn signal(&mut self, kind: SignalKind, status: i32) {
        self.event(Event::Network(NetworkSignal::new(kind, status)));
    }

    fn press(&mut self, mask: u32) {
        self.held |= mask;
        self.event(Event::Button(ButtonEvent::new(self.held, mask)));
    }

    fn release(&mut self, mask: u32) {
        self.held &= !mask;
        self.event(Event::Button(ButtonEvent::new(self.held, mask)));
    }

    /// Let `ms` pass, running every timer that falls due.
    fn advance(&mut self, ms: u64) -> usize {
        self.now_ms += ms;
        let now = self.now();
        self.c.run_due(now, &mut self.dev, &mut self.sink)
    }

    fn measured(&self) -> Vec<&AppEvent> {
        self.sink
            .events
            .iter()
            .filter(|e| matches!(e, AppEvent::Measured(_)))
            .collect()
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_configures_sleepy_end_device_and_enables_stack() {
    let mut r = Rig::new();
    let report = r.c.boot(&mut r.dev, &mut r.sink);
    assert!(report.is_clean());
    assert_eq!(r.dev.count(&Call::RxOnWhenIdle(false)), 1);
    let enable = r.dev.position(&Call::Enable).unwrap();
    let register = r.dev.position(&Call::RegisterDevice).unwrap();
    assert!(register < enable);
    assert_eq!(r.sink.last(), Some(&AppEvent::Started { failed_steps: 0 }));
}

#[test]
fn boot_writes_unknown_sentinels() {
    let mut r = Rig::new();
    r.c.boot(&mut r.dev, &mut r.sink);
    assert_eq!(
        r.dev.attribute(zcl::CLUSTER_TEMPERATURE, zcl::ATTR_MEASURED_VALUE),
        Some(&i16::MIN.to_le_bytes()[..])
    );
    assert_eq!(
        r.dev.attribute(zcl::CLUSTER_HUMIDITY, zcl::ATTR_MEASURED_VALUE),
        Some(&[0xFF, 0xFF][..])
    );
    let co2 = r.dev.attribute(zcl::CLUSTER_CO2, zcl::ATTR_MEASURED_VALUE).unwrap();
    assert!(f32::from_le_bytes(co2.try_into().unwrap()).is_nan());
}

// ── Measurement cycle ─────────────────────────────────────────

#[test]
fn nothing_measured_before_stack_start() {
    let mut r = Rig::new();
    r.c.boot(&mut r.dev, &mut r.sink);
    r.advance(120_000);
    assert_eq!(r.dev.count(&Call::Fetch), 0);
}

#[test]
fn first_cycle_after_initial_delay_then_every_period() {
    let mut r = Rig::started();
    r.advance(4_999);
    assert_eq!(r.dev.count(&Call::Fetch), 0);
    r.advance(1);
    assert_eq!(r.dev.count(&Call::Fetch), 1);

    assert_eq!(
        r.dev.attribute(zcl::CLUSTER_TEMPERATURE, zcl::ATTR_MEASURED_VALUE),
        Some(&2150i16.to_le_bytes()[..])
    );
    assert_eq!(
        r.dev.attribute(zcl::CLUSTER_HUMIDITY, zcl::ATTR_MEASURED_VALUE),
        Some(&4800i16.to_le_bytes()[..])
    );
    assert_eq!(
        r.dev.attribute(zcl::CLUSTER_CO2, zcl::ATTR_MEASURED_VALUE),
        Some(&(800.0f32 * 1e-6).to_le_bytes()[..])
    );
    assert_eq!(r.dev.last_pixel(), Some(Rgb::new(0, 255, 0)));

    r.advance(59_999);
    assert_eq!(r.dev.count(&Call::Fetch), 1);
    r.advance(1);
    assert_eq!(r.dev.count(&Call::Fetch), 2);
    assert_eq!(r.measured().len(), 2);
}

#[test]
fn repeated_startup_signal_does_not_double_schedule() {
    let mut r = Rig::started();
    r.advance(2_000);
    r.signal(SignalKind::SkipStartup, 0);
    r.advance(3_000);
    assert_eq!(r.dev.count(&Call::Fetch), 1);
}

#[test]
fn fetch_failure_skips_publishing_but_keeps_cycling() {
    let mut r = Rig::started();
    r.dev.fail_fetch = true;
    r.advance(5_000);
    let publishes = r
        .dev
        .calls()
        .iter()
        .filter(|c| **c == Call::SetAttribute(zcl::CLUSTER_CO2, zcl::ATTR_MEASURED_VALUE))
        .count();
    // Only the boot-time sentinel write.
    assert_eq!(publishes, 1);

    match r.sink.last() {
        Some(AppEvent::Measured(report)) => {
            assert_eq!(report.published, 0);
            assert_eq!(report.fetch_error, Some(SensorError::Bus));
        }
        other => panic!("expected Measured, got {other:?}"),
    }

    r.dev.fail_fetch = false;
    r.advance(60_000);
    assert_eq!(r.dev.count(&Call::Fetch), 2);
}

#[test]
fn colour_follows_co2_bands() {
    let mut r = Rig::started();
    r.dev.co2_ppm = 1_000.0;
    r.advance(5_000);
    assert_eq!(r.dev.last_pixel(), Some(ColorState::Orange.rgb()));

    r.dev.co2_ppm = 1_600.5;
    r.advance(60_000);
    assert_eq!(r.dev.last_pixel(), Some(ColorState::Red.rgb()));

    // Same band again: no redundant write.
    let before = r.dev.calls().len();
    r.advance(60_000);
    let pixel_writes = r.dev.calls()[before..]
        .iter()
        .filter(|c| matches!(c, Call::Pixels(_)))
        .count();
    assert_eq!(pixel_writes, 0);
}

#[test]
fn co2_1200_orange_then_1700_red_once() {
    let mut r = Rig::started();
    r.dev.co2_ppm = 1_200.0;
    r.advance(5_000);
    assert_eq!(r.dev.last_pixel(), Some(ColorState::Orange.rgb()));

    r.dev.co2_ppm = 1_700.0;
    r.advance(60_000);
    assert_eq!(r.dev.last_pixel(), Some(ColorState::Red.rgb()));
    let writes = |r: &Rig| r.dev.calls().iter().filter(|c| matches!(c, Call::Pixels(_))).count();
    let before = writes(&r);

    r.advance(60_000);
    assert_eq!(r.dev.count(&Call::Fetch), 3);
    assert_eq!(writes(&r), before);
}

// ── Calibrate button ──────────────────────────────────────────

#[test]
fn long_calibrate_press_runs_recalibration_in_order() {
    let mut r = Rig::started();
    r.advance(5_000);
    r.dev.clear();

    r.press(CAL);
    r.advance(1_000);
    r.release(CAL);

    let pos = |call: Call| r.dev.position(&call).unwrap();
    let cancel = pos(Call::Cancel(TimerId::MeasurementCycle));
    let busy_on = pos(Call::Indicator(Indicator::Status, true));
    let stop = pos(Call::StopPeriodic);
    let frc = pos(Call::Frc(420));
    let start = pos(Call::StartPeriodic);
    let busy_off = pos(Call::Indicator(Indicator::Status, false));
    let rearm = pos(Call::Schedule(TimerId::MeasurementCycle));
    assert!(cancel < busy_on && busy_on < stop && stop < frc && frc < start);
    assert!(start < busy_off && busy_off < rearm);

    assert_eq!(r.c.mode(), Mode::Idle);
    assert!(r.sink.contains(&AppEvent::Calibrated(CalibrationOutcome {
        reference_ppm: 420,
        result: Ok(35),
    })));
    assert!(r.sink.contains(&AppEvent::ModeChanged {
        from: Mode::Idle,
        to: Mode::Calibrating
    }));
    // Cycle resumes a full period after calibration.
    assert_eq!(r.c.next_deadline(), Some(Instant::from_millis(66_000)));
}

#[test]
fn failed_recalibration_still_resumes_sampling() {
    let mut r = Rig::started();
    r.dev.fail_frc = true;
    r.press(CAL);
    r.advance(1_500);
    r.release(CAL);

    assert_eq!(r.dev.count(&Call::StartPeriodic), 1);
    assert!(!r.dev.status_led);
    assert_eq!(
        r.c.last_calibration().map(|o| o.result),
        Some(Err(SensorError::CalibrationFailed))
    );
    assert_eq!(r.c.mode(), Mode::Idle);
    r.advance(60_000);
    assert_eq!(r.dev.count(&Call::Fetch), 1);
}

#[test]
fn short_calibrate_press_toggles_display() {
    let mut r = Rig::started();
    r.advance(5_000);
    assert_eq!(r.dev.last_pixel(), Some(ColorState::Green.rgb()));

    r.press(CAL);
    r.advance(200);
    r.release(CAL);
    assert_eq!(r.dev.last_pixel(), Some(Rgb::OFF));
    assert_eq!(r.sink.last(), Some(&AppEvent::DisplayToggled { enabled: false }));
    assert_eq!(r.dev.count(&Call::Frc(420)), 0);

    // Readings keep flowing while dark; the LED stays off.
    r.dev.co2_ppm = 2_000.0;
    r.advance(60_000);
    assert_eq!(r.dev.last_pixel(), Some(Rgb::OFF));

    r.press(CAL);
    r.advance(100);
    r.release(CAL);
    assert_eq!(r.dev.last_pixel(), Some(ColorState::Red.rgb()));
}

// ── Pair button ───────────────────────────────────────────────

#[test]
fn pair_press_when_not_joined_starts_steering() {
    let mut r = Rig::started();
    r.dev.joined = false;
    r.press(PAIR);
    r.advance(300);
    r.release(PAIR);

    assert_eq!(r.dev.count(&Call::Steering), 1);
    assert_eq!(r.c.mode(), Mode::Pairing);
    assert!(r.dev.status_led);

    r.dev.joined = true;
    r.signal(SignalKind::Steering, 0);
    assert_eq!(r.c.mode(), Mode::Idle);
    assert!(!r.dev.status_led);
    assert!(r.sink.contains(&AppEvent::Joined));
}

#[test]
fn failed_steering_keeps_led_lit_until_retry() {
    let mut r = Rig::started();
    r.dev.joined = false;
    r.press(PAIR);
    r.release(PAIR);
    r.signal(SignalKind::Steering, -1);
    assert_eq!(r.c.mode(), Mode::Idle);
    assert!(r.dev.status_led);

    r.press(PAIR);
    r.release(PAIR);
    assert_eq!(r.dev.count(&Call::Steering), 2);
    assert_eq!(r.c.mode(), Mode::Pairing);
}

#[test]
fn calibration_runs_after_failed_steering() {
    let mut r = Rig::started();
    r.dev.joined = false;
    r.press(PAIR);
    r.release(PAIR);
    r.signal(SignalKind::Steering, -1);
    r.dev.clear();

    r.press(CAL);
    r.advance(1_000);
    r.release(CAL);

    let stop = r.dev.position(&Call::StopPeriodic).unwrap();
    let frc = r.dev.position(&Call::Frc(420)).unwrap();
    let rearm = r.dev.position(&Call::Schedule(TimerId::MeasurementCycle)).unwrap();
    assert!(stop < frc && frc < rearm);
    assert_eq!(r.c.mode(), Mode::Idle);
    assert_eq!(r.c.next_deadline(), Some(Instant::from_millis(61_000)));
}

#[test]
fn steering_request_rejected_by_stack_reverts() {
    let mut r = Rig::started();
    r.dev.joined = false;
    r.dev.steering_error = Some(NetworkError::InvalidState);
    r.press(PAIR);
    r.release(PAIR);
    assert_eq!(r.c.mode(), Mode::Idle);
    assert!(!r.dev.status_led);
}

#[test]
fn pair_press_when_joined_toggles_identify() {
    let mut r = Rig::started();
    r.press(PAIR);
    r.release(PAIR);
    assert_eq!(r.dev.count(&Call::StartIdentify), 1);

    // The stack confirms; the LED starts blinking.
    r.event(Event::Identify(true));
    assert_eq!(r.c.mode(), Mode::Identifying);
    assert!(r.dev.identify_led);
    r.advance(100);
    assert!(!r.dev.identify_led);
    r.advance(100);
    assert!(r.dev.identify_led);

    r.press(PAIR);
    r.release(PAIR);
    assert_eq!(r.dev.count(&Call::CancelIdentify), 1);
    r.event(Event::Identify(false));
    assert_eq!(r.c.mode(), Mode::Idle);
    assert!(!r.dev.identify_led);

    let toggles = r.dev.count(&Call::Toggle(Indicator::Identify));
    r.advance(1_000);
    assert_eq!(r.dev.count(&Call::Toggle(Indicator::Identify)), toggles);
}

#[test]
fn calibration_refused_while_identifying() {
    let mut r = Rig::started();
    r.event(Event::Identify(true));
    r.press(CAL);
    r.advance(1_200);
    r.release(CAL);
    assert_eq!(r.dev.count(&Call::Frc(420)), 0);
    assert_eq!(r.c.mode(), Mode::Identifying);
}

// ── Factory reset ─────────────────────────────────────────────

#[test]
fn long_pair_hold_factory_resets_and_swallows_release() {
    let mut r = Rig::started();
    r.event(Event::Identify(true));
    r.press(PAIR);
    r.advance(4_999);
    assert_eq!(r.dev.count(&Call::FactoryReset), 0);
    r.advance(1);
    assert_eq!(r.dev.count(&Call::FactoryReset), 1);
    assert!(r.sink.contains(&AppEvent::FactoryReset));
    assert_eq!(r.c.mode(), Mode::Idle);
    assert!(!r.dev.identify_led);

    r.advance(1_000);
    r.release(PAIR);
    assert_eq!(r.dev.count(&Call::Steering), 0);
    assert_eq!(r.dev.count(&Call::StartIdentify), 0);
}

#[test]
fn short_pair_press_does_not_reset() {
    let mut r = Rig::started();
    r.press(PAIR);
    r.advance(2_000);
    r.release(PAIR);
    r.advance(10_000);
    assert_eq!(r.dev.count(&Call::FactoryReset), 0);
}

// ── Network signals ───────────────────────────────────────────

#[test]
fn every_signal_gets_default_handling_and_one_release() {
    let mut r = Rig::started();
    let mut signal = NetworkSignal::new(SignalKind::Other(0x17), 0);
    signal.buffer = Some(SignalBuffer(42));
    r.event(Event::Network(signal));

    assert_eq!(r.dev.count(&Call::DefaultHandler(SignalKind::Other(0x17))), 1);
    assert_eq!(r.dev.count(&Call::Release(42)), 1);
    assert_eq!(r.dev.count(&Call::DefaultHandler(SignalKind::SkipStartup)), 1);
}

#[test]
fn reboot_with_stored_network_reports_joined() {
    let mut r = Rig::started();
    r.signal(SignalKind::DeviceReboot, 0);
    assert!(r.sink.contains(&AppEvent::Joined));
}

#[test]
fn leave_stops_identify() {
    let mut r = Rig::started();
    r.event(Event::Identify(true));
    r.dev.joined = false;
    r.signal(SignalKind::Leave, 0);
    assert_eq!(r.c.mode(), Mode::Idle);
    assert!(!r.dev.identify_led);
    assert!(r.sink.contains(&AppEvent::Left));
}
