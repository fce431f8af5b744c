//! Full host stack: controller + hardware adapter + simulated sensor and
//! Zigbee stack. Stack signals are pumped back into the controller the
//! way the main loop drains the event queue.

use airmon::adapters::hardware::HardwareAdapter;
use airmon::adapters::log_sink::LogEventSink;
use airmon::adapters::nvs::NvsAdapter;
use airmon::adapters::zigbee::ZigbeeStack;
use airmon::app::buttons::Button;
use airmon::app::controller::Controller;
use airmon::app::events::AppEvent;
use airmon::app::feedback::ColorState;
use airmon::app::mode::Mode;
use airmon::app::ports::{ConfigPort, Indicator, NetworkPort, Rgb};
use airmon::config::DeviceConfig;
use airmon::error::SensorError;
use airmon::events::{ButtonEvent, Event};
use airmon::scheduler::AlarmQueue;
use airmon::sensors::scd4x::Sample;
use airmon::sensors::sim::SimSensor;
use airmon::zcl;
use embassy_time::Instant;

use crate::mock_device::RecordingSink;

const PAIR: u32 = Button::Pair.mask();
const CAL: u32 = Button::Calibrate.mask();

struct Node {
    c: Controller,
    hw: HardwareAdapter<SimSensor>,
    sink: RecordingSink,
    now_ms: u64,
    held: u32,
}

impl Node {
    fn new(zigbee: ZigbeeStack) -> Self {
        Self::with_config(DeviceConfig::default(), zigbee)
    }

    fn with_config(config: DeviceConfig, zigbee: ZigbeeStack) -> Self {
        Self {
            c: Controller::new(config, AlarmQueue::new(Instant::from_millis(0))),
            hw: HardwareAdapter::new(SimSensor::default(), zigbee),
            sink: RecordingSink::new(),
            now_ms: 0,
            held: 0,
        }
    }

    /// Boot and let the stack settle.
    fn booted(zigbee: ZigbeeStack) -> Self {
        let mut n = Self::new(zigbee);
        n.c.boot(&mut n.hw, &mut n.sink);
        n.pump();
        n
    }

    /// Deliver every event the stack has queued, including ones queued
    /// while handling earlier ones.
    fn pump(&mut self) -> usize {
        let mut n = 0;
        while let Some(event) = self.hw.zigbee_mut().pop_event() {
            let now = Instant::from_millis(self.now_ms);
            self.c.handle_event(event, now, &mut self.hw, &mut self.sink);
            n += 1;
        }
        n
    }

    fn button(&mut self, pressed: u32, changed: u32) {
        self.held = pressed;
        let now = Instant::from_millis(self.now_ms);
        self.c.handle_event(
            Event::Button(ButtonEvent::new(pressed, changed)),
            now,
            &mut self.hw,
            &mut self.sink,
        );
        self.pump();
    }

    fn click(&mut self, mask: u32, hold_ms: u64) {
        self.button(self.held | mask, mask);
        self.advance(hold_ms);
        self.button(self.held & !mask, mask);
    }

    fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
        let now = Instant::from_millis(self.now_ms);
        self.c.run_due(now, &mut self.hw, &mut self.sink);
        self.pump();
    }

    fn attribute(&self, cluster: u16) -> Option<&[u8]> {
        self.hw.zigbee().attribute(cluster, zcl::ATTR_MEASURED_VALUE)
    }
}

#[test]
fn factory_new_node_waits_for_pairing() {
    let n = Node::booted(ZigbeeStack::new());
    assert_eq!(n.hw.zigbee().rx_on_when_idle(), Some(false));
    assert!(!n.sink.contains(&AppEvent::Joined));
    assert_eq!(n.c.mode(), Mode::Idle);
    // SkipStartup and DeviceFirstStart, each handed back once.
    assert_eq!(n.hw.zigbee().released_buffers(), &[1, 2]);
}

#[test]
fn stored_network_rejoins_at_boot() {
    let n = Node::booted(ZigbeeStack::new().with_stored_network());
    assert!(n.sink.contains(&AppEvent::Joined));
}

#[test]
fn pairing_joins_and_clears_status_led() {
    let mut n = Node::booted(ZigbeeStack::new());
    n.click(PAIR, 200);
    assert!(n.sink.contains(&AppEvent::Joined));
    assert_eq!(n.c.mode(), Mode::Idle);
    assert!(!n.hw.indicator(Indicator::Status));
}

#[test]
fn pairing_without_coordinator_stays_lit() {
    let mut n = Node::booted(ZigbeeStack::new());
    n.hw.zigbee_mut().set_network_available(false);
    n.click(PAIR, 200);
    assert_eq!(n.c.mode(), Mode::Idle);
    assert!(n.hw.indicator(Indicator::Status));

    n.hw.zigbee_mut().set_network_available(true);
    n.click(PAIR, 200);
    assert_eq!(n.c.mode(), Mode::Idle);
    assert!(!n.hw.indicator(Indicator::Status));
}

#[test]
fn measurement_lands_in_attribute_table() {
    let mut n = Node::booted(ZigbeeStack::new());
    assert_eq!(
        n.attribute(zcl::CLUSTER_TEMPERATURE),
        Some(&zcl::TEMPERATURE_UNKNOWN.to_le_bytes()[..])
    );

    n.advance(5_000);
    assert_eq!(n.attribute(zcl::CLUSTER_TEMPERATURE), Some(&2200i16.to_le_bytes()[..]));
    assert_eq!(n.attribute(zcl::CLUSTER_HUMIDITY), Some(&4000i16.to_le_bytes()[..]));
    assert_eq!(
        n.attribute(zcl::CLUSTER_CO2),
        Some(&(600.0f32 * 1e-6).to_le_bytes()[..])
    );
    assert_eq!(n.hw.colour(), ColorState::Green.rgb());
}

#[test]
fn high_co2_turns_led_red() {
    let mut n = Node::booted(ZigbeeStack::new());
    n.hw.sensor_mut().inject(Sample {
        co2_ppm: 2_000.0,
        temperature_c: 24.0,
        humidity_pct: 55.0,
    });
    n.advance(5_000);
    assert_eq!(n.hw.colour(), Rgb::new(255, 0, 0));
}

#[test]
fn out_of_range_reading_keeps_previous_value() {
    let mut n = Node::booted(ZigbeeStack::new());
    n.advance(5_000);
    n.hw.sensor_mut().inject(Sample {
        co2_ppm: 900.0,
        temperature_c: 140.0,
        humidity_pct: 50.0,
    });
    n.advance(60_000);
    assert_eq!(n.attribute(zcl::CLUSTER_TEMPERATURE), Some(&2200i16.to_le_bytes()[..]));
    assert_eq!(n.attribute(zcl::CLUSTER_HUMIDITY), Some(&5000i16.to_le_bytes()[..]));
}

#[test]
fn failed_fetch_leaves_table_untouched() {
    let mut n = Node::booted(ZigbeeStack::new());
    n.hw.sensor_mut().fail_next_fetch = Some(SensorError::Crc);
    n.advance(5_000);
    assert_eq!(
        n.attribute(zcl::CLUSTER_HUMIDITY),
        Some(&zcl::HUMIDITY_UNKNOWN.to_le_bytes()[..])
    );
    n.advance(60_000);
    assert_eq!(n.attribute(zcl::CLUSTER_HUMIDITY), Some(&4000i16.to_le_bytes()[..]));
}

#[test]
fn calibration_stops_and_restarts_sensor() {
    let mut n = Node::booted(ZigbeeStack::new());
    n.advance(5_000);
    n.click(CAL, 1_000);

    let outcome = n.c.last_calibration().unwrap();
    // Sim sensor read 600 ppm; reference is 420.
    assert_eq!(outcome.result, Ok(-180));
    assert!(n.hw.sensor_mut().is_running());
    assert!(!n.hw.indicator(Indicator::Status));

    n.advance(60_000);
    assert_eq!(
        n.attribute(zcl::CLUSTER_CO2),
        Some(&(420.0f32 * 1e-6).to_le_bytes()[..])
    );
}

#[test]
fn display_toggle_blanks_and_restores() {
    let mut n = Node::booted(ZigbeeStack::new());
    n.advance(5_000);
    n.click(CAL, 100);
    assert_eq!(n.hw.colour(), Rgb::OFF);
    n.click(CAL, 100);
    assert_eq!(n.hw.colour(), ColorState::Green.rgb());
}

#[test]
fn local_identify_round_trip() {
    let mut n = Node::booted(ZigbeeStack::new().with_stored_network());
    n.click(PAIR, 100);
    assert_eq!(n.c.mode(), Mode::Identifying);
    assert_eq!(
        n.hw.zigbee().attribute(zcl::CLUSTER_IDENTIFY, zcl::ATTR_IDENTIFY_TIME),
        Some(&zcl::IDENTIFY_TIME_SECS.to_le_bytes()[..])
    );

    let lit = n.hw.indicator(Indicator::Identify);
    n.advance(100);
    assert_ne!(n.hw.indicator(Indicator::Identify), lit);

    n.click(PAIR, 100);
    assert_eq!(n.c.mode(), Mode::Idle);
    assert!(!n.hw.indicator(Indicator::Identify));
}

#[test]
fn remote_identify_and_leave() {
    let mut n = Node::booted(ZigbeeStack::new().with_stored_network());
    n.hw.zigbee_mut().remote_identify(true);
    n.pump();
    assert_eq!(n.c.mode(), Mode::Identifying);

    n.hw.zigbee_mut().remote_leave();
    n.pump();
    assert_eq!(n.c.mode(), Mode::Idle);
    assert!(n.sink.contains(&AppEvent::Left));
    assert!(!n.hw.zigbee().is_joined());
}

#[test]
fn factory_reset_forgets_network() {
    let mut n = Node::booted(ZigbeeStack::new().with_stored_network());
    n.click(PAIR, 5_000);
    assert_eq!(n.hw.zigbee().factory_resets(), 1);
    assert!(n.sink.contains(&AppEvent::FactoryReset));
    // The release did not start pairing or identify.
    assert_eq!(n.c.mode(), Mode::Idle);
    assert!(!n.hw.indicator(Indicator::Status));
}

#[test]
fn persisted_config_shapes_the_cycle() {
    let nvs = NvsAdapter::new().unwrap();
    nvs.save(&DeviceConfig {
        measurement_period_secs: 30,
        initial_delay_secs: 2,
        ..DeviceConfig::default()
    })
    .unwrap();

    let mut n = Node::with_config(nvs.load().unwrap(), ZigbeeStack::new());
    n.c.boot(&mut n.hw, &mut n.sink);
    n.pump();
    n.advance(2_000);
    assert_eq!(n.c.cycle().fired(), 1);
    n.advance(30_000);
    assert_eq!(n.c.cycle().fired(), 2);
}

#[test]
fn log_sink_accepts_every_event() {
    use airmon::app::ports::EventSink;

    let mut n = Node::booted(ZigbeeStack::new());
    n.advance(5_000);
    n.click(CAL, 1_000);
    let mut sink = LogEventSink::new();
    for event in &n.sink.events {
        sink.emit(event);
    }
    assert!(n.sink.events.len() >= 4);
}
