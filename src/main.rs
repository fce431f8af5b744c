//! Airmon firmware: main entry point.
//!
//! Hexagonal architecture with a single-context event loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter       LogEventSink   NvsAdapter  MonotonicClock│
//! │  (Sensor+LEDs+Zigbee)  (EventSink)    (Config)    (time source) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  cycle · buttons · feedback · identify · calibration   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  EVENTS queue (button scan, Zigbee task) · AlarmQueue timers   │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Result, anyhow};
use embassy_time::Duration;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use airmon::adapters::hardware::HardwareAdapter;
use airmon::adapters::log_sink::LogEventSink;
use airmon::adapters::nvs::NvsAdapter;
use airmon::adapters::time::MonotonicClock;
use airmon::adapters::zigbee::ZigbeeStack;
use airmon::app::controller::Controller;
use airmon::app::ports::ConfigPort;
use airmon::config::DeviceConfig;
use airmon::drivers::button;
use airmon::events::EVENTS;
use airmon::pins;
use airmon::scheduler::AlarmQueue;
use airmon::sensors::scd4x::Scd4x;

/// Upper bound on one idle sleep, so queued events are picked up promptly.
const MAX_IDLE: Duration = Duration::from_millis(10);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Airmon v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            DeviceConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    // The typed HAL pins below must match pins.rs.
    const _: () = assert!(pins::I2C_SDA_GPIO == 12 && pins::I2C_SCL_GPIO == 22);
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio12,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;
    if let Err(e) = button::start_scanning(config.button_debounce_ms) {
        error!("button scan init failed ({}), continuing without buttons", e);
    }

    // ── 4. Controller + boot ──────────────────────────────────
    let clock = MonotonicClock::new();
    let mut hw = HardwareAdapter::new(Scd4x::new(i2c, FreeRtos), ZigbeeStack::new());
    let mut sink = LogEventSink::new();
    let mut controller = Controller::new(config, AlarmQueue::new(clock.now()));

    let report = controller.boot(&mut hw, &mut sink);
    if !report.is_clean() {
        warn!("boot finished with {} failed step(s)", report.failed.len());
    }

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        EVENTS.drain(|event| controller.handle_event(event, clock.now(), &mut hw, &mut sink));
        controller.run_due(clock.now(), &mut hw, &mut sink);

        let idle = controller
            .next_deadline()
            .map_or(MAX_IDLE, |at| at.saturating_duration_since(clock.now()).min(MAX_IDLE));
        std::thread::sleep(std::time::Duration::from_micros(idle.as_micros()));
    }
}
