//! Operational controller: the hexagonal core.
//!
//! [`Controller`] owns the mode, the alarm queue and every behaviour
//! component. It reacts to three inputs, all delivered on one execution
//! context by the main loop:
//!
//! - queued [`Event`]s (buttons, network signals, identify notifications)
//! - expired timers ([`run_due`](Controller::run_due))
//! - the one-off [`boot`](Controller::boot) sequence
//!
//! ```text
//!  EventQueue ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!                 │         Controller          │
//!  AlarmQueue ◀──▶│ cycle · buttons · blinker   │ ──▶ DevicePorts
//!                 │ feedback · reset · mode     │
//!                 └────────────────────────────┘
//! ```

use embassy_time::Instant;
use heapless::Vec;
use log::{debug, error, info, warn};

use crate::config::DeviceConfig;
use crate::error::{Error, InitError};
use crate::events::{ButtonEvent, Event, NetworkSignal, SignalKind};
use crate::scheduler::AlarmQueue;
use crate::zcl;

use super::buttons::{Button, ButtonDispatcher};
use super::calibration::{self, CalibrationOutcome};
use super::commands::AppCommand;
use super::encoder::AttributeEncoder;
use super::events::AppEvent;
use super::factory_reset::FactoryResetWatcher;
use super::feedback::LedFeedback;
use super::identify::IdentifyBlinker;
use super::measurement::MeasurementCycle;
use super::mode::Mode;
use super::ports::{DevicePorts, EventSink, Indicator, SensorPort, TimerId, TimerPort};

// ───────────────────────────────────────────────────────────────
// Boot report
// ───────────────────────────────────────────────────────────────

/// Boot steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStep {
    Hardware,
    Sensor,
    DeviceRegistration,
    AttributeDefaults,
    IdentifyHandler,
    NetworkEnable,
}

#[derive(Debug, Default)]
pub struct BootReport {
    /// Steps that failed; later steps still ran.
    pub failed: Vec<(BootStep, Error), 6>,
    /// Boot-default attribute writes the store rejected.
    pub rejected_attributes: u8,
}

impl BootReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, step: BootStep, result: Result<(), Error>) {
        if let Err(e) = result {
            error!("boot step {:?} failed: {e}", step);
            let _ = self.failed.push((step, e));
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<T: TimerPort = AlarmQueue> {
    config: DeviceConfig,
    mode: Mode,
    timers: T,
    cycle: MeasurementCycle,
    feedback: LedFeedback,
    blinker: IdentifyBlinker,
    buttons: ButtonDispatcher,
    reset_watcher: FactoryResetWatcher,
    last_calibration: Option<CalibrationOutcome>,
}

impl<T: TimerPort> Controller<T> {
    /// Construct from a validated configuration. Nothing is scheduled
    /// until the stack reports startup.
    pub fn new(config: DeviceConfig, timers: T) -> Self {
        let cycle = MeasurementCycle::new(
            AttributeEncoder::new(config.valid_ranges()),
            config.measurement_period(),
            config.initial_delay(),
        );
        Self {
            mode: Mode::Idle,
            timers,
            cycle,
            feedback: LedFeedback::new(config.co2_thresholds()),
            blinker: IdentifyBlinker::new(config.identify_blink_interval()),
            buttons: ButtonDispatcher::new(config.long_press()),
            reset_watcher: FactoryResetWatcher::new(
                Button::Pair.mask(),
                config.factory_reset_hold(),
            ),
            last_calibration: None,
            config,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn cycle(&self) -> &MeasurementCycle {
        &self.cycle
    }

    pub fn feedback(&self) -> &LedFeedback {
        &self.feedback
    }

    pub fn blinker(&self) -> &IdentifyBlinker {
        &self.blinker
    }

    pub fn last_calibration(&self) -> Option<CalibrationOutcome> {
        self.last_calibration
    }

    /// Earliest pending timer, for the main loop's sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Best-effort bring-up. Every step runs, in order, whatever failed
    /// before it.
    pub fn boot(&mut self, hw: &mut impl DevicePorts, sink: &mut impl EventSink) -> BootReport {
        let mut report = BootReport::default();

        report.record(BootStep::Hardware, hw.init_leds().map_err(Error::from));
        report.record(BootStep::Sensor, SensorPort::init(hw).map_err(Error::from));
        report.record(
            BootStep::DeviceRegistration,
            hw.register_device().map_err(Error::from),
        );

        for attr in zcl::boot_defaults(&self.config.valid_ranges()) {
            let status = hw.set_attribute(attr.cluster, attr.attribute, &attr.value.to_bytes());
            if status != zcl::STATUS_SUCCESS {
                warn!(
                    "default 0x{:04x}/0x{:04x} rejected (status=0x{:02x})",
                    attr.cluster, attr.attribute, status
                );
                report.rejected_attributes += 1;
            }
        }
        if report.rejected_attributes > 0 {
            report.record(
                BootStep::AttributeDefaults,
                Err(InitError::Status("attribute defaults", i32::from(report.rejected_attributes)).into()),
            );
        }

        report.record(
            BootStep::IdentifyHandler,
            hw.register_identify_handler().map_err(Error::from),
        );
        hw.set_rx_on_when_idle(!self.config.sleepy_end_device);
        report.record(BootStep::NetworkEnable, hw.enable().map_err(Error::from));

        info!(
            "boot complete ({} failed step(s), sleepy={})",
            report.failed.len(),
            self.config.sleepy_end_device
        );
        sink.emit(&AppEvent::Started {
            failed_steps: report.failed.len() as u8,
        });
        report
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Process one queued event at time `now`.
    pub fn handle_event(
        &mut self,
        event: Event,
        now: Instant,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        self.timers.advance_to(now);
        match event {
            Event::Button(ev) => self.on_button(ev, hw, sink),
            Event::Network(signal) => self.on_network_signal(signal, hw, sink),
            Event::Identify(active) => self.on_identify(active, hw, sink),
        }
    }

    /// Run every timer that has expired by `now`, in expiry order.
    /// Returns the number of handlers run.
    pub fn run_due(
        &mut self,
        now: Instant,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) -> usize {
        self.timers.advance_to(now);
        let mut ran = 0;
        while let Some(id) = self.timers.pop_due() {
            self.on_timer(id, hw, sink);
            ran += 1;
        }
        ran
    }

    pub fn on_button(
        &mut self,
        event: ButtonEvent,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        let joined = hw.is_joined();
        let commands = self.buttons.dispatch(
            event,
            joined,
            &mut self.reset_watcher,
            &mut self.timers,
        );
        for cmd in commands {
            if let Err(e) = self.handle_command(cmd, hw, sink) {
                warn!("{:?} refused: {e}", cmd);
            }
        }
    }

    /// Stack lifecycle signal. The stack's default handling always runs
    /// afterwards and the buffer, if any, is released exactly once.
    pub fn on_network_signal(
        &mut self,
        mut signal: NetworkSignal,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        match signal.kind {
            SignalKind::SkipStartup => {
                info!("stack started; first measurement in {} s", self.config.initial_delay_secs);
                self.cycle.arm_initial(&mut self.timers);
            }
            SignalKind::DeviceFirstStart | SignalKind::DeviceReboot | SignalKind::Steering => {
                if !signal.is_ok() {
                    warn!("{:?} failed (status={})", signal.kind, signal.status);
                    // Status LED stays lit until a join; the mode is freed
                    // so calibration is not blocked by a dead attempt.
                    if signal.kind == SignalKind::Steering && self.mode == Mode::Pairing {
                        let _ = self.set_mode(Mode::Idle, sink);
                    }
                } else if hw.is_joined() {
                    self.on_joined(hw, sink);
                } else {
                    debug!("{:?} ok, not joined yet", signal.kind);
                }
            }
            SignalKind::Leave => self.on_left(hw, sink),
            SignalKind::Other(id) => debug!("unhandled signal {id} (status={})", signal.status),
        }

        hw.default_signal_handler(&signal);
        if let Some(buffer) = signal.buffer.take() {
            hw.release_buffer(buffer);
        }
    }

    /// Identify started or ended on the endpoint.
    pub fn on_identify(
        &mut self,
        active: bool,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        if active {
            match self.set_mode(Mode::Identifying, sink) {
                Ok(()) => self.blinker.start(hw, &mut self.timers),
                Err(e) => warn!("identify ignored: {e}"),
            }
        } else {
            self.blinker.stop(hw, &mut self.timers);
            if self.mode == Mode::Identifying {
                let _ = self.set_mode(Mode::Idle, sink);
            }
        }
    }

    /// Carry out a user command if the current mode allows it.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        debug!("command {:?} in {:?}", cmd, self.mode);
        match cmd {
            AppCommand::ToggleIdentify => {
                // Mode follows the identify notification, not this request.
                if self.mode == Mode::Identifying {
                    hw.cancel_identify()?;
                } else {
                    self.mode.enter(Mode::Identifying)?;
                    hw.start_identify()?;
                }
            }
            AppCommand::StartPairing => {
                self.set_mode(Mode::Pairing, sink)?;
                hw.set_indicator(Indicator::Status, true);
                if let Err(e) = hw.start_steering() {
                    hw.set_indicator(Indicator::Status, false);
                    let _ = self.set_mode(Mode::Idle, sink);
                    return Err(e.into());
                }
            }
            AppCommand::Calibrate => {
                self.set_mode(Mode::Calibrating, sink)?;
                let outcome = calibration::run(
                    hw,
                    &mut self.timers,
                    &mut self.cycle,
                    self.config.frc_reference_ppm,
                );
                self.last_calibration = Some(outcome);
                let _ = self.set_mode(Mode::Idle, sink);
                sink.emit(&AppEvent::Calibrated(outcome));
            }
            AppCommand::ToggleDisplay => {
                let enabled = self.feedback.toggle_display(hw);
                sink.emit(&AppEvent::DisplayToggled { enabled });
            }
        }
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────

    fn on_timer(&mut self, id: TimerId, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        match id {
            TimerId::MeasurementCycle => {
                let report = self.cycle.fire(hw, &mut self.feedback, &mut self.timers);
                sink.emit(&AppEvent::Measured(report));
            }
            TimerId::IdentifyBlink => self.blinker.on_timer(hw, &mut self.timers),
            TimerId::FactoryResetHold => {
                if self.reset_watcher.on_hold_elapsed(hw) {
                    self.blinker.stop(hw, &mut self.timers);
                    hw.set_indicator(Indicator::Status, false);
                    let _ = self.set_mode(Mode::Idle, sink);
                    sink.emit(&AppEvent::FactoryReset);
                }
            }
        }
    }

    fn on_joined(&mut self, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        info!("joined network");
        hw.set_indicator(Indicator::Status, false);
        if self.mode == Mode::Pairing {
            let _ = self.set_mode(Mode::Idle, sink);
        }
        sink.emit(&AppEvent::Joined);
    }

    fn on_left(&mut self, hw: &mut impl DevicePorts, sink: &mut impl EventSink) {
        info!("left network");
        if self.blinker.is_blinking() {
            self.blinker.stop(hw, &mut self.timers);
        }
        if self.mode == Mode::Identifying {
            let _ = self.set_mode(Mode::Idle, sink);
        }
        sink.emit(&AppEvent::Left);
    }

    fn set_mode(&mut self, to: Mode, sink: &mut impl EventSink) -> Result<(), Error> {
        let from = self.mode;
        self.mode = from.enter(to)?;
        if from != to {
            info!("mode {:?} → {:?}", from, to);
            sink.emit(&AppEvent::ModeChanged { from, to });
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
