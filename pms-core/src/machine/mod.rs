//! The PMS polling state machine.
//!
//! [`Pms`] owns every piece of main-loop state (current state, the pending
//! received frame, actuator mirror, safety latch, debounced switch levels) and
//! borrows the two interrupt-shared structures, [`CaptureLayer`] and
//! [`TickSource`], which it only touches through their atomic APIs.
//!
//! Each call to [`Pms::poll`] runs exactly one state handler to completion and
//! stores the state it returns. [`SystemState::BpsTrip`] has no outgoing edge:
//! its handler does nothing and returns itself, and there is no method that
//! clears the trip latch.

use core::fmt;

use crate::actuators::{ActuatorController, ActuatorState, EnableOutcome};
use crate::can::{
    BRAKE_LIGHT_ID, CanFrame, CanTransmit, DISCONNECT_ARRAY_ID, InboundMessage, TxOptions,
};
use crate::capture::CaptureLayer;
use crate::config::PmsConfig;
use crate::debounce::{Debouncer, SwitchBank, SwitchReading};
use crate::events::{DisconnectReason, EventSink, PmsEvent};
use crate::io::{DigitalIo, PmsHardware, SwitchId};
use crate::safety::SafetyLatch;
use crate::telemetry::{TelemetryBuilder, TemperatureVerdict, check_temperatures};
use crate::timing::TickSource;

/// Top-level control state. Exactly one is active at a time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SystemState {
    Idle,
    CheckSwitches,
    DataReceived,
    DataSending,
    BpsTrip,
}

impl SystemState {
    /// Returns `true` for the absorbing fault state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, SystemState::BpsTrip)
    }

    pub const fn label(self) -> &'static str {
        match self {
            SystemState::Idle => "idle",
            SystemState::CheckSwitches => "check-switches",
            SystemState::DataReceived => "data-received",
            SystemState::DataSending => "data-sending",
            SystemState::BpsTrip => "bps-trip",
        }
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Point-in-time view of the controller for status reporting.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    pub state: SystemState,
    pub actuators: ActuatorState,
    pub battery_temperature_safe: bool,
    pub bps_tripped: bool,
    pub switches: SwitchBank,
    pub send_requested: bool,
    pub heartbeat: bool,
}

/// Owned control-loop context.
pub struct Pms<'a, S: EventSink> {
    config: PmsConfig,
    capture: &'a CaptureLayer,
    tick: &'a TickSource,
    state: SystemState,
    pending: Option<CanFrame>,
    actuators: ActuatorController,
    latch: SafetyLatch,
    switches: SwitchBank,
    debouncer: Debouncer,
    telemetry: TelemetryBuilder,
    events: S,
}

impl<'a, S: EventSink> Pms<'a, S> {
    /// Creates a controller in the boot state: idle, contactors open, latch
    /// clear.
    pub fn with_sink(
        config: PmsConfig,
        capture: &'a CaptureLayer,
        tick: &'a TickSource,
        events: S,
    ) -> Self {
        Self {
            config,
            capture,
            tick,
            state: SystemState::Idle,
            pending: None,
            actuators: ActuatorController::new(),
            latch: SafetyLatch::new(),
            switches: SwitchBank::new(),
            debouncer: Debouncer::new(config.debounce_settle),
            telemetry: TelemetryBuilder::new(config.measure_settle, config.sample_settle),
            events,
        }
    }

    /// Drives every output to its boot level. Call once before polling.
    pub fn start<H: DigitalIo>(&mut self, hw: &mut H) {
        self.actuators.release_all(hw);
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn config(&self) -> &PmsConfig {
        &self.config
    }

    pub fn actuators(&self) -> ActuatorState {
        self.actuators.state()
    }

    pub fn latch(&self) -> &SafetyLatch {
        &self.latch
    }

    pub fn switches(&self) -> &SwitchBank {
        &self.switches
    }

    /// Frame copied out of a capture buffer and not yet dispatched.
    pub fn pending(&self) -> Option<&CanFrame> {
        self.pending.as_ref()
    }

    pub fn events(&self) -> &S {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut S {
        &mut self.events
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            actuators: self.actuators.state(),
            battery_temperature_safe: self.latch.battery_temperature_safe(),
            bps_tripped: self.latch.bps_tripped(),
            switches: self.switches,
            send_requested: self.tick.send_requested(),
            heartbeat: self.telemetry.last_heartbeat(),
        }
    }

    /// Runs one polling iteration and returns the new state.
    pub fn poll<H: PmsHardware>(&mut self, hw: &mut H) -> SystemState {
        let next = match self.state {
            SystemState::Idle => self.idle(hw),
            SystemState::CheckSwitches => self.check_switches(hw),
            SystemState::DataReceived => self.data_received(hw),
            SystemState::DataSending => self.data_sending(hw),
            SystemState::BpsTrip => SystemState::BpsTrip,
        };
        self.state = next;
        next
    }

    /// Drains receive buffers first, then a due telemetry send, then falls
    /// through to switch polling.
    fn idle<H: PmsHardware>(&mut self, hw: &mut H) -> SystemState {
        if let Some((_, frame)) = self.capture.take_next() {
            self.pending = Some(frame);
            return SystemState::DataReceived;
        }

        if hw.transmit_ready() && self.tick.send_requested() {
            return SystemState::DataSending;
        }

        SystemState::CheckSwitches
    }

    fn check_switches<H: PmsHardware>(&mut self, hw: &mut H) -> SystemState {
        for switch in SwitchId::ALL {
            let cached = self.switches.level(switch);
            match self.debouncer.confirm(hw, switch, cached) {
                SwitchReading::Unchanged => {}
                SwitchReading::Bounced => self.events.record(PmsEvent::SwitchBounce(switch)),
                SwitchReading::Confirmed(level) => {
                    self.switches.set(switch, level);
                    self.apply_switch(hw, switch, level);
                }
            }
        }

        SystemState::Idle
    }

    fn apply_switch<H: PmsHardware>(&mut self, hw: &mut H, switch: SwitchId, level: bool) {
        match (switch, level) {
            (SwitchId::ArrayEnable, true) => self.enable_array(hw),
            (SwitchId::ArrayEnable, false) => self.disable_array(hw, DisconnectReason::Switch),
            (SwitchId::MotorEnable, true) => {
                if self.actuators.connect_motor(hw) == EnableOutcome::Energized {
                    self.events.record(PmsEvent::MotorConnected);
                }
            }
            (SwitchId::MotorEnable, false) => {
                if self.actuators.disconnect_motor(hw) {
                    self.events.record(PmsEvent::MotorDisconnected);
                }
            }
            (SwitchId::Brake, pressed) => {
                self.transmit(hw, &CanFrame::empty(BRAKE_LIGHT_ID));
                self.actuators.set_brake(pressed);
                self.events.record(PmsEvent::BrakeChanged(pressed));
            }
        }
    }

    fn data_received<H: PmsHardware>(&mut self, hw: &mut H) -> SystemState {
        let Some(frame) = self.pending.take() else {
            return SystemState::Idle;
        };

        match frame.message() {
            InboundMessage::DisconnectArray => return self.trip(hw),
            InboundMessage::EnableHorn => {
                self.actuators.sound_horn(hw);
                self.events.record(PmsEvent::HornSounded);
            }
            InboundMessage::BatteryTemperature(_) => self.evaluate_temperatures(hw, &frame),
            InboundMessage::Unrecognized(id) => self.events.record(PmsEvent::UnknownFrame(id)),
        }

        SystemState::Idle
    }

    /// Opens the array, acknowledges the command, and latches the trip.
    fn trip<H: PmsHardware>(&mut self, hw: &mut H) -> SystemState {
        self.disable_array(hw, DisconnectReason::BpsTrip);
        self.transmit(hw, &CanFrame::empty(DISCONNECT_ARRAY_ID));
        self.latch.trip();
        self.events.record(PmsEvent::BpsTripLatched);
        SystemState::BpsTrip
    }

    fn evaluate_temperatures<H: PmsHardware>(&mut self, hw: &mut H, frame: &CanFrame) {
        match check_temperatures(frame.payload(), self.config.temperature_warning) {
            TemperatureVerdict::Unsafe { index, value } => {
                self.latch.mark_temperature_unsafe();
                self.events.record(PmsEvent::TemperatureWarning {
                    id: frame.id(),
                    index,
                    value,
                });
                self.disable_array(hw, DisconnectReason::Temperature);
            }
            TemperatureVerdict::Safe => {
                if self.actuators.state().array_connected
                    || !self.switches.level(SwitchId::ArrayEnable)
                {
                    return;
                }

                if !self.latch.battery_temperature_safe() {
                    self.latch.mark_temperature_safe();
                    self.events
                        .record(PmsEvent::TemperatureCleared { id: frame.id() });
                }
                self.enable_array(hw);
            }
        }
    }

    fn data_sending<H: PmsHardware>(&mut self, hw: &mut H) -> SystemState {
        let page = self.telemetry.build(hw, self.actuators.state());
        if self.transmit(hw, &page.to_frame()) {
            self.events.record(PmsEvent::TelemetrySent {
                heartbeat: page.heartbeat,
            });
        }
        self.tick.clear_send_request();
        SystemState::Idle
    }

    fn enable_array<H: DigitalIo>(&mut self, hw: &mut H) {
        match self
            .actuators
            .enable_array(hw, &self.latch, self.config.array_policy)
        {
            EnableOutcome::Energized => self.events.record(PmsEvent::ArrayConnected),
            EnableOutcome::AlreadyOn => {}
            EnableOutcome::Refused => self.events.record(PmsEvent::ArrayEnableRefused),
        }
    }

    fn disable_array<H: DigitalIo>(&mut self, hw: &mut H, reason: DisconnectReason) {
        if self.actuators.disable_array(hw) {
            self.events.record(PmsEvent::ArrayDisconnected(reason));
        }
    }

    /// Best-effort transmit; failures are reported, never retried.
    fn transmit<H: CanTransmit>(&mut self, hw: &mut H, frame: &CanFrame) -> bool {
        match hw.transmit(frame, TxOptions::DEFAULT) {
            Ok(()) => true,
            Err(error) => {
                self.events.record(PmsEvent::TransmitFailed {
                    id: frame.id(),
                    error,
                });
                false
            }
        }
    }
}
