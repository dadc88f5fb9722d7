//! Contactor, horn, and brake state owned by the control loop.

use crate::io::{Delay, DigitalIo, OutputId};
use crate::safety::{ArrayEnablePolicy, SafetyLatch};
use crate::sequences::{HORN_TEMPLATE, PRECHARGE_TEMPLATE, run_sequence};

/// Cached mirror of the physical output levels.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ActuatorState {
    pub array_connected: bool,
    pub motor_connected: bool,
    pub brake_pressed: bool,
}

/// Outcome of an enable request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EnableOutcome {
    /// The output was energized by this call.
    Energized,
    /// The output was already energized; nothing was written.
    AlreadyOn,
    /// The safety latch forbids energizing.
    Refused,
}

/// Sole writer of the array, motor, precharge, and horn outputs.
#[derive(Copy, Clone, Debug, Default)]
pub struct ActuatorController {
    state: ActuatorState,
}

impl ActuatorController {
    /// Boot state: every contactor open.
    pub const fn new() -> Self {
        Self {
            state: ActuatorState {
                array_connected: false,
                motor_connected: false,
                brake_pressed: false,
            },
        }
    }

    /// Drives every output to its boot level.
    pub fn release_all<H: DigitalIo>(&mut self, hw: &mut H) {
        for output in OutputId::ALL {
            hw.write_level(output, false);
        }
        self.state.array_connected = false;
        self.state.motor_connected = false;
    }

    pub const fn state(&self) -> ActuatorState {
        self.state
    }

    /// Energizes the array contactor if the latch permits it.
    pub fn enable_array<H: DigitalIo>(
        &mut self,
        hw: &mut H,
        latch: &SafetyLatch,
        policy: ArrayEnablePolicy,
    ) -> EnableOutcome {
        if !latch.permits_array(policy) {
            return EnableOutcome::Refused;
        }
        if self.state.array_connected {
            return EnableOutcome::AlreadyOn;
        }

        hw.write_level(OutputId::Array, true);
        self.state.array_connected = true;
        EnableOutcome::Energized
    }

    /// Opens the array contactor. Always writes the pin; returns whether the
    /// contactor was closed before.
    pub fn disable_array<H: DigitalIo>(&mut self, hw: &mut H) -> bool {
        hw.write_level(OutputId::Array, false);
        core::mem::replace(&mut self.state.array_connected, false)
    }

    /// Closes the motor contactor through the precharge sequence. Blocks for
    /// the whole sequence.
    pub fn connect_motor<H: DigitalIo + Delay>(&mut self, hw: &mut H) -> EnableOutcome {
        if self.state.motor_connected {
            return EnableOutcome::AlreadyOn;
        }

        run_sequence(hw, &PRECHARGE_TEMPLATE);
        self.state.motor_connected = true;
        EnableOutcome::Energized
    }

    /// Opens the motor contactor and makes sure precharge is off.
    pub fn disconnect_motor<H: DigitalIo>(&mut self, hw: &mut H) -> bool {
        hw.write_level(OutputId::Motor, false);
        hw.write_level(OutputId::Precharge, false);
        core::mem::replace(&mut self.state.motor_connected, false)
    }

    /// Blocking fixed-length horn pulse.
    pub fn sound_horn<H: DigitalIo + Delay>(&mut self, hw: &mut H) {
        run_sequence(hw, &HORN_TEMPLATE);
    }

    pub fn set_brake(&mut self, pressed: bool) {
        self.state.brake_pressed = pressed;
    }
}
