//! Board-facing collaborator traits: digital pins, analog sampling, delays.

use core::time::Duration;

use crate::can::CanTransmit;

/// Physical switches polled by the state machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SwitchId {
    ArrayEnable,
    MotorEnable,
    Brake,
}

impl SwitchId {
    /// Fixed polling order.
    pub const ALL: [SwitchId; 3] = [SwitchId::ArrayEnable, SwitchId::MotorEnable, SwitchId::Brake];

    pub const fn as_index(self) -> usize {
        match self {
            SwitchId::ArrayEnable => 0,
            SwitchId::MotorEnable => 1,
            SwitchId::Brake => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SwitchId::ArrayEnable => "array",
            SwitchId::MotorEnable => "motor",
            SwitchId::Brake => "brake",
        }
    }
}

/// Binary outputs driven by the PMS.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputId {
    /// MPPT/array contactor coil.
    Array,
    /// Motor controller contactor coil.
    Motor,
    /// Precharge relay in series with the precharge resistor.
    Precharge,
    Horn,
    /// Powers the sensed source while the aux channels are sampled.
    MeasureEnable,
}

impl OutputId {
    pub const ALL: [OutputId; 5] = [
        OutputId::Array,
        OutputId::Motor,
        OutputId::Precharge,
        OutputId::Horn,
        OutputId::MeasureEnable,
    ];

    pub const fn as_index(self) -> usize {
        match self {
            OutputId::Array => 0,
            OutputId::Motor => 1,
            OutputId::Precharge => 2,
            OutputId::Horn => 3,
            OutputId::MeasureEnable => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            OutputId::Array => "array",
            OutputId::Motor => "motor",
            OutputId::Precharge => "precharge",
            OutputId::Horn => "horn",
            OutputId::MeasureEnable => "measure",
        }
    }
}

/// Analog inputs folded into the telemetry page.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AnalogChannel {
    Aux1,
    Aux2,
    Aux3,
    Aux4,
    ConverterTemperature,
}

impl AnalogChannel {
    pub const AUX: [AnalogChannel; 4] = [
        AnalogChannel::Aux1,
        AnalogChannel::Aux2,
        AnalogChannel::Aux3,
        AnalogChannel::Aux4,
    ];

    pub const fn as_index(self) -> usize {
        match self {
            AnalogChannel::Aux1 => 0,
            AnalogChannel::Aux2 => 1,
            AnalogChannel::Aux3 => 2,
            AnalogChannel::Aux4 => 3,
            AnalogChannel::ConverterTemperature => 4,
        }
    }
}

/// Pin-level access to switches and outputs.
pub trait DigitalIo {
    /// Returns `true` when the switch input is asserted.
    fn read_level(&mut self, switch: SwitchId) -> bool;

    /// Drives an output high (`true`) or low.
    fn write_level(&mut self, output: OutputId, level: bool);
}

/// Multiplexed ADC access.
pub trait AnalogInput {
    fn select_channel(&mut self, channel: AnalogChannel);

    /// Samples the selected channel, scaled to one byte.
    fn sample(&mut self) -> u8;
}

/// Busy-wait delay. Only fixed-duration sequences call this.
pub trait Delay {
    fn sleep(&mut self, duration: Duration);
}

/// Everything the polling loop needs from the board.
pub trait PmsHardware: DigitalIo + AnalogInput + Delay + CanTransmit {}

impl<T> PmsHardware for T where T: DigitalIo + AnalogInput + Delay + CanTransmit {}
