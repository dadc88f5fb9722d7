//! STM32G0B1 pin map and the `pms-core` hardware traits over it.
//!
//! | signal | pin |
//! |---|---|
//! | array / motor / brake switches | PB4 / PB5 / PB6 (active high, pulled down) |
//! | array contactor | PB1 |
//! | motor contactor | PA7 |
//! | precharge relay | PA6 |
//! | horn | PB3 |
//! | measurement enable | PA4 |
//! | status LED | PA5 |
//! | aux cells 1-4 | PA0-PA3 (ADC1 IN0-IN3) |
//! | converter temperature | PB0 (ADC1 IN8) |
//! | FDCAN1 RX / TX | PA11 / PA12 |

use core::time::Duration;

use embassy_stm32::adc::{Adc, AnyAdcChannel, Resolution, SampleTime};
use embassy_stm32::gpio::{Input, Output};
use embassy_stm32::peripherals::ADC1;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use pms_core::can::{CanFrame, CanTransmit, TransmitError, TxOptions};
use pms_core::io::{AnalogChannel, AnalogInput, Delay, DigitalIo, OutputId, SwitchId};

use crate::runtime::TX_QUEUE_DEPTH;

/// Nominal CAN bit rate.
pub const CAN_BITRATE: u32 = 500_000;

pub type FrameSender = Sender<'static, CriticalSectionRawMutex, CanFrame, TX_QUEUE_DEPTH>;

/// Switch inputs in [`SwitchId::ALL`] order.
pub struct Switches {
    pub array_enable: Input<'static>,
    pub motor_enable: Input<'static>,
    pub brake: Input<'static>,
}

/// Driven outputs in [`OutputId::ALL`] order.
pub struct Outputs {
    pub array: Output<'static>,
    pub motor: Output<'static>,
    pub precharge: Output<'static>,
    pub horn: Output<'static>,
    pub measure_enable: Output<'static>,
}

pub struct Board {
    switches: Switches,
    outputs: Outputs,
    adc: Adc<'static, ADC1>,
    channels: [AnyAdcChannel<ADC1>; 5],
    selected: AnalogChannel,
    frames: FrameSender,
}

impl Board {
    /// `channels` are in [`AnalogChannel::as_index`] order.
    pub fn new(
        switches: Switches,
        outputs: Outputs,
        mut adc: Adc<'static, ADC1>,
        channels: [AnyAdcChannel<ADC1>; 5],
        frames: FrameSender,
    ) -> Self {
        adc.set_resolution(Resolution::BITS8);
        adc.set_sample_time(SampleTime::CYCLES39_5);
        Self {
            switches,
            outputs,
            adc,
            channels,
            selected: AnalogChannel::Aux1,
            frames,
        }
    }

    fn input(&self, switch: SwitchId) -> &Input<'static> {
        match switch {
            SwitchId::ArrayEnable => &self.switches.array_enable,
            SwitchId::MotorEnable => &self.switches.motor_enable,
            SwitchId::Brake => &self.switches.brake,
        }
    }

    fn output_mut(&mut self, output: OutputId) -> &mut Output<'static> {
        match output {
            OutputId::Array => &mut self.outputs.array,
            OutputId::Motor => &mut self.outputs.motor,
            OutputId::Precharge => &mut self.outputs.precharge,
            OutputId::Horn => &mut self.outputs.horn,
            OutputId::MeasureEnable => &mut self.outputs.measure_enable,
        }
    }
}

impl DigitalIo for Board {
    fn read_level(&mut self, switch: SwitchId) -> bool {
        self.input(switch).is_high()
    }

    fn write_level(&mut self, output: OutputId, level: bool) {
        self.output_mut(output).set_level(level.into());
    }
}

impl AnalogInput for Board {
    fn select_channel(&mut self, channel: AnalogChannel) {
        self.selected = channel;
    }

    fn sample(&mut self) -> u8 {
        let channel = &mut self.channels[self.selected.as_index()];
        let raw = self.adc.blocking_read(channel);
        u8::try_from(raw).unwrap_or(u8::MAX)
    }
}

impl Delay for Board {
    /// Busy-waits. Interrupt-executor tasks keep running underneath.
    fn sleep(&mut self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        embassy_time::block_for(embassy_time::Duration::from_micros(micros));
    }
}

impl CanTransmit for Board {
    /// Queues the frame for the transmit task. FDCAN has no per-frame
    /// priority field, so `options` only documents intent here.
    fn transmit(&mut self, frame: &CanFrame, _options: TxOptions) -> Result<(), TransmitError> {
        self.frames
            .try_send(*frame)
            .map_err(|_| TransmitError::BufferFull)
    }

    fn transmit_ready(&self) -> bool {
        !self.frames.is_full()
    }
}
