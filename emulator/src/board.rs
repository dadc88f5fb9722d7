//! Simulated PMS board with a virtual millisecond clock.

use core::time::Duration;

use pms_core::can::{CanFrame, CanTransmit, TransmitError, TxOptions};
use pms_core::io::{AnalogChannel, AnalogInput, Delay, DigitalIo, OutputId, SwitchId};
use pms_core::timing::TickSource;

/// Raw ADC bytes returned for aux cells 1-4 and the converter sensor.
pub const DEFAULT_ANALOG: [u8; 5] = [0x7A, 0x7B, 0x79, 0x7C, 0x2D];

/// Board stand-in. Time only moves inside [`Delay::sleep`], and every whole
/// millisecond that passes fires the shared tick source the way the timer
/// interrupt would.
pub struct SimBoard<'a> {
    tick: &'a TickSource,
    now: Duration,
    ticked_ms: u128,
    switches: [bool; 3],
    outputs: [bool; 5],
    status_led: bool,
    analog: [u8; 5],
    selected: AnalogChannel,
    outbox: Vec<CanFrame>,
}

impl<'a> SimBoard<'a> {
    pub fn new(tick: &'a TickSource) -> Self {
        Self {
            tick,
            now: Duration::ZERO,
            ticked_ms: 0,
            switches: [false; 3],
            outputs: [false; 5],
            status_led: false,
            analog: DEFAULT_ANALOG,
            selected: AnalogChannel::Aux1,
            outbox: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn set_switch(&mut self, switch: SwitchId, level: bool) {
        self.switches[switch.as_index()] = level;
    }

    pub fn switch(&self, switch: SwitchId) -> bool {
        self.switches[switch.as_index()]
    }

    pub fn output(&self, output: OutputId) -> bool {
        self.outputs[output.as_index()]
    }

    pub fn status_led(&self) -> bool {
        self.status_led
    }

    /// Frames transmitted since the last call.
    pub fn drain_outbox(&mut self) -> Vec<CanFrame> {
        std::mem::take(&mut self.outbox)
    }

    fn advance(&mut self, duration: Duration) {
        self.now += duration;
        let due = self.now.as_millis();
        while self.ticked_ms < due {
            if let Some(level) = self.tick.on_tick().heartbeat {
                self.status_led = level;
            }
            self.ticked_ms += 1;
        }
    }
}

impl DigitalIo for SimBoard<'_> {
    fn read_level(&mut self, switch: SwitchId) -> bool {
        self.switches[switch.as_index()]
    }

    fn write_level(&mut self, output: OutputId, level: bool) {
        self.outputs[output.as_index()] = level;
    }
}

impl AnalogInput for SimBoard<'_> {
    fn select_channel(&mut self, channel: AnalogChannel) {
        self.selected = channel;
    }

    fn sample(&mut self) -> u8 {
        self.analog[self.selected.as_index()]
    }
}

impl Delay for SimBoard<'_> {
    fn sleep(&mut self, duration: Duration) {
        self.advance(duration);
    }
}

impl CanTransmit for SimBoard<'_> {
    fn transmit(&mut self, frame: &CanFrame, _options: TxOptions) -> Result<(), TransmitError> {
        self.outbox.push(*frame);
        Ok(())
    }

    fn transmit_ready(&self) -> bool {
        true
    }
}
