//! Outgoing PMS data page and the battery-temperature threshold check.
//!
//! Page layout (`PMS_DATA`, 8 bytes):
//!
//! | byte | content |
//! |---|---|
//! | 0-3 | aux cell readings 1-4 |
//! | 4 | DC-DC converter temperature |
//! | 5 | array contactor closed (0/1) |
//! | 6 | motor contactor closed (0/1) |
//! | 7 | heartbeat bit, flips every page |

use core::time::Duration;

use crate::actuators::ActuatorState;
use crate::can::{CanFrame, MAX_PAYLOAD, PMS_DATA_ID};
use crate::io::{AnalogChannel, AnalogInput, Delay, DigitalIo, OutputId};

/// One telemetry page, rebuilt from scratch for every send.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TelemetryPage {
    pub cells: [u8; 4],
    pub converter_temperature: u8,
    pub array_connected: bool,
    pub motor_connected: bool,
    pub heartbeat: bool,
}

impl TelemetryPage {
    #[must_use]
    pub fn to_bytes(&self) -> [u8; MAX_PAYLOAD] {
        let [c0, c1, c2, c3] = self.cells;
        [
            c0,
            c1,
            c2,
            c3,
            self.converter_temperature,
            u8::from(self.array_connected),
            u8::from(self.motor_connected),
            u8::from(self.heartbeat),
        ]
    }

    #[must_use]
    pub fn to_frame(&self) -> CanFrame {
        CanFrame::with_data(PMS_DATA_ID, self.to_bytes())
    }
}

/// Samples the analog channels and stamps the alternating heartbeat bit.
#[derive(Copy, Clone, Debug)]
pub struct TelemetryBuilder {
    measure_settle: Duration,
    sample_settle: Duration,
    heartbeat: bool,
}

impl TelemetryBuilder {
    pub const fn new(measure_settle: Duration, sample_settle: Duration) -> Self {
        Self {
            measure_settle,
            sample_settle,
            heartbeat: false,
        }
    }

    /// Heartbeat bit carried by the most recent page.
    pub const fn last_heartbeat(&self) -> bool {
        self.heartbeat
    }

    /// Powers the measured source, samples every channel, and powers it back
    /// down so it does not draw current between pages.
    pub fn build<H>(&mut self, hw: &mut H, actuators: ActuatorState) -> TelemetryPage
    where
        H: DigitalIo + AnalogInput + Delay,
    {
        hw.write_level(OutputId::MeasureEnable, true);
        hw.sleep(self.measure_settle);

        let mut cells = [0; 4];
        for (cell, channel) in cells.iter_mut().zip(AnalogChannel::AUX) {
            *cell = self.sample(hw, channel);
        }
        let converter_temperature = self.sample(hw, AnalogChannel::ConverterTemperature);

        hw.write_level(OutputId::MeasureEnable, false);

        self.heartbeat = !self.heartbeat;
        TelemetryPage {
            cells,
            converter_temperature,
            array_connected: actuators.array_connected,
            motor_connected: actuators.motor_connected,
            heartbeat: self.heartbeat,
        }
    }

    fn sample<H>(&self, hw: &mut H, channel: AnalogChannel) -> u8
    where
        H: AnalogInput + Delay,
    {
        hw.select_channel(channel);
        hw.sleep(self.sample_settle);
        hw.sample()
    }
}

/// Verdict on one battery-temperature frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TemperatureVerdict {
    Safe,
    /// First reading at or above the warning threshold.
    Unsafe { index: usize, value: u8 },
}

impl TemperatureVerdict {
    pub const fn is_safe(&self) -> bool {
        matches!(self, TemperatureVerdict::Safe)
    }
}

/// Checks every reading against `warning`, stopping at the first violation.
/// An empty payload is trivially safe.
pub fn check_temperatures(readings: &[u8], warning: u8) -> TemperatureVerdict {
    readings
        .iter()
        .copied()
        .enumerate()
        .find(|&(_, value)| value >= warning)
        .map_or(TemperatureVerdict::Safe, |(index, value)| {
            TemperatureVerdict::Unsafe { index, value }
        })
}
