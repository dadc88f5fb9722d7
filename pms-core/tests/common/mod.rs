#![allow(dead_code)]

use core::time::Duration;

use pms_core::can::{CanFrame, CanTransmit, RxBuffer, TransmitError, TxOptions};
use pms_core::capture::CaptureLayer;
use pms_core::config::PmsConfig;
use pms_core::events::{EventSink, PmsEvent};
use pms_core::io::{AnalogChannel, AnalogInput, Delay, DigitalIo, OutputId, SwitchId};
use pms_core::machine::{Pms, SystemState};
use pms_core::timing::TickSource;

/// Board double with a virtual clock that only advances inside `sleep`.
pub struct MockBoard {
    pub now: Duration,
    switch_script: [Vec<(Duration, bool)>; 3],
    outputs: [bool; 5],
    pub writes: Vec<(Duration, OutputId, bool)>,
    pub analog: [u8; 5],
    selected: Option<AnalogChannel>,
    pub sent: Vec<(CanFrame, TxOptions)>,
    pub tx_ready: bool,
    pub tx_error: Option<TransmitError>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            switch_script: [Vec::new(), Vec::new(), Vec::new()],
            outputs: [false; 5],
            writes: Vec::new(),
            analog: [0; 5],
            selected: None,
            sent: Vec::new(),
            tx_ready: true,
            tx_error: None,
        }
    }

    /// Holds the switch at `level` from the current instant on.
    pub fn set_switch(&mut self, switch: SwitchId, level: bool) {
        let now = self.now;
        self.switch_script[switch.as_index()].push((now, level));
    }

    /// Flips the switch to `level` for `width`, then back to its prior level.
    pub fn glitch_switch(&mut self, switch: SwitchId, level: bool, width: Duration) {
        let now = self.now;
        let previous = self.switch_level_at(switch, now);
        let script = &mut self.switch_script[switch.as_index()];
        script.push((now, level));
        script.push((now + width, previous));
    }

    pub fn switch_level_at(&self, switch: SwitchId, at: Duration) -> bool {
        self.switch_script[switch.as_index()]
            .iter()
            .rev()
            .find(|(from, _)| *from <= at)
            .is_some_and(|(_, level)| *level)
    }

    pub fn output(&self, output: OutputId) -> bool {
        self.outputs[output.as_index()]
    }

    pub fn writes_to(&self, output: OutputId) -> Vec<(Duration, bool)> {
        self.writes
            .iter()
            .filter(|(_, id, _)| *id == output)
            .map(|(at, _, level)| (*at, *level))
            .collect()
    }

    pub fn frames_with_id(&self, id: u32) -> Vec<CanFrame> {
        self.sent
            .iter()
            .map(|(frame, _)| *frame)
            .filter(|frame| frame.id() == id)
            .collect()
    }
}

impl DigitalIo for MockBoard {
    fn read_level(&mut self, switch: SwitchId) -> bool {
        self.switch_level_at(switch, self.now)
    }

    fn write_level(&mut self, output: OutputId, level: bool) {
        self.outputs[output.as_index()] = level;
        self.writes.push((self.now, output, level));
    }
}

impl AnalogInput for MockBoard {
    fn select_channel(&mut self, channel: AnalogChannel) {
        self.selected = Some(channel);
    }

    fn sample(&mut self) -> u8 {
        self.selected
            .map_or(0, |channel| self.analog[channel.as_index()])
    }
}

impl Delay for MockBoard {
    fn sleep(&mut self, duration: Duration) {
        self.now += duration;
    }
}

impl CanTransmit for MockBoard {
    fn transmit(&mut self, frame: &CanFrame, options: TxOptions) -> Result<(), TransmitError> {
        if let Some(error) = self.tx_error {
            return Err(error);
        }
        self.sent.push((*frame, options));
        Ok(())
    }

    fn transmit_ready(&self) -> bool {
        self.tx_ready
    }
}

/// Event sink that keeps everything.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<PmsEvent>,
}

impl RecordingSink {
    pub fn contains(&self, event: &PmsEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn record(&mut self, event: PmsEvent) {
        self.events.push(event);
    }
}

pub fn controller<'a>(
    config: PmsConfig,
    capture: &'a CaptureLayer,
    tick: &'a TickSource,
) -> Pms<'a, RecordingSink> {
    Pms::with_sink(config, capture, tick, RecordingSink::default())
}

/// Hands a frame to the capture layer the way the receive interrupt would.
pub fn deliver(capture: &CaptureLayer, id: u32, payload: &[u8]) {
    let frame = CanFrame::new(id, payload).expect("test frame should build");
    capture.record(RxBuffer::for_identifier(id), Some(frame));
}

/// Polls until the controller is back in `Idle` (or latched), at most
/// `limit` iterations.
pub fn poll_until_idle(
    pms: &mut Pms<'_, RecordingSink>,
    board: &mut MockBoard,
    limit: usize,
) -> SystemState {
    let mut state = pms.state();
    for _ in 0..limit {
        state = pms.poll(board);
        if matches!(state, SystemState::Idle | SystemState::BpsTrip) {
            break;
        }
    }
    state
}

/// One Idle pass followed by its handler.
pub fn cycle(pms: &mut Pms<'_, RecordingSink>, board: &mut MockBoard) -> SystemState {
    pms.poll(board);
    poll_until_idle(pms, board, 1)
}

pub fn fire_ticks(tick: &TickSource, count: usize) {
    for _ in 0..count {
        tick.on_tick();
    }
}

/// Array switch on and one all-clear temperature page, leaving the array
/// connected under the default policy.
pub fn connect_array(
    pms: &mut Pms<'_, RecordingSink>,
    board: &mut MockBoard,
    capture: &CaptureLayer,
) {
    board.set_switch(SwitchId::ArrayEnable, true);
    cycle(pms, board);
    deliver(capture, 0x609, &[20; 8]);
    cycle(pms, board);
    assert!(board.output(OutputId::Array), "array should be connected");
}
