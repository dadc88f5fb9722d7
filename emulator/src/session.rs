use core::fmt::Write as _;
use core::time::Duration;

use pms_core::can::{CanFrame, RxBuffer, catalog_entry};
use pms_core::capture::CaptureLayer;
use pms_core::config::PmsConfig;
use pms_core::events::{EventSink, PmsEvent};
use pms_core::io::{Delay, OutputId, SwitchId};
use pms_core::machine::{Pms, SystemState};
use pms_core::timing::TickSource;

use crate::board::SimBoard;
use crate::command::{Command, parse_command};

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "rx",
        "rx <id> [byte ...]             - deliver a CAN frame to the receive buffers",
    ),
    (
        "switch",
        "switch <array|motor|brake> <on|off> - move a dashboard switch",
    ),
    (
        "tick",
        "tick <ms>                      - let time pass without polling",
    ),
    (
        "run",
        "run [n]                        - run n polling iterations (default 1)",
    ),
    (
        "status",
        "status                         - display controller state",
    ),
    (
        "help",
        "help [topic]                   - show help for a command",
    ),
];

/// Interrupt-shared structures. They outlive the session the same way the
/// firmware's statics outlive its tasks.
pub struct Shared {
    pub capture: CaptureLayer,
    pub tick: TickSource,
}

impl Shared {
    pub fn new(config: &PmsConfig) -> Self {
        Self {
            capture: CaptureLayer::new(),
            tick: TickSource::new(config.telemetry_period),
        }
    }
}

/// Collects event lines until the session flushes them to the console.
#[derive(Default)]
pub struct ConsoleSink {
    lines: Vec<String>,
}

impl EventSink for ConsoleSink {
    fn record(&mut self, event: PmsEvent) {
        let level = if event.is_warning() { "WARN" } else { "INFO" };
        self.lines.push(format!("{level} {event}"));
    }
}

pub struct Session<'a> {
    capture: &'a CaptureLayer,
    board: SimBoard<'a>,
    pms: Pms<'a, ConsoleSink>,
}

/// Result of one console line.
pub enum Reply {
    Lines(Vec<String>),
    Exit,
}

impl<'a> Session<'a> {
    pub fn new(config: PmsConfig, shared: &'a Shared) -> Self {
        let mut board = SimBoard::new(&shared.tick);
        let mut pms = Pms::with_sink(config, &shared.capture, &shared.tick, ConsoleSink::default());
        pms.start(&mut board);
        Self {
            capture: &shared.capture,
            board,
            pms,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SystemState {
        self.pms.state()
    }

    pub fn handle_line(&mut self, line: &str) -> Reply {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(err) => return Reply::Lines(vec![format!("ERR syntax {err}")]),
        };

        let lines = match command {
            Command::Exit => return Reply::Exit,
            Command::Help(topic) => help(topic.as_deref()),
            Command::Rx { id, payload } => self.handle_rx(id, &payload),
            Command::Switch { switch, level } => {
                self.board.set_switch(switch, level);
                vec![format!(
                    "OK {} switch {}",
                    switch.label(),
                    if level { "on" } else { "off" }
                )]
            }
            Command::Tick(duration) => self.handle_tick(duration),
            Command::Run(iterations) => self.handle_run(iterations),
            Command::Status => self.status(),
        };
        Reply::Lines(lines)
    }

    fn handle_rx(&mut self, id: u32, payload: &[u8]) -> Vec<String> {
        let frame = match CanFrame::new(id, payload) {
            Ok(frame) => frame,
            Err(err) => return vec![format!("ERR frame {err}")],
        };
        let buffer = RxBuffer::for_identifier(id);
        self.capture.record(buffer, Some(frame));

        let name = catalog_entry(id).map_or("unlisted", |entry| entry.name);
        vec![format!(
            "OK captured {id:#05x} ({name}) len={} on rx{}",
            frame.len(),
            buffer.as_index()
        )]
    }

    fn handle_tick(&mut self, duration: Duration) -> Vec<String> {
        self.board.sleep(duration);
        vec![format!(
            "OK t=+{}ms send-requested={} led={}",
            self.board.now().as_millis(),
            u8::from(self.pms.snapshot().send_requested),
            u8::from(self.board.status_led()),
        )]
    }

    fn handle_run(&mut self, iterations: u32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut previous: SystemState = self.pms.state();

        for _ in 0..iterations {
            let next = self.pms.poll(&mut self.board);
            if next != previous {
                lines.push(format!(
                    "[+{:>6} ms] {previous} -> {next}",
                    self.board.now().as_millis()
                ));
                previous = next;
            }
            lines.append(&mut self.pms.events_mut().lines);
            for frame in self.board.drain_outbox() {
                lines.push(format!("TX {}", describe_frame(&frame)));
            }
        }

        lines.push(format!("OK ran {iterations} state={previous}"));
        lines
    }

    fn status(&self) -> Vec<String> {
        let snapshot = self.pms.snapshot();
        let latch = self.pms.latch();
        vec![
            format!(
                "state={} t=+{}ms",
                snapshot.state,
                self.board.now().as_millis()
            ),
            format!(
                "array={} motor={} precharge={} horn={} brake={}",
                on_off(snapshot.actuators.array_connected),
                on_off(snapshot.actuators.motor_connected),
                on_off(self.board.output(OutputId::Precharge)),
                on_off(self.board.output(OutputId::Horn)),
                on_off(snapshot.actuators.brake_pressed),
            ),
            format!(
                "temperature-safe={} bps-tripped={} policy={:?}",
                latch.battery_temperature_safe(),
                latch.bps_tripped(),
                self.pms.config().array_policy,
            ),
            format!(
                "switches array={} motor={} brake={} (debounced {}/{}/{})",
                on_off(self.board.switch(SwitchId::ArrayEnable)),
                on_off(self.board.switch(SwitchId::MotorEnable)),
                on_off(self.board.switch(SwitchId::Brake)),
                on_off(snapshot.switches.level(SwitchId::ArrayEnable)),
                on_off(snapshot.switches.level(SwitchId::MotorEnable)),
                on_off(snapshot.switches.level(SwitchId::Brake)),
            ),
            format!(
                "send-requested={} heartbeat={} led={} pending={}",
                u8::from(snapshot.send_requested),
                u8::from(snapshot.heartbeat),
                u8::from(self.board.status_led()),
                self.pms
                    .pending()
                    .map_or_else(|| "none".to_owned(), describe_frame),
            ),
        ]
    }
}

fn help(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Type `help <topic>` for a specific command.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_frame(frame: &CanFrame) -> String {
    let mut text = format!("{:#05x} len={}", frame.id(), frame.len());
    if !frame.is_empty() {
        text.push_str(" [");
        for (index, byte) in frame.payload().iter().enumerate() {
            if index > 0 {
                text.push(' ');
            }
            let _ = write!(text, "{byte:02x}");
        }
        text.push(']');
    }
    text
}

fn on_off(level: bool) -> &'static str {
    if level { "on" } else { "off" }
}
