mod common;

use core::time::Duration;

use common::{MockBoard, controller, cycle, deliver};
use pms_core::actuators::ActuatorState;
use pms_core::can::ENABLE_HORN_ID;
use pms_core::capture::CaptureLayer;
use pms_core::config::PmsConfig;
use pms_core::events::PmsEvent;
use pms_core::io::OutputId;
use pms_core::machine::SystemState;
use pms_core::sequences::horn::HORN_HOLD;
use pms_core::timing::TickSource;

fn tick_source() -> TickSource {
    TickSource::new(Duration::from_millis(200))
}

#[test]
fn horn_command_pulses_horn_once() {
    let capture = CaptureLayer::new();
    let tick = tick_source();
    let mut board = MockBoard::new();
    let mut pms = controller(PmsConfig::DEFAULT, &capture, &tick);

    deliver(&capture, ENABLE_HORN_ID, &[]);

    assert_eq!(pms.poll(&mut board), SystemState::DataReceived);
    assert_eq!(pms.poll(&mut board), SystemState::Idle);

    assert_eq!(
        board.writes_to(OutputId::Horn),
        vec![(Duration::ZERO, true), (HORN_HOLD, false)]
    );
    assert!(!board.output(OutputId::Horn), "horn released after the hold");
    assert_eq!(pms.events().events, vec![PmsEvent::HornSounded]);
    assert!(board.sent.is_empty(), "horn command is not acknowledged");
}

#[test]
fn unlisted_identifier_is_ignored() {
    let capture = CaptureLayer::new();
    let tick = tick_source();
    let mut board = MockBoard::new();
    let mut pms = controller(PmsConfig::DEFAULT, &capture, &tick);

    deliver(&capture, 0x123, &[1, 2, 3, 4, 5, 6, 7, 8]);

    assert_eq!(cycle(&mut pms, &mut board), SystemState::Idle);
    assert!(board.writes.is_empty(), "no output should move");
    assert!(board.sent.is_empty(), "no frame should be sent");
    assert_eq!(pms.events().events, vec![PmsEvent::UnknownFrame(0x123)]);
    assert_eq!(pms.actuators(), ActuatorState::default());
}
