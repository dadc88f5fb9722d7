mod common;

use core::time::Duration;

use common::{MockBoard, controller, cycle};
use pms_core::can::BRAKE_LIGHT_ID;
use pms_core::capture::CaptureLayer;
use pms_core::config::PmsConfig;
use pms_core::events::{DisconnectReason, PmsEvent};
use pms_core::io::{OutputId, SwitchId};
use pms_core::safety::ArrayEnablePolicy;
use pms_core::sequences::precharge::{MOTOR_SETTLE, PRECHARGE_HOLD};
use pms_core::timing::TickSource;

fn trip_only() -> PmsConfig {
    PmsConfig::DEFAULT.with_array_policy(ArrayEnablePolicy::TripOnly)
}

#[test]
fn glitches_shorter_than_settle_window_are_ignored() {
    let capture = CaptureLayer::new();
    let tick = TickSource::new(Duration::from_millis(200));
    let mut board = MockBoard::new();
    let mut pms = controller(trip_only(), &capture, &tick);
    assert!(PmsConfig::DEFAULT.debounce_settle > Duration::from_millis(49));

    for width_ms in [1, 10, 25, 49] {
        board.glitch_switch(SwitchId::ArrayEnable, true, Duration::from_millis(width_ms));
        cycle(&mut pms, &mut board);
    }

    assert!(board.writes_to(OutputId::Array).is_empty());
    assert!(!pms.switches().level(SwitchId::ArrayEnable));
    let bounces = pms
        .events()
        .events
        .iter()
        .filter(|event| **event == PmsEvent::SwitchBounce(SwitchId::ArrayEnable))
        .count();
    assert_eq!(bounces, 4);
}

#[test]
fn held_switch_edge_is_confirmed_once() {
    let capture = CaptureLayer::new();
    let tick = TickSource::new(Duration::from_millis(200));
    let mut board = MockBoard::new();
    let mut pms = controller(trip_only(), &capture, &tick);

    board.set_switch(SwitchId::ArrayEnable, true);
    cycle(&mut pms, &mut board);
    cycle(&mut pms, &mut board);
    cycle(&mut pms, &mut board);

    assert_eq!(board.writes_to(OutputId::Array).len(), 1);
    assert!(board.output(OutputId::Array));
    assert_eq!(board.now, PmsConfig::DEFAULT.debounce_settle);
}

#[test]
fn array_switch_off_always_opens_contactor() {
    let capture = CaptureLayer::new();
    let tick = TickSource::new(Duration::from_millis(200));
    let mut board = MockBoard::new();
    let mut pms = controller(trip_only(), &capture, &tick);

    board.set_switch(SwitchId::ArrayEnable, true);
    cycle(&mut pms, &mut board);
    board.set_switch(SwitchId::ArrayEnable, false);
    cycle(&mut pms, &mut board);

    assert!(!board.output(OutputId::Array));
    assert!(pms.events().contains(&PmsEvent::ArrayDisconnected(
        DisconnectReason::Switch
    )));
}

#[test]
fn motor_connects_through_precharge() {
    let capture = CaptureLayer::new();
    let tick = TickSource::new(Duration::from_millis(200));
    let mut board = MockBoard::new();
    let mut pms = controller(PmsConfig::DEFAULT, &capture, &tick);

    board.set_switch(SwitchId::MotorEnable, true);
    cycle(&mut pms, &mut board);

    let precharge = board.writes_to(OutputId::Precharge);
    let motor = board.writes_to(OutputId::Motor);
    assert_eq!(precharge.len(), 2);
    assert_eq!(motor.len(), 1);

    let (precharge_on, _) = precharge[0];
    let (motor_on, motor_level) = motor[0];
    let (precharge_off, precharge_level) = precharge[1];
    assert!(motor_level);
    assert!(!precharge_level);
    assert!(motor_on - precharge_on >= PRECHARGE_HOLD);
    assert_eq!(precharge_off - motor_on, MOTOR_SETTLE);

    assert!(board.output(OutputId::Motor));
    assert!(!board.output(OutputId::Precharge));
    assert!(pms.actuators().motor_connected);
    assert!(pms.events().contains(&PmsEvent::MotorConnected));
}

#[test]
fn motor_switch_off_opens_contactor_immediately() {
    let capture = CaptureLayer::new();
    let tick = TickSource::new(Duration::from_millis(200));
    let mut board = MockBoard::new();
    let mut pms = controller(PmsConfig::DEFAULT, &capture, &tick);

    board.set_switch(SwitchId::MotorEnable, true);
    cycle(&mut pms, &mut board);
    board.set_switch(SwitchId::MotorEnable, false);
    let before = board.now;
    cycle(&mut pms, &mut board);

    assert!(!board.output(OutputId::Motor));
    assert_eq!(board.now - before, PmsConfig::DEFAULT.debounce_settle);
    assert!(pms.events().contains(&PmsEvent::MotorDisconnected));
}

#[test]
fn brake_edges_each_emit_an_empty_frame() {
    let capture = CaptureLayer::new();
    let tick = TickSource::new(Duration::from_millis(200));
    let mut board = MockBoard::new();
    let mut pms = controller(PmsConfig::DEFAULT, &capture, &tick);

    board.set_switch(SwitchId::Brake, true);
    cycle(&mut pms, &mut board);
    assert!(pms.actuators().brake_pressed);

    board.set_switch(SwitchId::Brake, false);
    cycle(&mut pms, &mut board);
    assert!(!pms.actuators().brake_pressed);

    let frames = board.frames_with_id(BRAKE_LIGHT_ID);
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|frame| frame.is_empty()));
    assert_eq!(
        pms.events().events,
        [PmsEvent::BrakeChanged(true), PmsEvent::BrakeChanged(false)]
    );
}
