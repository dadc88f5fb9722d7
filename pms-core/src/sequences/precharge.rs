//! Precharge-then-connect sequence for the motor contactor.
//!
//! The motor controller's input capacitance is charged through the precharge
//! resistor for whole seconds before the main contactor closes, then the
//! precharge relay drops out once the contactor has settled.

use core::time::Duration;

use super::{OutputAction, OutputStep, SequenceKind, SequenceTemplate};
use crate::io::OutputId;

/// Time the precharge relay is held before the motor contactor closes.
pub const PRECHARGE_HOLD: Duration = Duration::from_secs(2);
/// Overlap between contactor close and precharge release.
pub const MOTOR_SETTLE: Duration = Duration::from_millis(100);

pub const PRECHARGE_STEPS: [OutputStep; 3] = [
    OutputStep::new(OutputId::Precharge, OutputAction::Assert, PRECHARGE_HOLD),
    OutputStep::new(OutputId::Motor, OutputAction::Assert, MOTOR_SETTLE),
    OutputStep::new(OutputId::Precharge, OutputAction::Release, Duration::ZERO),
];

pub const PRECHARGE_TEMPLATE: SequenceTemplate =
    SequenceTemplate::new(SequenceKind::Precharge, &PRECHARGE_STEPS);
