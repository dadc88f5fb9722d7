//! Fixed-length horn pulse requested over CAN.

use core::time::Duration;

use super::{OutputAction, OutputStep, SequenceKind, SequenceTemplate};
use crate::io::OutputId;

pub const HORN_HOLD: Duration = Duration::from_millis(500);

pub const HORN_STEPS: [OutputStep; 2] = [
    OutputStep::new(OutputId::Horn, OutputAction::Assert, HORN_HOLD),
    OutputStep::new(OutputId::Horn, OutputAction::Release, Duration::ZERO),
];

pub const HORN_TEMPLATE: SequenceTemplate = SequenceTemplate::new(SequenceKind::Horn, &HORN_STEPS);
