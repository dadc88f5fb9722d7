//! Fixed output sequences driven to completion by the polling loop.
//!
//! Precharge and horn actuation are expressed as immutable step templates so
//! the ordering and hold times can be inspected and tested without hardware.
//! [`run_sequence`] walks a template with busy-wait delays; nothing else runs
//! on the main loop until it returns, and a started sequence always finishes.

use core::time::Duration;

use crate::io::{Delay, DigitalIo, OutputId};

pub mod horn;
pub mod precharge;

pub use horn::HORN_TEMPLATE;
pub use precharge::PRECHARGE_TEMPLATE;

/// Level applied to an output during a step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputAction {
    Assert,
    Release,
}

impl OutputAction {
    pub const fn level(self) -> bool {
        matches!(self, OutputAction::Assert)
    }
}

/// Drive one output, then hold for `hold_for` before the next step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutputStep {
    pub output: OutputId,
    pub action: OutputAction,
    pub hold_for: Duration,
}

impl OutputStep {
    pub const fn new(output: OutputId, action: OutputAction, hold_for: Duration) -> Self {
        Self {
            output,
            action,
            hold_for,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SequenceKind {
    Precharge,
    Horn,
}

/// Immutable sequence template.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SequenceTemplate {
    pub kind: SequenceKind,
    pub steps: &'static [OutputStep],
}

impl SequenceTemplate {
    pub const fn new(kind: SequenceKind, steps: &'static [OutputStep]) -> Self {
        Self { kind, steps }
    }

    /// Total time the main loop is blocked while the sequence runs.
    pub fn total_duration(&self) -> Duration {
        self.steps
            .iter()
            .fold(Duration::ZERO, |acc, step| acc + step.hold_for)
    }
}

/// Runs every step of `template` in order, blocking for each hold.
pub fn run_sequence<H>(hw: &mut H, template: &SequenceTemplate)
where
    H: DigitalIo + Delay,
{
    for step in template.steps {
        hw.write_level(step.output, step.action.level());
        if !step.hold_for.is_zero() {
            hw.sleep(step.hold_for);
        }
    }
}
