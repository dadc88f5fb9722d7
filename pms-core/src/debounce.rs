//! Sample / settle / re-sample switch debouncing.

use core::time::Duration;

use crate::io::{Delay, DigitalIo, SwitchId};

/// Result of looking at one switch.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SwitchReading {
    /// Level matches the cached state.
    Unchanged,
    /// The level changed and held through the settle window.
    Confirmed(bool),
    /// The level changed but did not hold; treated as noise.
    Bounced,
}

/// Confirms switch edges by re-sampling after a fixed settle window.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Debouncer {
    settle: Duration,
}

impl Debouncer {
    pub const fn new(settle: Duration) -> Self {
        Self { settle }
    }

    pub const fn settle(&self) -> Duration {
        self.settle
    }

    /// Compares the switch against `cached` and, on an edge, blocks for the
    /// settle window before confirming the new level.
    pub fn confirm<H>(&self, hw: &mut H, switch: SwitchId, cached: bool) -> SwitchReading
    where
        H: DigitalIo + Delay,
    {
        let first = hw.read_level(switch);
        if first == cached {
            return SwitchReading::Unchanged;
        }

        hw.sleep(self.settle);

        if hw.read_level(switch) == first {
            SwitchReading::Confirmed(first)
        } else {
            SwitchReading::Bounced
        }
    }
}

/// Last confirmed level of every switch. All released at boot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SwitchBank {
    levels: [bool; 3],
}

impl SwitchBank {
    pub const fn new() -> Self {
        Self { levels: [false; 3] }
    }

    pub const fn level(&self, switch: SwitchId) -> bool {
        self.levels[switch.as_index()]
    }

    pub fn set(&mut self, switch: SwitchId, level: bool) {
        self.levels[switch.as_index()] = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::OutputId;

    /// Switch that reads `levels[n]` on the n-th read and counts sleeps.
    struct Scripted<'a> {
        levels: &'a [bool],
        reads: usize,
        slept: Duration,
    }

    impl DigitalIo for Scripted<'_> {
        fn read_level(&mut self, _: SwitchId) -> bool {
            let level = self.levels[self.reads.min(self.levels.len() - 1)];
            self.reads += 1;
            level
        }

        fn write_level(&mut self, _: OutputId, _: bool) {}
    }

    impl Delay for Scripted<'_> {
        fn sleep(&mut self, duration: Duration) {
            self.slept += duration;
        }
    }

    fn scripted(levels: &[bool]) -> Scripted<'_> {
        Scripted {
            levels,
            reads: 0,
            slept: Duration::ZERO,
        }
    }

    #[test]
    fn unchanged_level_skips_settle_window() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let mut hw = scripted(&[false]);

        assert_eq!(
            debouncer.confirm(&mut hw, SwitchId::Brake, false),
            SwitchReading::Unchanged
        );
        assert_eq!(hw.slept, Duration::ZERO);
        assert_eq!(hw.reads, 1);
    }

    #[test]
    fn stable_edge_is_confirmed_after_settle() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let mut hw = scripted(&[true, true]);

        assert_eq!(
            debouncer.confirm(&mut hw, SwitchId::ArrayEnable, false),
            SwitchReading::Confirmed(true)
        );
        assert_eq!(hw.slept, Duration::from_millis(50));
    }

    #[test]
    fn edge_that_reverts_is_a_bounce() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let mut hw = scripted(&[false, true]);

        assert_eq!(
            debouncer.confirm(&mut hw, SwitchId::MotorEnable, true),
            SwitchReading::Bounced
        );
    }
}
