//! Observable decisions reported by the state machine.
//!
//! The core never logs directly. Callers hand [`crate::machine::Pms`] an
//! [`EventSink`]; firmware forwards events to defmt and the emulator prints
//! them.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::can::TransmitError;
use crate::io::SwitchId;

/// Why the array contactor was opened.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DisconnectReason {
    Switch,
    Temperature,
    BpsTrip,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::Switch => f.write_str("switch"),
            DisconnectReason::Temperature => f.write_str("temperature"),
            DisconnectReason::BpsTrip => f.write_str("bps-trip"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PmsEvent {
    ArrayConnected,
    ArrayDisconnected(DisconnectReason),
    /// Array enable requested while the safety latch forbids it.
    ArrayEnableRefused,
    MotorConnected,
    MotorDisconnected,
    HornSounded,
    BrakeChanged(bool),
    /// A switch edge that did not survive the debounce window.
    SwitchBounce(SwitchId),
    TemperatureWarning {
        id: u32,
        index: usize,
        value: u8,
    },
    TemperatureCleared {
        id: u32,
    },
    BpsTripLatched,
    TelemetrySent {
        heartbeat: bool,
    },
    TransmitFailed {
        id: u32,
        error: TransmitError,
    },
    UnknownFrame(u32),
}

impl PmsEvent {
    /// Events that indicate a safety action or a dropped frame.
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            PmsEvent::ArrayEnableRefused
                | PmsEvent::TemperatureWarning { .. }
                | PmsEvent::BpsTripLatched
                | PmsEvent::TransmitFailed { .. }
        )
    }
}

impl fmt::Display for PmsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PmsEvent::ArrayConnected => f.write_str("array connected"),
            PmsEvent::ArrayDisconnected(reason) => write!(f, "array disconnected ({reason})"),
            PmsEvent::ArrayEnableRefused => f.write_str("array enable refused by safety latch"),
            PmsEvent::MotorConnected => f.write_str("motor connected after precharge"),
            PmsEvent::MotorDisconnected => f.write_str("motor disconnected"),
            PmsEvent::HornSounded => f.write_str("horn pulsed"),
            PmsEvent::BrakeChanged(pressed) => {
                write!(f, "brake {}", if *pressed { "pressed" } else { "released" })
            }
            PmsEvent::SwitchBounce(switch) => write!(f, "{} switch bounce ignored", switch.label()),
            PmsEvent::TemperatureWarning { id, index, value } => {
                write!(f, "battery temperature {value} at {id:#x}[{index}] over limit")
            }
            PmsEvent::TemperatureCleared { id } => {
                write!(f, "battery temperatures at {id:#x} within limit")
            }
            PmsEvent::BpsTripLatched => f.write_str("BPS trip latched"),
            PmsEvent::TelemetrySent { heartbeat } => {
                write!(f, "telemetry sent hb={}", u8::from(*heartbeat))
            }
            PmsEvent::TransmitFailed { id, error } => write!(f, "transmit {id:#x} failed: {error}"),
            PmsEvent::UnknownFrame(id) => write!(f, "ignored frame {id:#x}"),
        }
    }
}

/// Receiver for [`PmsEvent`]s.
pub trait EventSink {
    fn record(&mut self, event: PmsEvent);
}

/// Fixed-capacity history of the most recent events.
pub struct EventRing<const CAPACITY: usize> {
    ring: HistoryBuf<PmsEvent, CAPACITY>,
    total: u32,
}

impl<const CAPACITY: usize> EventRing<CAPACITY> {
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            total: 0,
        }
    }

    pub fn oldest_first(&self) -> OldestOrdered<'_, PmsEvent> {
        self.ring.oldest_ordered()
    }

    /// Events recorded since construction, including overwritten ones.
    pub const fn total(&self) -> u32 {
        self.total
    }
}

impl<const CAPACITY: usize> Default for EventRing<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAPACITY: usize> EventSink for EventRing<CAPACITY> {
    fn record(&mut self, event: PmsEvent) {
        self.ring.write(event);
        self.total = self.total.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_keeps_most_recent_events() {
        let mut ring = EventRing::<2>::new();
        ring.record(PmsEvent::ArrayConnected);
        ring.record(PmsEvent::HornSounded);
        ring.record(PmsEvent::BpsTripLatched);

        assert_eq!(ring.total(), 3);
        let mut ordered = ring.oldest_first();
        assert_eq!(ordered.next(), Some(&PmsEvent::HornSounded));
        assert_eq!(ordered.next(), Some(&PmsEvent::BpsTripLatched));
        assert_eq!(ordered.next(), None);
    }

    #[test]
    fn warnings_cover_safety_actions() {
        assert!(PmsEvent::BpsTripLatched.is_warning());
        assert!(
            PmsEvent::TemperatureWarning {
                id: 0x608,
                index: 6,
                value: 70
            }
            .is_warning()
        );
        assert!(!PmsEvent::ArrayConnected.is_warning());
    }
}
