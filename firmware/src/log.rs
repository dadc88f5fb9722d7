//! defmt-backed event sink.

use pms_core::events::{EventRing, EventSink, PmsEvent};

/// Number of recent events retained for inspection over the debug probe.
pub const EVENT_HISTORY: usize = 32;

pub struct DefmtEventSink {
    recent: EventRing<EVENT_HISTORY>,
}

impl DefmtEventSink {
    pub const fn new() -> Self {
        Self {
            recent: EventRing::new(),
        }
    }

    pub fn recent(&self) -> &EventRing<EVENT_HISTORY> {
        &self.recent
    }
}

impl EventSink for DefmtEventSink {
    fn record(&mut self, event: PmsEvent) {
        match event {
            PmsEvent::BpsTripLatched => {
                defmt::error!("pms: {}", defmt::Display2Format(&event));
            }
            _ if event.is_warning() => {
                defmt::warn!("pms: {}", defmt::Display2Format(&event));
            }
            PmsEvent::TelemetrySent { .. } | PmsEvent::SwitchBounce(_) => {
                defmt::debug!("pms: {}", defmt::Display2Format(&event));
            }
            _ => defmt::info!("pms: {}", defmt::Display2Format(&event)),
        }
        self.recent.record(event);
    }
}
