//! Millisecond tick source shared with the timer interrupt.

use core::time::Duration;

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// What a single tick changed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickOutcome {
    /// New heartbeat LED level when the period rolled over this tick.
    pub heartbeat: Option<bool>,
}

/// Counts 1 ms timer interrupts and raises the telemetry send request once per
/// period.
///
/// `on_tick` is the interrupt body. It never blocks and only touches atomics;
/// the millisecond counter has a single writer so plain loads and stores
/// suffice.
pub struct TickSource {
    period_ms: u32,
    elapsed_ms: AtomicU32,
    heartbeat: AtomicBool,
    send_requested: AtomicBool,
}

impl TickSource {
    pub const fn new(period: Duration) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let period_ms = period.as_millis() as u32;
        Self {
            period_ms: if period_ms == 0 { 1 } else { period_ms },
            elapsed_ms: AtomicU32::new(0),
            heartbeat: AtomicBool::new(false),
            send_requested: AtomicBool::new(false),
        }
    }

    /// Timer interrupt body.
    pub fn on_tick(&self) -> TickOutcome {
        let elapsed = self.elapsed_ms.load(Ordering::Relaxed) + 1;
        if elapsed < self.period_ms {
            self.elapsed_ms.store(elapsed, Ordering::Relaxed);
            return TickOutcome { heartbeat: None };
        }

        self.elapsed_ms.store(0, Ordering::Relaxed);
        let level = !self.heartbeat.fetch_not(Ordering::Relaxed);
        self.send_requested.store(true, Ordering::Release);
        TickOutcome {
            heartbeat: Some(level),
        }
    }

    pub fn send_requested(&self) -> bool {
        self.send_requested.load(Ordering::Acquire)
    }

    pub fn clear_send_request(&self) {
        self.send_requested.store(false, Ordering::Release);
    }

    /// Current heartbeat LED level.
    pub fn heartbeat(&self) -> bool {
        self.heartbeat.load(Ordering::Relaxed)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(u64::from(self.period_ms))
    }
}
