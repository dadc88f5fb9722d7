//! Compile-time tuning for the control loop.

use core::time::Duration;

use crate::safety::ArrayEnablePolicy;

/// Telemetry page cadence, also the heartbeat LED half-period.
pub const DEFAULT_TELEMETRY_PERIOD: Duration = Duration::from_millis(200);
/// Time a switch must hold its new level before the edge is acted on.
pub const DEFAULT_DEBOUNCE_SETTLE: Duration = Duration::from_millis(50);
/// Delay after enabling the measurement supply before the first sample.
pub const DEFAULT_MEASURE_SETTLE: Duration = Duration::from_millis(10);
/// Delay between selecting an ADC channel and sampling it.
pub const DEFAULT_SAMPLE_SETTLE: Duration = Duration::from_micros(20);
/// 60 °C battery charge limit; any reading at or above it opens the array.
pub const DEFAULT_TEMPERATURE_WARNING: u8 = 60;

/// Fixed configuration consumed by the state machine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PmsConfig {
    pub telemetry_period: Duration,
    pub debounce_settle: Duration,
    pub measure_settle: Duration,
    pub sample_settle: Duration,
    pub temperature_warning: u8,
    pub array_policy: ArrayEnablePolicy,
}

impl PmsConfig {
    pub const DEFAULT: Self = Self {
        telemetry_period: DEFAULT_TELEMETRY_PERIOD,
        debounce_settle: DEFAULT_DEBOUNCE_SETTLE,
        measure_settle: DEFAULT_MEASURE_SETTLE,
        sample_settle: DEFAULT_SAMPLE_SETTLE,
        temperature_warning: DEFAULT_TEMPERATURE_WARNING,
        array_policy: ArrayEnablePolicy::TripAndTemperature,
    };

    /// Same configuration with a different array-enable policy.
    #[must_use]
    pub const fn with_array_policy(mut self, policy: ArrayEnablePolicy) -> Self {
        self.array_policy = policy;
        self
    }
}

impl Default for PmsConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
