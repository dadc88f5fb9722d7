//! Battery-temperature gating and the one-way BPS trip latch.

/// Conditions under which the array contactor may be energized.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArrayEnablePolicy {
    /// Only a BPS trip blocks the array.
    TripOnly,
    /// A BPS trip or an unsafe battery temperature blocks the array.
    TripAndTemperature,
}

/// Safety state gating the array contactor.
///
/// There is deliberately no way to clear `bps_tripped`: only a hardware reset,
/// which rebuilds the latch through [`SafetyLatch::new`], leaves a trip.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SafetyLatch {
    battery_temperature_safe: bool,
    bps_tripped: bool,
}

impl SafetyLatch {
    /// Boot state: not tripped, temperatures not yet confirmed safe. The BPS
    /// has not reported yet, so the array stays open until its first all-clear.
    pub const fn new() -> Self {
        Self {
            battery_temperature_safe: false,
            bps_tripped: false,
        }
    }

    pub const fn battery_temperature_safe(&self) -> bool {
        self.battery_temperature_safe
    }

    pub const fn bps_tripped(&self) -> bool {
        self.bps_tripped
    }

    /// Returns `true` when `policy` allows energizing the array.
    pub const fn permits_array(&self, policy: ArrayEnablePolicy) -> bool {
        if self.bps_tripped {
            return false;
        }
        match policy {
            ArrayEnablePolicy::TripOnly => true,
            ArrayEnablePolicy::TripAndTemperature => self.battery_temperature_safe,
        }
    }

    pub fn mark_temperature_unsafe(&mut self) {
        self.battery_temperature_safe = false;
    }

    pub fn mark_temperature_safe(&mut self) {
        self.battery_temperature_safe = true;
    }

    /// Latches the trip. Irreversible.
    pub fn trip(&mut self) {
        self.bps_tripped = true;
    }
}

impl Default for SafetyLatch {
    fn default() -> Self {
        Self::new()
    }
}
