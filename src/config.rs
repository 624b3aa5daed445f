use crate::raw::SlotCapacity;

/// Runtime options, fixed for the lifetime of a [`crate::Controller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Number of account slots in the EEPROM layout.
    pub capacity: SlotCapacity,
    /// Enables the wireless keystroke injector (`BLE_KEYBOARD` setting).
    pub keystrokes: bool,
    /// Proximity readings above this value count as "object detected".
    pub proximity_threshold: u8,
    pub digits: u8,
    /// TOTP period in seconds.
    pub period: u32,
    /// Pause between two input samples. Rate limits the bus and debounces the buttons.
    pub sample_interval_ms: u32,
    /// Length of one fast polling slice between two clock reads.
    pub slice_ms: u32,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            capacity: SlotCapacity::Four,
            keystrokes: true,
            proximity_threshold: 4,
            digits: 6,
            period: 30,
            sample_interval_ms: 50,
            slice_ms: 100,
        }
    }

    pub const fn with_capacity(mut self, capacity: SlotCapacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub const fn with_keystrokes(mut self, enabled: bool) -> Self {
        self.keystrokes = enabled;
        self
    }

    /// Interprets a settings value the way `BLE_KEYBOARD = 0` is meant: `0`, `false`, `off`
    /// and `no` disable, anything else enables.
    pub fn parse_flag(value: &str) -> bool {
        let value = value.trim();
        !["0", "false", "off", "no"]
            .iter()
            .any(|off| off.eq_ignore_ascii_case(value))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
