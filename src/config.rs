//! Board-independent tuning values.
//!
//! The firmware builds one [`Config`] at boot with `Config::default()` and
//! hands the pieces to the tasks that need them, the same way the embassy
//! peripherals are brought up with `embassy_stm32::init(Default::default())`.

use chrono::{NaiveDate, NaiveDateTime};

/// Refresh period of the cooperative display loop (ms)
pub const REFRESH_INTERVAL_MS: u64 = 100;

/// Minimum time between two accepted presses of the same button (ms)
pub const DEBOUNCE_REARM_MS: u64 = 100;

/// 7-bit bus address of the log EEPROM (0xA0 in 8-bit write notation)
pub const EEPROM_ADDRESS: u8 = 0x50;

/// Internal write-cycle settle time after each bus phase (ms)
pub const EEPROM_SETTLE_MS: u32 = 6;

/// Page size of a 24C32-class device
pub const EEPROM_PAGE_SIZE: u16 = 32;

/// Capacity of a 24C32-class device
pub const EEPROM_CAPACITY: u16 = 4096;

/// Geometry and timing of the external EEPROM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EepromConfig {
    pub address: u8,
    pub page_size: u16,
    pub capacity: u16,
    pub settle_ms: u32,
}

impl Default for EepromConfig {
    fn default() -> Self {
        Self {
            address: EEPROM_ADDRESS,
            page_size: EEPROM_PAGE_SIZE,
            capacity: EEPROM_CAPACITY,
            settle_ms: EEPROM_SETTLE_MS,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub refresh_interval_ms: u64,
    pub debounce_rearm_ms: u64,
    pub eeprom: EepromConfig,
    /// Wall time the clock starts from after power-up
    pub initial_time: NaiveDateTime,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: REFRESH_INTERVAL_MS,
            debounce_rearm_ms: DEBOUNCE_REARM_MS,
            eeprom: EepromConfig::default(),
            initial_time: boot_time(),
        }
    }
}

/// 2025-01-01 00:00:00
pub fn boot_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}
