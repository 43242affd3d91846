pub mod eeprom;
pub mod traits;

#[cfg(feature = "firmware")]
pub mod debounced_button;
#[cfg(feature = "firmware")]
pub mod oled;
#[cfg(feature = "firmware")]
pub mod uptime_clock;
