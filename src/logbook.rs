//! Two-slot save history kept in non-volatile memory.
//!
//! Each slot holds one fixed-size [`LogRecord`]: an `HH:MM:SS` string padded
//! with NUL bytes to [`RECORD_LEN`]. A commit shifts `Latest` into
//! `Previous` before writing the new time.

use core::fmt::Write;

use chrono::{NaiveDateTime, Timelike};

/// Bytes reserved for each slot on the device
pub const RECORD_LEN: usize = 20;

/// Meaningful characters in a record (`HH:MM:SS`)
pub const TIME_TEXT_LEN: usize = 8;

/// Shown in place of a record that holds no valid time
pub const EMPTY_RECORD_TEXT: &str = "--:--:--";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slot {
    Latest,
    Previous,
}

impl Slot {
    pub const fn address(self) -> u16 {
        match self {
            Slot::Latest => 0,
            Slot::Previous => 20,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogRecord {
    bytes: [u8; RECORD_LEN],
}

impl LogRecord {
    /// All-zero record, used before anything was read from the device.
    pub const fn blank() -> Self {
        Self {
            bytes: [0; RECORD_LEN],
        }
    }

    pub fn from_time(time: &NaiveDateTime) -> Self {
        let mut text: heapless::String<TIME_TEXT_LEN> = heapless::String::new();
        // eight characters always fit
        let _ = write!(
            text,
            "{:02}:{:02}:{:02}",
            time.hour(),
            time.minute(),
            time.second()
        );
        Self::from_text(&text)
    }

    /// Copies `text` into a NUL-padded buffer, truncating anything that does
    /// not fit in front of the terminator.
    pub fn from_text(text: &str) -> Self {
        let mut bytes = [0; RECORD_LEN];
        let len = text.len().min(RECORD_LEN - 1);
        bytes[..len].copy_from_slice(&text.as_bytes()[..len]);
        Self { bytes }
    }

    pub const fn from_bytes(bytes: [u8; RECORD_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_LEN] {
        &self.bytes
    }

    /// Text in front of the first NUL, or `None` when that is not UTF-8
    /// (an erased device reads back as 0xFF).
    pub fn as_str(&self) -> Option<&str> {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(RECORD_LEN);
        core::str::from_utf8(&self.bytes[..end]).ok()
    }

    /// Exactly `HH:MM:SS` with hour < 24 and minute, second < 60.
    pub fn is_valid(&self) -> bool {
        let Some(text) = self.as_str() else {
            return false;
        };
        let b = text.as_bytes();
        if b.len() != TIME_TEXT_LEN || b[2] != b':' || b[5] != b':' {
            return false;
        }

        let field = |i: usize| -> Option<u8> {
            let (hi, lo) = (b[i], b[i + 1]);
            (hi.is_ascii_digit() && lo.is_ascii_digit()).then(|| (hi - b'0') * 10 + (lo - b'0'))
        };

        matches!(
            (field(0), field(3), field(6)),
            (Some(h), Some(m), Some(s)) if h < 24 && m < 60 && s < 60
        )
    }

    /// What the display shows for this record.
    pub fn display_text(&self) -> &str {
        match self.as_str() {
            Some(text) if self.is_valid() => text,
            _ => EMPTY_RECORD_TEXT,
        }
    }
}

impl Default for LogRecord {
    fn default() -> Self {
        Self::blank()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LogRecord {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.display_text())
    }
}

/// Slot-addressed persistent storage for log records.
#[allow(async_fn_in_trait)]
pub trait LogStore {
    type Error;

    async fn read(&mut self, slot: Slot) -> Result<LogRecord, Self::Error>;
    async fn write(&mut self, slot: Slot, record: &LogRecord) -> Result<(), Self::Error>;
}
