//! Software wall clock driven by a monotonic millisecond counter.

use chrono::{Duration, NaiveDateTime};

/// Wall time expressed as an anchor plus the monotonic time elapsed since the
/// anchor was taken. Setting the clock only moves the anchor, so the clock
/// keeps running without a dedicated update task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoftClock {
    anchor: NaiveDateTime,
    anchor_ms: u64,
}

impl SoftClock {
    pub const fn new(anchor: NaiveDateTime, now_ms: u64) -> Self {
        Self {
            anchor,
            anchor_ms: now_ms,
        }
    }

    pub fn now(&self, now_ms: u64) -> NaiveDateTime {
        let elapsed = now_ms.saturating_sub(self.anchor_ms);
        let elapsed = Duration::milliseconds(i64::try_from(elapsed).unwrap_or(i64::MAX));
        self.anchor
            .checked_add_signed(elapsed)
            .unwrap_or(self.anchor)
    }

    pub fn set(&mut self, time: NaiveDateTime, now_ms: u64) {
        self.anchor = time;
        self.anchor_ms = now_ms;
    }
}
