use core::cell::Cell;

use chrono::NaiveDateTime;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Instant;

use super::traits::ClockSource;
use crate::clock::SoftClock;

/// Storage for the wall clock, readable from handlers and the refresh loop.
pub type ClockCell = Mutex<CriticalSectionRawMutex, Cell<Option<SoftClock>>>;

pub const fn clock_cell() -> ClockCell {
    Mutex::new(Cell::new(None))
}

/// [`SoftClock`] running on the embassy uptime counter.
#[derive(Clone, Copy)]
pub struct UptimeClock {
    cell: &'static ClockCell,
}

impl UptimeClock {
    /// Start the clock at `initial`.
    pub fn start(cell: &'static ClockCell, initial: NaiveDateTime) -> Self {
        let now = uptime_ms();
        cell.lock(|c| c.set(Some(SoftClock::new(initial, now))));
        Self { cell }
    }
}

impl ClockSource for UptimeClock {
    fn get_time(&self) -> NaiveDateTime {
        let now = uptime_ms();
        self.cell
            .lock(|c| c.get())
            .map(|clock| clock.now(now))
            .unwrap_or_default()
    }

    fn set_time(&mut self, time: NaiveDateTime) {
        let now = uptime_ms();
        self.cell.lock(|c| c.set(Some(SoftClock::new(time, now))));
    }
}

fn uptime_ms() -> u64 {
    Instant::now().as_millis()
}
