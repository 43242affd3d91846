//! One iteration of the refresh loop.
//!
//! Everything that blocks lives here: the clock write-back and the log store
//! I/O. The button handlers only ever touch the [`SharedMachine`].

use heapless::Vec;

use crate::hardware::traits::{ClockSource, Renderer};
use crate::logbook::{LogRecord, LogStore, Slot};
use crate::machine::{self, Mode, SharedMachine, TickAction};
use crate::view::View;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogOp {
    Read,
    Write,
}

/// A log store operation that failed during a tick. Never fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogFault<E> {
    pub op: LogOp,
    pub slot: Slot,
    pub error: E,
}

/// Outcome of one refresh iteration, for the caller to log.
#[derive(Debug)]
pub struct TickReport<E> {
    pub mode: Mode,
    pub view: View,
    /// Clock value written back from a dirty edit
    pub flushed: Option<chrono::NaiveDateTime>,
    /// Record written to `Latest` by a commit
    pub committed: Option<LogRecord>,
    pub faults: Vec<LogFault<E>, 3>,
}

/// Owns the clock and log store on behalf of the refresh loop, plus the last
/// history read so a failed read can fall back to it.
pub struct Controller<C, S> {
    clock: C,
    store: S,
    latest: LogRecord,
    previous: LogRecord,
}

impl<C, S> Controller<C, S>
where
    C: ClockSource,
    S: LogStore,
{
    pub fn new(clock: C, store: S) -> Self {
        Self {
            clock,
            store,
            latest: LogRecord::blank(),
            previous: LogRecord::blank(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&mut self) -> &mut S {
        &mut self.store
    }

    /// Cached history as of the last read or commit.
    pub fn history(&self) -> (LogRecord, LogRecord) {
        (self.latest, self.previous)
    }

    /// Run one iteration: write back a dirty edit first, then act on the mode
    /// snapshot taken together with it.
    pub async fn tick(&mut self, shared: &SharedMachine) -> TickReport<S::Error> {
        let work = machine::take_tick(shared);
        let mut faults = Vec::new();

        if let Some(candidate) = work.flush {
            self.clock.set_time(candidate);
        }

        let (mode, view, committed) = match work.action {
            TickAction::ShowClock => (Mode::Idle, View::clock(self.clock.get_time()), None),
            TickAction::Commit => {
                let record = self.commit(&mut faults).await;
                (Mode::Idle, View::clock(self.clock.get_time()), Some(record))
            }
            TickAction::ShowHistory => {
                self.refresh_history(&mut faults).await;
                let view = View::History {
                    latest: self.latest,
                    previous: self.previous,
                };
                (Mode::History, view, None)
            }
            TickAction::ShowEdit(edit) => (
                Mode::Editing,
                View::editing(edit.candidate, edit.field),
                None,
            ),
        };

        TickReport {
            mode,
            view,
            flushed: work.flush,
            committed,
            faults,
        }
    }

    /// [`tick`](Self::tick), then hand the view to `renderer`.
    pub async fn tick_and_render<R: Renderer>(
        &mut self,
        shared: &SharedMachine,
        renderer: &mut R,
    ) -> TickReport<S::Error> {
        let report = self.tick(shared).await;
        renderer.render(report.mode, &report.view);
        report
    }

    /// Shift `Latest` into `Previous` and save the current clock time.
    async fn commit(&mut self, faults: &mut Vec<LogFault<S::Error>, 3>) -> LogRecord {
        self.read_slot(Slot::Latest, faults).await;

        let record = LogRecord::from_time(&self.clock.get_time());
        let shifted = self.latest;

        if let Err(error) = self.store.write(Slot::Previous, &shifted).await {
            push_fault(faults, LogOp::Write, Slot::Previous, error);
        }
        if let Err(error) = self.store.write(Slot::Latest, &record).await {
            push_fault(faults, LogOp::Write, Slot::Latest, error);
        }

        self.previous = shifted;
        self.latest = record;
        record
    }

    async fn refresh_history(&mut self, faults: &mut Vec<LogFault<S::Error>, 3>) {
        self.read_slot(Slot::Latest, faults).await;
        self.read_slot(Slot::Previous, faults).await;
    }

    /// Read one slot into the cache; on failure the cached record stays.
    async fn read_slot(&mut self, slot: Slot, faults: &mut Vec<LogFault<S::Error>, 3>) {
        match self.store.read(slot).await {
            Ok(record) => match slot {
                Slot::Latest => self.latest = record,
                Slot::Previous => self.previous = record,
            },
            Err(error) => push_fault(faults, LogOp::Read, slot, error),
        }
    }
}

fn push_fault<E>(faults: &mut Vec<LogFault<E>, 3>, op: LogOp, slot: Slot, error: E) {
    // a tick performs at most three store operations
    let _ = faults.push(LogFault { op, slot, error });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EepromConfig;
    use crate::hardware::eeprom::{Eeprom24x, LogError};
    use crate::machine::{ButtonEvent::*, Field, dispatch, shared_machine};
    use crate::testing::{FakeEeprom, ManualClock, NoDelay, RecordingRenderer, hms};
    use embassy_futures::block_on;
    use embedded_hal::i2c::ErrorKind;

    type TestController = Controller<ManualClock, Eeprom24x<FakeEeprom, NoDelay>>;

    fn controller(clock: ManualClock) -> TestController {
        let eeprom = Eeprom24x::new(FakeEeprom::new(), NoDelay::default(), EepromConfig::default());
        Controller::new(clock, eeprom)
    }

    fn stored(c: &mut TestController, slot: Slot) -> LogRecord {
        block_on(c.store().read(slot)).unwrap()
    }

    #[test]
    fn idle_tick_shows_live_clock() {
        let shared = shared_machine();
        let mut c = controller(ManualClock::at(10, 0, 0));
        let report = block_on(c.tick(&shared));
        assert_eq!(report.mode, Mode::Idle);
        assert_eq!(report.view, View::clock(hms(10, 0, 0)));
        assert!(report.faults.is_empty());
    }

    #[test]
    fn edit_then_save_scenario() {
        let shared = shared_machine();
        let mut c = controller(ManualClock::at(10, 0, 0));
        let now = c.clock().get_time();

        assert_eq!(dispatch(&shared, CycleButtonPressed, now), Mode::Editing);
        let report = block_on(c.tick(&shared));
        assert_eq!(report.view, View::editing(hms(10, 0, 0), Field::Hour));

        for _ in 0..3 {
            dispatch(&shared, IncrementButtonPressed, now);
        }
        let report = block_on(c.tick(&shared));
        assert_eq!(report.view, View::editing(hms(13, 0, 0), Field::Hour));
        // edits do not reach the clock while still editing
        assert!(c.clock().sets.is_empty());

        assert_eq!(dispatch(&shared, SaveButtonPressed, now), Mode::Committing);
        assert!(shared.lock(|m| m.borrow().is_dirty()));

        let report = block_on(c.tick(&shared));
        assert_eq!(report.mode, Mode::Idle);
        assert_eq!(report.flushed, Some(hms(13, 0, 0)));
        assert_eq!(c.clock().sets, vec![hms(13, 0, 0)]);
        assert_eq!(report.committed.unwrap().as_str(), Some("13:00:00"));
        assert_eq!(report.view, View::clock(hms(13, 0, 0)));
        assert_eq!(stored(&mut c, Slot::Latest).as_str(), Some("13:00:00"));
        assert_eq!(shared.lock(|m| m.borrow().mode()), Mode::Idle);

        // write-back happened exactly once
        block_on(c.tick(&shared));
        assert_eq!(c.clock().sets.len(), 1);
    }

    #[test]
    fn two_commits_shift_history() {
        let shared = shared_machine();
        let mut c = controller(ManualClock::at(9, 0, 0));

        dispatch(&shared, SaveButtonPressed, c.clock().get_time());
        block_on(c.tick(&shared));

        c.clock.now = hms(9, 5, 0);
        dispatch(&shared, SaveButtonPressed, c.clock().get_time());
        block_on(c.tick(&shared));

        assert_eq!(stored(&mut c, Slot::Latest).as_str(), Some("09:05:00"));
        assert_eq!(stored(&mut c, Slot::Previous).as_str(), Some("09:00:00"));

        dispatch(&shared, ToggleButtonPressed, c.clock().get_time());
        let report = block_on(c.tick(&shared));
        assert_eq!(
            report.view,
            View::History {
                latest: LogRecord::from_text("09:05:00"),
                previous: LogRecord::from_text("09:00:00"),
            }
        );
    }

    #[test]
    fn history_survives_a_new_controller() {
        let shared = shared_machine();
        let mut c = controller(ManualClock::at(9, 0, 0));
        dispatch(&shared, SaveButtonPressed, c.clock().get_time());
        block_on(c.tick(&shared));

        // same device, fresh boot
        let (bus, delay) = c.store.release();
        let mut rebooted = Controller::new(
            ManualClock::at(0, 0, 0),
            Eeprom24x::new(bus, delay, EepromConfig::default()),
        );
        dispatch(&shared, ToggleButtonPressed, hms(0, 0, 0));
        let report = block_on(rebooted.tick(&shared));
        match report.view {
            View::History { latest, previous } => {
                assert_eq!(latest.as_str(), Some("09:00:00"));
                // never written: erased bytes
                assert_eq!(previous.display_text(), "--:--:--");
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn failed_read_during_commit_shifts_stale_cache() {
        let shared = shared_machine();
        let mut c = controller(ManualClock::at(9, 0, 0));
        dispatch(&shared, SaveButtonPressed, c.clock().get_time());
        block_on(c.tick(&shared));

        c.clock.now = hms(9, 5, 0);
        c.store().bus_mut().fail_next(ErrorKind::Bus);
        dispatch(&shared, SaveButtonPressed, c.clock().get_time());
        let report = block_on(c.tick(&shared));

        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].op, LogOp::Read);
        assert_eq!(report.faults[0].slot, Slot::Latest);
        assert_eq!(report.faults[0].error, LogError::Bus(ErrorKind::Bus));
        // commit still went through using the cached latest record
        assert_eq!(stored(&mut c, Slot::Previous).as_str(), Some("09:00:00"));
        assert_eq!(stored(&mut c, Slot::Latest).as_str(), Some("09:05:00"));
    }

    #[test]
    fn failed_history_read_keeps_cached_record() {
        let shared = shared_machine();
        let mut c = controller(ManualClock::at(11, 11, 11));
        dispatch(&shared, SaveButtonPressed, c.clock().get_time());
        block_on(c.tick(&shared));

        c.store().bus_mut().fail_next(ErrorKind::ArbitrationLoss);
        dispatch(&shared, ToggleButtonPressed, c.clock().get_time());
        let report = block_on(c.tick(&shared));

        assert_eq!(report.mode, Mode::History);
        assert_eq!(report.faults.len(), 1);
        assert_eq!(c.history().0.as_str(), Some("11:11:11"));
    }

    #[test]
    fn toggle_out_of_edit_applies_edit_on_next_tick() {
        let shared = shared_machine();
        let mut c = controller(ManualClock::at(6, 30, 0));
        let now = c.clock().get_time();
        dispatch(&shared, IncrementButtonPressed, now);
        dispatch(&shared, IncrementButtonPressed, now);
        dispatch(&shared, ToggleButtonPressed, now);

        let report = block_on(c.tick(&shared));
        assert_eq!(report.mode, Mode::History);
        assert_eq!(c.clock().get_time(), hms(7, 30, 0));
    }

    #[test]
    fn renderer_receives_each_view() {
        let shared = shared_machine();
        let mut c = controller(ManualClock::at(1, 2, 3));
        let mut renderer = RecordingRenderer::default();

        block_on(c.tick_and_render(&shared, &mut renderer));
        dispatch(&shared, CycleButtonPressed, hms(1, 2, 3));
        dispatch(&shared, CycleButtonPressed, hms(1, 2, 3));
        block_on(c.tick_and_render(&shared, &mut renderer));

        assert_eq!(
            renderer.frames,
            vec![
                (Mode::Idle, View::clock(hms(1, 2, 3))),
                (Mode::Editing, View::editing(hms(1, 2, 3), Field::Minute)),
            ]
        );
    }
}
