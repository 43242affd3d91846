//! Operating-mode state machine.
//!
//! Button handlers call [`ModeMachine::handle`]; it only touches in-memory
//! state and never blocks. The refresh loop calls [`ModeMachine::take_tick`]
//! once per iteration to collect the work it has to do outside the handlers:
//! the pending clock write-back, if any, and what to do for the current mode.
//!
//! Both sides reach the machine through [`SharedMachine`], a critical-section
//! mutex, so mode, edit state and the pending write-back always change
//! together.

use core::cell::RefCell;

use chrono::{NaiveDateTime, Timelike};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Showing live time
    Idle,
    /// Save requested; the next tick writes the log and returns to `Idle`
    Committing,
    /// Showing the last two saved times
    History,
    /// User adjusting a field of a candidate time
    Editing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    SaveButtonPressed,
    ToggleButtonPressed,
    CycleButtonPressed,
    IncrementButtonPressed,
}

/// Time field selected for editing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Hour,
    Minute,
    Second,
}

impl Field {
    /// Hour -> Minute -> Second -> Hour
    pub const fn next(self) -> Self {
        match self {
            Field::Hour => Field::Minute,
            Field::Minute => Field::Second,
            Field::Second => Field::Hour,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Field::Hour => 0,
            Field::Minute => 1,
            Field::Second => 2,
        }
    }

    /// Adds one to this field of `time`, wrapping within the field only.
    pub fn increment(self, time: NaiveDateTime) -> NaiveDateTime {
        let bumped = match self {
            Field::Hour => time.with_hour((time.hour() + 1) % 24),
            Field::Minute => time.with_minute((time.minute() + 1) % 60),
            Field::Second => time.with_second((time.second() + 1) % 60),
        };
        bumped.unwrap_or(time)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditState {
    pub candidate: NaiveDateTime,
    pub field: Field,
}

/// Work the refresh loop performs this iteration, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickWork {
    /// Candidate time to write back to the clock before anything else
    pub flush: Option<NaiveDateTime>,
    pub action: TickAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickAction {
    ShowClock,
    /// Shift the log and save the clock time, then show the clock
    Commit,
    ShowHistory,
    ShowEdit(EditState),
}

pub struct ModeMachine {
    mode: Mode,
    edit: Option<EditState>,
    /// Dirty edit waiting for the next tick's write-back
    pending: Option<NaiveDateTime>,
}

impl ModeMachine {
    pub const fn new() -> Self {
        Self {
            mode: Mode::Idle,
            edit: None,
            pending: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn edit(&self) -> Option<EditState> {
        self.edit
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply one debounced button event. `now` is the current clock reading,
    /// used to seed a new edit. Returns the mode after the event.
    pub fn handle(&mut self, event: ButtonEvent, now: NaiveDateTime) -> Mode {
        match event {
            ButtonEvent::SaveButtonPressed => {
                self.leave_editing();
                self.mode = Mode::Committing;
            }
            ButtonEvent::ToggleButtonPressed => {
                if self.mode == Mode::History {
                    self.mode = Mode::Idle;
                } else {
                    self.leave_editing();
                    self.mode = Mode::History;
                }
            }
            ButtonEvent::CycleButtonPressed => match self.edit.as_mut() {
                Some(edit) if self.mode == Mode::Editing => edit.field = edit.field.next(),
                _ => self.enter_editing(now),
            },
            ButtonEvent::IncrementButtonPressed => match self.edit.as_mut() {
                Some(edit) if self.mode == Mode::Editing => {
                    edit.candidate = edit.field.increment(edit.candidate)
                }
                _ => self.enter_editing(now),
            },
        }
        self.mode
    }

    /// Collect this iteration's work. The write-back is handed out once and
    /// the flag cleared; a commit moves the machine back to `Idle` so it runs
    /// exactly once per save request.
    pub fn take_tick(&mut self) -> TickWork {
        let flush = self.pending.take();
        let action = match self.mode {
            Mode::Idle => TickAction::ShowClock,
            Mode::Committing => {
                self.mode = Mode::Idle;
                TickAction::Commit
            }
            Mode::History => TickAction::ShowHistory,
            Mode::Editing => match self.edit {
                Some(edit) => TickAction::ShowEdit(edit),
                None => {
                    self.mode = Mode::Idle;
                    TickAction::ShowClock
                }
            },
        };
        TickWork { flush, action }
    }

    fn enter_editing(&mut self, now: NaiveDateTime) {
        // a dirty edit not yet written back is newer than the clock
        let seed = self.pending.unwrap_or(now);
        self.edit = Some(EditState {
            candidate: seed,
            field: Field::Hour,
        });
        self.mode = Mode::Editing;
    }

    fn leave_editing(&mut self) {
        if self.mode == Mode::Editing {
            self.pending = self.edit.take().map(|edit| edit.candidate);
        }
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Machine shared between the button handlers and the refresh loop.
pub type SharedMachine = Mutex<CriticalSectionRawMutex, RefCell<ModeMachine>>;

pub const fn shared_machine() -> SharedMachine {
    Mutex::new(RefCell::new(ModeMachine::new()))
}

/// Handler entry point: apply `event` atomically with respect to the loop.
pub fn dispatch(machine: &SharedMachine, event: ButtonEvent, now: NaiveDateTime) -> Mode {
    machine.lock(|m| m.borrow_mut().handle(event, now))
}

/// Loop entry point: take this iteration's work atomically.
pub fn take_tick(machine: &SharedMachine) -> TickWork {
    machine.lock(|m| m.borrow_mut().take_tick())
}
