//! What the display should show for the current mode, and the text lines
//! that make up each screen.

use core::fmt::Write;

use chrono::{NaiveDateTime, Timelike};
use heapless::String;

use crate::logbook::LogRecord;
use crate::machine::Field;

/// Widest line any screen produces
pub const LINE_WIDTH: usize = 16;

pub type Line = String<LINE_WIDTH>;

/// Data handed to the renderer on each refresh tick.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum View {
    /// Live clock reading
    Clock(NaiveDateTimeFmt),
    /// Candidate time being edited, with the selected field
    Editing {
        candidate: NaiveDateTimeFmt,
        field: Field,
    },
    /// Last two saved times
    History {
        latest: LogRecord,
        previous: LogRecord,
    },
}

impl View {
    pub fn clock(time: NaiveDateTime) -> Self {
        View::Clock(NaiveDateTimeFmt(time))
    }

    pub fn editing(candidate: NaiveDateTime, field: Field) -> Self {
        View::Editing {
            candidate: NaiveDateTimeFmt(candidate),
            field,
        }
    }

    pub fn screen(&self) -> Screen {
        match self {
            View::Clock(time) => Screen {
                title: "Current Time",
                lines: [time_line(&time.0, None), hint_line(), Line::new()],
            },
            View::Editing { candidate, field } => Screen {
                title: "Set Time",
                lines: [time_line(&candidate.0, Some(*field)), hint_line(), Line::new()],
            },
            View::History { latest, previous } => Screen {
                title: "Previous Times:",
                lines: [
                    hint_line(),
                    text_line(latest.display_text()),
                    text_line(previous.display_text()),
                ],
            },
        }
    }
}

/// `NaiveDateTime` wrapper so views can be logged with defmt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NaiveDateTimeFmt(pub NaiveDateTime);

#[cfg(feature = "defmt")]
impl defmt::Format for NaiveDateTimeFmt {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{=u32:02}:{=u32:02}:{=u32:02}",
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

/// A title and up to three body lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    pub title: &'static str,
    pub lines: [Line; 3],
}

/// `HH:MM:SS`, with the selected field wrapped in `|` while editing.
pub fn time_line(time: &NaiveDateTime, selected: Option<Field>) -> Line {
    let fields = [time.hour(), time.minute(), time.second()];
    let mut line = Line::new();
    for (i, value) in fields.iter().enumerate() {
        if i > 0 {
            let _ = line.push(':');
        }
        let marked = selected.is_some_and(|f| f.index() == i);
        let _ = if marked {
            write!(line, "|{value:02}|")
        } else {
            write!(line, "{value:02}")
        };
    }
    line
}

fn hint_line() -> Line {
    text_line("(HH:MM:SS)")
}

fn text_line(text: &str) -> Line {
    let mut line = Line::new();
    for c in text.chars() {
        if line.push(c).is_err() {
            break;
        }
    }
    line
}
