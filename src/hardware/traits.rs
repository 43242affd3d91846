use chrono::NaiveDateTime;

use crate::machine::Mode;
use crate::view::View;

/// Wall-clock time keeper the machine reads from and writes confirmed edits to.
pub trait ClockSource {
    fn get_time(&self) -> NaiveDateTime;
    fn set_time(&mut self, time: NaiveDateTime);
}

/// Display sink, pulled once per refresh tick.
pub trait Renderer {
    fn render(&mut self, mode: Mode, view: &View);
}
