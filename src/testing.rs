//! Host-side stand-ins for the board peripherals.

use chrono::{NaiveDate, NaiveDateTime};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

use crate::hardware::traits::{ClockSource, Renderer};
use crate::machine::Mode;
use crate::view::View;

const FAKE_CAPACITY: usize = 4096;
const FAKE_PAGE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusPhase {
    Write { device: u8, bytes: Vec<u8> },
    Read { device: u8, len: usize },
}

/// 24C32 model: 2-byte address pointer, page-wrapping writes, sequential reads.
pub struct FakeEeprom {
    memory: Vec<u8>,
    pointer: usize,
    phases: Vec<BusPhase>,
    failures: Vec<ErrorKind>,
}

impl FakeEeprom {
    pub fn new() -> Self {
        Self {
            memory: vec![0xFF; FAKE_CAPACITY],
            pointer: 0,
            phases: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Queue a failure for an upcoming transaction; queued failures are used in order.
    pub fn fail_next(&mut self, kind: ErrorKind) {
        self.failures.insert(0, kind);
    }

    pub fn phases(&self) -> &[BusPhase] {
        &self.phases
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }
}

impl ErrorType for FakeEeprom {
    type Error = ErrorKind;
}

impl I2c for FakeEeprom {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if let Some(kind) = self.failures.pop() {
            return Err(kind);
        }

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.phases.push(BusPhase::Write {
                        device: address,
                        bytes: bytes.to_vec(),
                    });
                    if bytes.len() < 2 {
                        return Err(ErrorKind::Other);
                    }
                    self.pointer = usize::from(u16::from_be_bytes([bytes[0], bytes[1]])) % FAKE_CAPACITY;
                    for &b in &bytes[2..] {
                        self.memory[self.pointer] = b;
                        let base = self.pointer - self.pointer % FAKE_PAGE;
                        self.pointer = base + (self.pointer + 1) % FAKE_PAGE;
                    }
                }
                Operation::Read(buf) => {
                    self.phases.push(BusPhase::Read {
                        device: address,
                        len: buf.len(),
                    });
                    for b in buf.iter_mut() {
                        *b = self.memory[self.pointer];
                        self.pointer = (self.pointer + 1) % FAKE_CAPACITY;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Delay that returns immediately and adds up what was asked for.
#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u32,
}

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms;
    }
}

/// Clock frozen at whatever it was last set to.
pub struct ManualClock {
    pub now: NaiveDateTime,
    pub sets: Vec<NaiveDateTime>,
}

impl ManualClock {
    pub fn at(h: u32, m: u32, s: u32) -> Self {
        Self {
            now: hms(h, m, s),
            sets: Vec::new(),
        }
    }
}

impl ClockSource for ManualClock {
    fn get_time(&self) -> NaiveDateTime {
        self.now
    }

    fn set_time(&mut self, time: NaiveDateTime) {
        self.now = time;
        self.sets.push(time);
    }
}

/// Keeps every frame it was asked to draw.
#[derive(Default)]
pub struct RecordingRenderer {
    pub frames: Vec<(Mode, View)>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, mode: Mode, view: &View) {
        self.frames.push((mode, view.clone()));
    }
}

pub fn hms(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}
