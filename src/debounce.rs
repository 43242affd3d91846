//! Edge debounce filter for mechanical push buttons.
//!
//! The filter works on edges, not on sampled levels: each raw transition that
//! matches the configured polarity is offered to [`Debouncer::accept`], which
//! lets it through only when the re-arm interval has passed since the last
//! reported press. Bounces that arrive inside the window are dropped.

/// Direction of a raw transition on the input line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Falling,
    Rising,
}

pub struct Debouncer {
    polarity: Edge,
    rearm_ms: u64,
    last_event: Option<u64>,
}

impl Debouncer {
    pub const fn new(polarity: Edge, rearm_ms: u64) -> Self {
        Self {
            polarity,
            rearm_ms,
            last_event: None,
        }
    }

    /// Buttons wired to ground with a pull-up report presses on the falling edge.
    pub const fn active_low(rearm_ms: u64) -> Self {
        Self::new(Edge::Falling, rearm_ms)
    }

    /// Offer a raw transition seen at `now_ms`. Returns `true` when it counts
    /// as a new press.
    pub fn accept(&mut self, edge: Edge, now_ms: u64) -> bool {
        if edge != self.polarity {
            return false;
        }

        let rearmed = match self.last_event {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.rearm_ms,
        };

        if rearmed {
            self.last_event = Some(now_ms);
        }
        rearmed
    }

    pub fn rearm_ms(&self) -> u64 {
        self.rearm_ms
    }
}
