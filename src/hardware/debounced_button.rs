use embassy_stm32::exti::ExtiInput;
use embassy_time::Instant;

use crate::debounce::{Debouncer, Edge};

/// Active-low push button on an EXTI line, filtered by a [`Debouncer`].
pub struct DebouncedButton<'d> {
    pin: ExtiInput<'d>,
    filter: Debouncer,
}

impl<'d> DebouncedButton<'d> {
    pub fn new(pin: ExtiInput<'d>, rearm_ms: u64) -> Self {
        Self {
            pin,
            filter: Debouncer::active_low(rearm_ms),
        }
    }

    /// Wait for the next press that survives the filter.
    pub async fn pressed(&mut self) {
        loop {
            self.pin.wait_for_falling_edge().await;
            if self.filter.accept(Edge::Falling, Instant::now().as_millis()) {
                return;
            }
        }
    }
}
