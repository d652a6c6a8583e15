// Program timers: milliseconds since a timer was first read or last reset

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use super::Hal;

#[derive(Debug, Default)]
pub struct Timers {
    started: HashMap<u32, Instant>,
}

impl Timers {
    /// Elapsed ms on timer `id`; the first read starts it and returns 0
    pub fn value(&mut self, id: u32) -> u64 {
        self.value_at(id, Instant::now())
    }

    pub fn reset(&mut self, id: u32) {
        self.started.insert(id, Instant::now());
    }

    pub fn clear(&mut self) {
        self.started.clear();
    }

    fn value_at(&mut self, id: u32, now: Instant) -> u64 {
        match self.started.get(&id) {
            Some(start) => now.saturating_duration_since(*start).as_millis() as u64,
            None => {
                self.started.insert(id, now);
                0
            }
        }
    }
}

impl Hal {
    pub fn timer_value(&mut self, id: u32) -> u64 {
        self.timers.value(id)
    }

    pub fn reset_timer(&mut self, id: u32) {
        debug!("reset timer {}", id);
        self.timers.reset(id)
    }
}
