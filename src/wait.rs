// Cooperative waiting
//
// Every blocking HAL call is a polling loop over externally observable
// state. The loop yields between iterations and re-checks the shared stop
// signal each time, so a supervisor can abort within one polling interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::error::Result;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    raised: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every running wait loop to give up
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Re-arm for the next program
    pub fn clear(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// How a wait loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    Cancelled,
}

impl WaitOutcome {
    pub fn is_completed(self) -> bool {
        self == WaitOutcome::Completed
    }
}

/// Polls a completion predicate until it holds or the stop signal is raised.
#[derive(Debug, Clone)]
pub struct Waiter {
    stop: StopSignal,
    pause: Option<Duration>,
}

impl Waiter {
    /// Busy-loop with a yield point between polls
    pub fn new(stop: StopSignal) -> Self {
        Self { stop, pause: None }
    }

    /// Poll at a bounded interval instead of yielding
    pub fn with_pause(stop: StopSignal, pause: Duration) -> Self {
        Self {
            stop,
            pause: Some(pause),
        }
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Wait until `done` returns true. Errors from the predicate end the wait.
    pub fn until<F>(&self, mut done: F) -> Result<WaitOutcome>
    where
        F: FnMut() -> Result<bool>,
    {
        loop {
            if done()? {
                return Ok(WaitOutcome::Completed);
            }
            if self.stop.is_raised() {
                return Ok(WaitOutcome::Cancelled);
            }
            match self.pause {
                Some(pause) => thread::sleep(pause),
                None => thread::yield_now(),
            }
        }
    }
}
