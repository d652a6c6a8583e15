// Keyboard teleop: W/S drive, A/D rotate, space stop, R/F speed, Q quit
//
// Drives the configured wheels directly through the HAL. Movement keys must
// keep arriving (key repeat) or the wheels are stopped again.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::Result;
use crate::hal::Hal;
use crate::motor::{Direction, Turn};

const SPEEDS: [f64; 3] = [20.0, 50.0, 80.0]; // percent of max speed
const INPUT_TIMEOUT: Duration = Duration::from_millis(600); // stop after this long with no movement key
const POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Drive(Direction),
    Rotate(Turn),
    Stop,
    Faster,
    Slower,
    Quit,
}

pub fn action_for(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('w') | KeyCode::Up => Some(Action::Drive(Direction::Forward)),
        KeyCode::Char('s') | KeyCode::Down => Some(Action::Drive(Direction::Backward)),
        KeyCode::Char('a') | KeyCode::Left => Some(Action::Rotate(Turn::Left)),
        KeyCode::Char('d') | KeyCode::Right => Some(Action::Rotate(Turn::Right)),
        KeyCode::Char(' ') => Some(Action::Stop),
        KeyCode::Char('r') => Some(Action::Faster),
        KeyCode::Char('f') => Some(Action::Slower),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

/// Movement state of a teleop session
#[derive(Debug)]
pub struct Teleop {
    speed_idx: usize,
    moving: bool,
    last_input: Instant,
}

impl Default for Teleop {
    fn default() -> Self {
        Self {
            speed_idx: 0,
            moving: false,
            last_input: Instant::now(),
        }
    }
}

impl Teleop {
    pub fn speed(&self) -> f64 {
        SPEEDS[self.speed_idx]
    }

    /// Apply one key action; returns false once the session should end
    pub fn apply(&mut self, hal: &mut Hal, action: Action) -> Result<bool> {
        let drive = hal.config().drive.clone();
        let (left, right) = (drive.left.as_str(), drive.right.as_str());

        match action {
            Action::Drive(direction) => {
                hal.regulated_drive(left, right, direction, self.speed())?;
                self.moved();
            }
            Action::Rotate(turn) => {
                hal.rotate_continuous(left, right, self.speed(), turn)?;
                self.moved();
            }
            Action::Stop => self.halt(hal)?,
            Action::Faster => {
                self.speed_idx = (self.speed_idx + 1).min(SPEEDS.len() - 1);
                info!("Speed: {}%", self.speed());
            }
            Action::Slower => {
                self.speed_idx = self.speed_idx.saturating_sub(1);
                info!("Speed: {}%", self.speed());
            }
            Action::Quit => {
                self.halt(hal)?;
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Stop the wheels if no movement key arrived for a while
    pub fn watchdog(&mut self, hal: &mut Hal) -> Result<()> {
        if self.moving && self.last_input.elapsed() > INPUT_TIMEOUT {
            self.halt(hal)?;
        }
        Ok(())
    }

    fn moved(&mut self) {
        self.moving = true;
        self.last_input = Instant::now();
    }

    fn halt(&mut self, hal: &mut Hal) -> Result<()> {
        let drive = hal.config().drive.clone();
        hal.stop_motors(&drive.left, &drive.right)?;
        self.moving = false;
        Ok(())
    }
}

/// Run an interactive session in raw terminal mode
pub fn run(hal: &mut Hal) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Controls: W/S=drive, A/D=rotate, SPACE=stop, R/F=speed, Q=quit");
    enable_raw_mode()?;
    let result = run_loop(hal);
    disable_raw_mode()?;
    result
}

fn run_loop(hal: &mut Hal) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut teleop = Teleop::default();
    info!("Speed: {}%", teleop.speed());

    while !hal.stop_signal().is_raised() {
        if event::poll(POLL)? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                if let Some(action) = action_for(code).filter(|_| pressed) {
                    if !teleop.apply(hal, action)? {
                        return Ok(());
                    }
                }
            }
        }
        teleop.watchdog(hal)?;
    }

    warn!("teleop interrupted");
    teleop.halt(hal)?;
    Ok(())
}
