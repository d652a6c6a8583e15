// In-memory devices for unit tests

use std::collections::HashMap;

use super::{Actor, MotorState, Sensor, StopAction};
use crate::error::{HalError, Result};

/// Commands an actor received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    StopAction(StopAction),
    RunForever(i32),
    RunToRelPos { position_sp: i32, speed_sp: i32 },
    RunDirect(i32),
    DutyCycle(i32),
    Stop,
    SetPosition(i32),
}

/// Motor that finishes relative moves after a fixed number of state polls
/// and advances its encoder while running open loop.
pub struct MockActor {
    pub port: String,
    pub max_speed: i32,
    pub count_per_rot: i32,
    pub position: i32,
    pub speed: i32,
    pub duty: i32,
    pub commands: Vec<Cmd>,
    pub state_polls: usize,
    /// Polls a relative move stays busy for
    pub busy_for: usize,
    /// Encoder ticks gained per position poll in open loop
    pub ticks_per_poll: i32,
    /// Report stalled instead of busy
    pub stalls: bool,
    /// Jammed: every state poll reports stalled
    pub stalled: bool,
    busy_left: usize,
    pending: i32,
}

impl MockActor {
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            max_speed: 1050,
            count_per_rot: 360,
            position: 0,
            speed: 0,
            duty: 0,
            commands: Vec::new(),
            state_polls: 0,
            busy_for: 3,
            ticks_per_poll: 10,
            stalls: false,
            stalled: false,
            busy_left: 0,
            pending: 0,
        }
    }

    /// Last relative move target, if any
    pub fn rel_target(&self) -> Option<(i32, i32)> {
        self.commands.iter().rev().find_map(|c| match c {
            Cmd::RunToRelPos {
                position_sp,
                speed_sp,
            } => Some((*position_sp, *speed_sp)),
            _ => None,
        })
    }

    pub fn stopped(&self) -> bool {
        self.commands.contains(&Cmd::Stop)
    }
}

impl Actor for MockActor {
    fn port(&self) -> &str {
        &self.port
    }

    fn max_speed(&self) -> i32 {
        self.max_speed
    }

    fn count_per_rot(&self) -> i32 {
        self.count_per_rot
    }

    fn position(&mut self) -> Result<i32> {
        if self.duty != 0 {
            self.position += self.duty.signum() * self.ticks_per_poll;
        }
        Ok(self.position)
    }

    fn set_position(&mut self, ticks: i32) -> Result<()> {
        self.commands.push(Cmd::SetPosition(ticks));
        self.position = ticks;
        Ok(())
    }

    fn state(&mut self) -> Result<MotorState> {
        self.state_polls += 1;
        if self.stalled {
            return Ok(MotorState::Stalled);
        }
        if self.busy_left == 0 {
            return Ok(MotorState::Idle);
        }
        if self.stalls {
            return Ok(MotorState::Stalled);
        }
        self.busy_left -= 1;
        if self.busy_left == 0 {
            self.position += self.pending;
            self.pending = 0;
        }
        Ok(MotorState::Busy)
    }

    fn speed(&mut self) -> Result<i32> {
        Ok(self.speed)
    }

    fn duty_cycle(&mut self) -> Result<i32> {
        Ok(self.duty)
    }

    fn set_stop_action(&mut self, action: StopAction) -> Result<()> {
        self.commands.push(Cmd::StopAction(action));
        Ok(())
    }

    fn run_forever(&mut self, speed_sp: i32) -> Result<()> {
        self.commands.push(Cmd::RunForever(speed_sp));
        self.speed = speed_sp;
        Ok(())
    }

    fn run_to_rel_pos(&mut self, position_sp: i32, speed_sp: i32) -> Result<()> {
        self.commands.push(Cmd::RunToRelPos {
            position_sp,
            speed_sp,
        });
        // A zero-speed or zero-distance move never starts
        if speed_sp != 0 && position_sp != 0 {
            self.busy_left = self.busy_for;
            self.pending = position_sp;
        }
        Ok(())
    }

    fn run_direct(&mut self, duty_cycle_sp: i32) -> Result<()> {
        self.commands.push(Cmd::RunDirect(duty_cycle_sp));
        self.duty = duty_cycle_sp;
        Ok(())
    }

    fn set_duty_cycle(&mut self, duty_cycle_sp: i32) -> Result<()> {
        self.commands.push(Cmd::DutyCycle(duty_cycle_sp));
        self.duty = duty_cycle_sp;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.commands.push(Cmd::Stop);
        self.duty = 0;
        self.speed = 0;
        self.busy_left = 0;
        Ok(())
    }
}

/// Sensor with per-mode raw values and a mode-switch counter
pub struct MockSensor {
    pub port: String,
    pub mode: String,
    pub decimals: u32,
    pub values: HashMap<String, Vec<i32>>,
    pub mode_switches: Vec<String>,
    pub commands: Vec<String>,
}

impl MockSensor {
    pub fn new(port: &str, mode: &str) -> Self {
        Self {
            port: port.to_string(),
            mode: mode.to_string(),
            decimals: 0,
            values: HashMap::new(),
            mode_switches: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn with_values(mut self, mode: &str, values: &[i32]) -> Self {
        self.values.insert(mode.to_string(), values.to_vec());
        self
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }
}

impl Sensor for MockSensor {
    fn port(&self) -> &str {
        &self.port
    }

    fn mode(&mut self) -> Result<String> {
        Ok(self.mode.clone())
    }

    fn set_mode(&mut self, mode: &str) -> Result<()> {
        self.mode_switches.push(mode.to_string());
        self.mode = mode.to_string();
        Ok(())
    }

    fn decimals(&mut self) -> Result<u32> {
        Ok(self.decimals)
    }

    fn num_values(&mut self) -> Result<usize> {
        Ok(self.values.get(&self.mode).map_or(0, Vec::len))
    }

    fn value(&mut self, index: usize) -> Result<i32> {
        self.values
            .get(&self.mode)
            .and_then(|v| v.get(index))
            .copied()
            .ok_or(HalError::NotSupported("value index"))
    }

    fn set_command(&mut self, command: &str) -> Result<()> {
        self.commands.push(command.to_string());
        Ok(())
    }
}
