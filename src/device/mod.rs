// Device handles for the brick
//
// Provides:
// - `Actor` / `Sensor` traits the core talks to
// - Port-keyed registry where absent hardware is an empty slot
// - sysfs backend that opens real devices

#[cfg(test)]
pub(crate) mod mock;
pub mod registry;
pub mod sysfs;

pub use registry::{DeviceBackend, DeviceRegistry};
pub use sysfs::SysfsBackend;

use crate::error::Result;

/// Motion state reported by a motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Idle,
    Busy,
    /// Jammed; counts as finished for every wait
    Stalled,
}

impl MotorState {
    /// Parse the driver's space separated state flags
    pub fn from_flags(flags: &str) -> Self {
        let mut flags = flags.split_whitespace().peekable();
        if flags.peek().is_none() {
            return MotorState::Idle;
        }
        if flags.any(|f| f == "stalled") {
            MotorState::Stalled
        } else {
            MotorState::Busy
        }
    }

    pub fn is_busy(self) -> bool {
        self == MotorState::Busy
    }
}

/// What a motor does once told to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    Coast,
    Brake,
    Hold,
}

impl StopAction {
    pub fn as_str(self) -> &'static str {
        match self {
            StopAction::Coast => "coast",
            StopAction::Brake => "brake",
            StopAction::Hold => "hold",
        }
    }
}

/// A motor-like output device.
///
/// Speeds are in device-native units; the motion engine does all percent
/// scaling. For relative moves the direction comes from the sign of the
/// position target, the speed is a magnitude.
pub trait Actor: Send {
    fn port(&self) -> &str;

    /// Maximum achievable speed (ticks/s)
    fn max_speed(&self) -> i32;

    /// Encoder ticks per full revolution
    fn count_per_rot(&self) -> i32;

    fn position(&mut self) -> Result<i32>;

    /// Rebase the encoder origin; does not move the motor
    fn set_position(&mut self, ticks: i32) -> Result<()>;

    fn state(&mut self) -> Result<MotorState>;

    /// Current speed (ticks/s)
    fn speed(&mut self) -> Result<i32>;

    /// Current duty cycle (percent)
    fn duty_cycle(&mut self) -> Result<i32>;

    fn set_stop_action(&mut self, action: StopAction) -> Result<()>;

    /// Closed-loop run at `speed_sp` until told otherwise
    fn run_forever(&mut self, speed_sp: i32) -> Result<()>;

    /// Closed-loop run to `position_sp` ticks from the current position
    fn run_to_rel_pos(&mut self, position_sp: i32, speed_sp: i32) -> Result<()>;

    /// Open-loop run at a duty cycle
    fn run_direct(&mut self, duty_cycle_sp: i32) -> Result<()>;

    /// Change the duty cycle of a running open-loop motor
    fn set_duty_cycle(&mut self, duty_cycle_sp: i32) -> Result<()>;

    fn stop(&mut self) -> Result<()>;
}

/// An input device with mutually exclusive measurement modes
pub trait Sensor: Send {
    fn port(&self) -> &str;

    /// Native id of the active mode
    fn mode(&mut self) -> Result<String>;

    /// Switching discards in-flight sampling and needs settling time
    fn set_mode(&mut self, mode: &str) -> Result<()>;

    /// Implied fractional digits of the raw values
    fn decimals(&mut self) -> Result<u32>;

    /// Values readable in the active mode
    fn num_values(&mut self) -> Result<usize>;

    /// Raw integer value of channel `index`
    fn value(&mut self, index: usize) -> Result<i32>;

    fn set_command(&mut self, command: &str) -> Result<()>;
}
