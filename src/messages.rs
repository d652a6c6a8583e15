// Remote command protocol: JSON commands in, JSON replies out

use serde::{Deserialize, Serialize};

use crate::hal::{Reading, SensorQuery};
use crate::motor::{Direction, RotateUnit, StopMode, TachoMode, Turn};

// Command from a remote controller -> brick.
// Drive commands act on the configured drive wheels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Drive {
        #[serde(default)]
        direction: Direction,
        speed: f64,
    },
    DriveDistance {
        #[serde(default)]
        direction: Direction,
        speed: f64,
        distance: f64,
    },
    Rotate {
        turn: Turn,
        speed: f64,
    },
    RotateAngle {
        turn: Turn,
        speed: f64,
        angle: f64,
    },
    Curve {
        #[serde(default)]
        direction: Direction,
        left_speed: f64,
        right_speed: f64,
        #[serde(default)]
        distance: Option<f64>,
    },
    /// Let both drive wheels coast to a halt
    Stop,
    Motor {
        port: String,
        speed: f64,
    },
    RotateMotor {
        port: String,
        speed: f64,
        unit: RotateUnit,
        value: f64,
    },
    StopMotor {
        port: String,
        #[serde(default)]
        mode: StopMode,
    },
    /// Change the speed of a motor that is already running
    SetMotorSpeed {
        port: String,
        speed: f64,
    },
    MotorSpeed {
        port: String,
    },
    Read {
        port: String,
        query: SensorQuery,
    },
    Tacho {
        port: String,
        mode: TachoMode,
    },
    ResetTacho {
        port: String,
    },
    ResetGyro {
        port: String,
    },
    /// HiTechnic colour sensor mains filter, 50 or 60 Hz
    SetMainsFrequency {
        port: String,
        hz: u32,
    },
    /// Milliseconds on a program timer
    Timer {
        id: u32,
    },
    ResetTimer {
        id: u32,
    },
}

// Reply brick -> remote controller, one per command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Ok,
    /// The stop signal ended a blocking maneuver early
    Cancelled,
    Value { value: Reading },
    /// Addressed device is not plugged in
    Absent,
    Error { message: String },
}

impl Reply {
    pub fn error(e: impl std::fmt::Display) -> Self {
        Reply::Error {
            message: e.to_string(),
        }
    }
}
