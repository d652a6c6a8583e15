// Single-motor operations: bounded rotations, speed control, stop and
// encoder readouts for one actor at a time.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::driver::{Actuation, WheelMove};
use super::kinematics::{Geometry, clamp_pct, to_ticks};
use crate::device::{Actor, StopAction};
use crate::error::{HalError, Result};
use crate::wait::{WaitOutcome, Waiter};

/// Unit of a bounded single-motor rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateUnit {
    Degree,
    Rotations,
}

/// How a motor behaves after `stop_motor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    /// Let it coast
    #[default]
    Float,
    /// Brake to a halt
    #[serde(rename = "nonfloat")]
    NonFloat,
}

/// Encoder readout unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum TachoMode {
    Degree,
    Rotation,
    Distance,
}

impl FromStr for TachoMode {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "degree" => Ok(TachoMode::Degree),
            "rotation" => Ok(TachoMode::Rotation),
            "distance" => Ok(TachoMode::Distance),
            other => Err(HalError::InvalidMode(format!(
                "incorrect MotorTachoMode: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for TachoMode {
    type Error = HalError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Rotate one motor by `value` degrees or rotations and wait for it.
/// A negative speed or a negative value reverses the direction.
pub fn rotate_motor(
    actuation: &dyn Actuation,
    actor: &mut dyn Actor,
    speed_pct: f64,
    unit: RotateUnit,
    value: f64,
    waiter: &Waiter,
) -> Result<WaitOutcome> {
    let pct = clamp_pct(speed_pct);
    let rotations = match unit {
        RotateUnit::Degree => value / 360.0,
        RotateUnit::Rotations => value,
    };
    let direction = if pct < 0.0 { -1.0 } else { 1.0 };
    let ticks = to_ticks(rotations * direction, actor.count_per_rot())?;

    actuation.run_bounded(
        &mut [WheelMove {
            actor,
            speed_pct: pct,
            ticks,
        }],
        waiter,
    )
}

pub fn stop_motor(actor: &mut dyn Actor, mode: StopMode) -> Result<()> {
    let action = match mode {
        StopMode::Float => StopAction::Coast,
        StopMode::NonFloat => StopAction::Brake,
    };
    actor.set_stop_action(action)?;
    actor.stop()
}

/// Move the encoder origin to the current position
pub fn reset_tacho(actor: &mut dyn Actor) -> Result<()> {
    actor.set_position(0)
}

pub fn tacho_value(actor: &mut dyn Actor, geometry: &Geometry, mode: TachoMode) -> Result<f64> {
    let count = actor.position()? as f64;
    let per_rot = actor.count_per_rot() as f64;
    if per_rot == 0.0 {
        return Err(HalError::NotSupported("tacho readout without encoder"));
    }

    let rotations = count / per_rot;
    Ok(match mode {
        TachoMode::Degree => count * 360.0 / per_rot,
        TachoMode::Rotation => rotations,
        TachoMode::Distance => geometry.distance_for(rotations),
    })
}
