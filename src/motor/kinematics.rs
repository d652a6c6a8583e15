// Differential-drive kinematics
// Converts logical distances, angles and speed percentages into per-wheel
// encoder tick targets and device speed units.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{HalError, Result};

/// Speed percentages are always limited to this magnitude
pub const MAX_SPEED_PCT: f64 = 100.0;

/// Static robot geometry, millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub wheel_diameter: f64,
    /// Distance between the left and right wheel contact points
    pub track_width: f64,
}

impl Geometry {
    pub fn new(wheel_diameter: f64, track_width: f64) -> Self {
        Self {
            wheel_diameter,
            track_width,
        }
    }

    pub fn wheel_circumference(&self) -> f64 {
        PI * self.wheel_diameter
    }

    /// Wheel revolutions needed to roll `distance` mm
    pub fn rotations(&self, distance: f64) -> f64 {
        distance / self.wheel_circumference()
    }

    /// Arc each wheel travels when the robot spins `angle` degrees in place
    pub fn turn_arc(&self, angle: f64) -> f64 {
        angle * PI * self.track_width / 360.0
    }

    /// Tick target for a straight move of `distance` mm
    pub fn distance_ticks(&self, distance: f64, count_per_rot: i32) -> Result<i32> {
        to_ticks(self.rotations(distance), count_per_rot)
    }

    /// Tick magnitude each wheel needs for an in-place turn of `angle` degrees
    pub fn turn_ticks(&self, angle: f64, count_per_rot: i32) -> Result<i32> {
        to_ticks(self.rotations(self.turn_arc(angle)), count_per_rot)
    }

    /// Distance travelled for a number of wheel revolutions, rounded to whole mm
    pub fn distance_for(&self, rotations: f64) -> f64 {
        (self.wheel_circumference() * rotations).round()
    }
}

/// Limit a speed percentage to [-100, 100]; NaN means stopped
pub fn clamp_pct(pct: f64) -> f64 {
    if pct.is_nan() {
        0.0
    } else {
        pct.clamp(-MAX_SPEED_PCT, MAX_SPEED_PCT)
    }
}

/// Percent of a motor's own max speed, in device units
pub fn scale_speed(pct: f64, max_speed: i32) -> i32 {
    (clamp_pct(pct) * max_speed as f64 / MAX_SPEED_PCT) as i32
}

/// Duty cycle for open-loop control
pub fn duty_cycle(pct: f64) -> i32 {
    clamp_pct(pct) as i32
}

/// Wheel revolutions to encoder ticks, rounded to the nearest tick.
/// Targets the encoder cannot represent are rejected.
pub fn to_ticks(rotations: f64, count_per_rot: i32) -> Result<i32> {
    let ticks = (rotations * count_per_rot as f64).round();
    if !ticks.is_finite() || ticks < i32::MIN as f64 || ticks > i32::MAX as f64 {
        return Err(HalError::OutOfRange(format!(
            "{} rotations at {} counts per rotation",
            rotations, count_per_rot
        )));
    }
    Ok(ticks as i32)
}

/// Split a curve's travel distance between the wheels in proportion to their
/// speeds. The mean speed travels exactly `distance`, so when both wheels run
/// backwards the signs cancel and the curve still goes the commanded way.
/// A zero mean speed yields no travel at all.
pub fn curve_split(left_pct: f64, right_pct: f64, distance: f64) -> (f64, f64) {
    let left = clamp_pct(left_pct);
    let right = clamp_pct(right_pct);
    let mean = (left + right) / 2.0;
    if mean == 0.0 {
        return (0.0, 0.0);
    }
    let scale = distance / mean;
    (left * scale, right * scale)
}
