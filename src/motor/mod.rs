// Motor control for the two-wheeled base
//
// Provides:
// - Differential-drive kinematics (distance/angle -> wheel ticks)
// - Motion engine with regulated and unregulated actuation strategies
// - Single-motor rotations, speed control and encoder readouts

mod driver;
pub mod kinematics;
pub mod single;

pub use driver::{
    Actuation, Direction, MotionEngine, Regulated, Turn, Unregulated, WheelMove, actuation,
};
pub use kinematics::{Geometry, clamp_pct, scale_speed};
pub use single::{RotateUnit, StopMode, TachoMode};
