// Differential-drive motion engine
//
// Turns logical commands (drive N mm, turn N degrees, follow a curve) into
// per-wheel targets and supervises completion. How a wheel is actually
// driven is left to an `Actuation` strategy: closed-loop speed setpoints for
// regulated motors, duty cycles with encoder polling for unregulated ones.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::kinematics::{Geometry, clamp_pct, curve_split, duty_cycle, scale_speed, to_ticks};
use crate::device::{Actor, MotorState, StopAction};
use crate::error::{HalError, Result};
use crate::wait::{WaitOutcome, Waiter};

/// Travel direction of a drive command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

/// Which way the robot spins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    Left,
    Right,
}

/// One wheel's share of a bounded maneuver
pub struct WheelMove<'a> {
    pub actor: &'a mut dyn Actor,
    /// Clamped speed percent; only its magnitude matters
    pub speed_pct: f64,
    /// Relative target, its sign gives the direction
    pub ticks: i32,
}

impl WheelMove<'_> {
    /// Zero-speed wheels never report busy, so nobody waits on them
    fn waited(&self) -> bool {
        clamp_pct(self.speed_pct) != 0.0
    }
}

/// Low-level actuation strategy behind the motion primitives
pub trait Actuation: Sync {
    fn name(&self) -> &'static str;

    /// Start an open-ended run at `speed_pct` (signed)
    fn run(&self, actor: &mut dyn Actor, speed_pct: f64) -> Result<()>;

    /// Change the speed of a running motor
    fn set_speed(&self, actor: &mut dyn Actor, speed_pct: f64) -> Result<()> {
        self.run(actor, speed_pct)
    }

    /// Current speed as percent (regulated) or duty cycle (unregulated)
    fn read_speed(&self, actor: &mut dyn Actor) -> Result<f64>;

    /// Start every move and block until all waited wheels are done
    fn run_bounded(&self, moves: &mut [WheelMove<'_>], waiter: &Waiter) -> Result<WaitOutcome>;
}

/// Closed-loop speed setpoints; completion is the motor's busy flag
#[derive(Debug, Clone, Copy, Default)]
pub struct Regulated;

/// Open-loop duty cycles; completion is the encoder crossing its target
#[derive(Debug, Clone, Copy, Default)]
pub struct Unregulated;

/// Strategy for a motor configured as regulated or not
pub fn actuation(regulated: bool) -> &'static dyn Actuation {
    if regulated { &Regulated } else { &Unregulated }
}

fn stop_all(moves: &mut [WheelMove<'_>]) -> Result<()> {
    for m in moves.iter_mut() {
        m.actor.stop()?;
    }
    Ok(())
}

impl Actuation for Regulated {
    fn name(&self) -> &'static str {
        "regulated"
    }

    fn run(&self, actor: &mut dyn Actor, speed_pct: f64) -> Result<()> {
        let speed = scale_speed(speed_pct, actor.max_speed());
        actor.run_forever(speed)
    }

    fn read_speed(&self, actor: &mut dyn Actor) -> Result<f64> {
        let max = actor.max_speed();
        if max == 0 {
            return Ok(0.0);
        }
        Ok(actor.speed()? as f64 * 100.0 / max as f64)
    }

    fn run_bounded(&self, moves: &mut [WheelMove<'_>], waiter: &Waiter) -> Result<WaitOutcome> {
        for m in moves.iter_mut() {
            m.actor.set_stop_action(StopAction::Brake)?;
        }
        for m in moves.iter_mut() {
            let speed = scale_speed(m.speed_pct.abs(), m.actor.max_speed());
            m.actor.run_to_rel_pos(m.ticks, speed)?;
        }

        let outcome = waiter.until(|| {
            for m in moves.iter_mut().filter(|m| m.waited()) {
                if m.actor.state()?.is_busy() {
                    return Ok(false);
                }
            }
            Ok(true)
        })?;

        if outcome == WaitOutcome::Cancelled {
            stop_all(moves)?;
        }
        Ok(outcome)
    }
}

impl Actuation for Unregulated {
    fn name(&self) -> &'static str {
        "unregulated"
    }

    fn run(&self, actor: &mut dyn Actor, speed_pct: f64) -> Result<()> {
        actor.run_direct(duty_cycle(speed_pct))
    }

    fn set_speed(&self, actor: &mut dyn Actor, speed_pct: f64) -> Result<()> {
        actor.set_duty_cycle(duty_cycle(speed_pct))
    }

    fn read_speed(&self, actor: &mut dyn Actor) -> Result<f64> {
        Ok(actor.duty_cycle()? as f64)
    }

    fn run_bounded(&self, moves: &mut [WheelMove<'_>], waiter: &Waiter) -> Result<WaitOutcome> {
        // Absolute encoder threshold per wheel, None once finished
        let mut targets = Vec::with_capacity(moves.len());
        for m in moves.iter_mut() {
            // Nothing to travel: halt whatever the wheel was doing before
            if m.ticks == 0 || !m.waited() {
                m.actor.stop()?;
                targets.push(None);
                continue;
            }
            let position = m.actor.position()?;
            let target = position.checked_add(m.ticks).ok_or_else(|| {
                HalError::OutOfRange(format!(
                    "{} + {} ticks on {}",
                    position,
                    m.ticks,
                    m.actor.port()
                ))
            })?;
            let duty = duty_cycle(m.speed_pct).abs() * m.ticks.signum();
            m.actor.run_direct(duty)?;
            targets.push(Some(target));
        }

        let outcome = waiter.until(|| {
            for (m, slot) in moves.iter_mut().zip(targets.iter_mut()) {
                let Some(target) = *slot else { continue };
                let position = m.actor.position()?;
                let reached = if m.ticks > 0 {
                    position >= target
                } else {
                    position <= target
                };
                if reached || m.actor.state()? == MotorState::Stalled {
                    m.actor.stop()?;
                    *slot = None;
                }
            }
            Ok(targets.iter().all(Option::is_none))
        })?;

        if outcome == WaitOutcome::Cancelled {
            stop_all(moves)?;
        }
        Ok(outcome)
    }
}

/// Kinematic motion primitives for a two-wheeled base
pub struct MotionEngine {
    geometry: Geometry,
    waiter: Waiter,
}

impl MotionEngine {
    pub fn new(geometry: Geometry, waiter: Waiter) -> Self {
        Self { geometry, waiter }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Both wheels at the same percent of their own max speed. Non-blocking.
    pub fn regulated_drive(
        &self,
        actuation: &dyn Actuation,
        left: &mut dyn Actor,
        right: &mut dyn Actor,
        direction: Direction,
        speed_pct: f64,
    ) -> Result<()> {
        let pct = clamp_pct(speed_pct) * direction.sign();
        debug!("drive {:?} at {}% ({})", direction, pct, actuation.name());
        actuation.run(left, pct)?;
        actuation.run(right, pct)
    }

    /// Drive straight for `distance` mm and block until both wheels finish
    pub fn drive_distance(
        &self,
        actuation: &dyn Actuation,
        left: &mut dyn Actor,
        right: &mut dyn Actor,
        direction: Direction,
        speed_pct: f64,
        distance: f64,
    ) -> Result<WaitOutcome> {
        let pct = clamp_pct(speed_pct);
        let rotations = if pct == 0.0 {
            0.0
        } else {
            self.geometry.rotations(distance) * direction.sign()
        };

        let left_ticks = to_ticks(rotations, left.count_per_rot())?;
        let right_ticks = to_ticks(rotations, right.count_per_rot())?;
        info!(
            "driving {} mm {:?} at {}%: ticks left={}, right={}",
            distance, direction, pct, left_ticks, right_ticks
        );

        actuation.run_bounded(
            &mut [
                WheelMove {
                    actor: left,
                    speed_pct: pct,
                    ticks: left_ticks,
                },
                WheelMove {
                    actor: right,
                    speed_pct: pct,
                    ticks: right_ticks,
                },
            ],
            &self.waiter,
        )
    }

    /// Spin in place by `angle` degrees and block until both wheels finish
    pub fn rotate_in_place(
        &self,
        actuation: &dyn Actuation,
        left: &mut dyn Actor,
        right: &mut dyn Actor,
        speed_pct: f64,
        angle: f64,
        turn: Turn,
    ) -> Result<WaitOutcome> {
        let pct = clamp_pct(speed_pct);
        let angle = if pct == 0.0 { 0.0 } else { angle };

        let left_ticks = self.geometry.turn_ticks(angle, left.count_per_rot())?;
        let right_ticks = self.geometry.turn_ticks(angle, right.count_per_rot())?;
        let (left_ticks, right_ticks) = match turn {
            Turn::Left => (-left_ticks, right_ticks),
            Turn::Right => (left_ticks, -right_ticks),
        };
        info!(
            "turning {} deg {:?} at {}%: ticks left={}, right={}",
            angle, turn, pct, left_ticks, right_ticks
        );

        actuation.run_bounded(
            &mut [
                WheelMove {
                    actor: left,
                    speed_pct: pct,
                    ticks: left_ticks,
                },
                WheelMove {
                    actor: right,
                    speed_pct: pct,
                    ticks: right_ticks,
                },
            ],
            &self.waiter,
        )
    }

    /// Open-loop spin: wheels at opposite speeds. Non-blocking.
    pub fn rotate_continuous(
        &self,
        actuation: &dyn Actuation,
        left: &mut dyn Actor,
        right: &mut dyn Actor,
        speed_pct: f64,
        turn: Turn,
    ) -> Result<()> {
        let pct = clamp_pct(speed_pct);
        debug!("rotate {:?} at {}%", turn, pct);
        match turn {
            Turn::Left => {
                actuation.run(right, pct)?;
                actuation.run(left, -pct)
            }
            Turn::Right => {
                actuation.run(left, pct)?;
                actuation.run(right, -pct)
            }
        }
    }

    /// Independent wheel speeds. With a distance the wheels travel in the
    /// ratio of their speeds and the call blocks; without one it returns
    /// immediately and the curve continues until overridden.
    #[allow(clippy::too_many_arguments)]
    pub fn drive_curve(
        &self,
        actuation: &dyn Actuation,
        left: &mut dyn Actor,
        right: &mut dyn Actor,
        direction: Direction,
        left_pct: f64,
        right_pct: f64,
        distance: Option<f64>,
    ) -> Result<WaitOutcome> {
        let left_pct = clamp_pct(left_pct);
        let right_pct = clamp_pct(right_pct);

        let Some(distance) = distance else {
            debug!("curve left={}%, right={}%", left_pct, right_pct);
            actuation.run(left, left_pct * direction.sign())?;
            actuation.run(right, right_pct * direction.sign())?;
            return Ok(WaitOutcome::Completed);
        };

        let (left_mm, right_mm) = curve_split(left_pct, right_pct, distance);
        let sign = direction.sign();
        let left_ticks = to_ticks(self.geometry.rotations(left_mm) * sign, left.count_per_rot())?;
        let right_ticks = to_ticks(self.geometry.rotations(right_mm) * sign, right.count_per_rot())?;
        info!(
            "curve {} mm {:?}: left {}% -> {} ticks, right {}% -> {} ticks",
            distance, direction, left_pct, left_ticks, right_pct, right_ticks
        );

        actuation.run_bounded(
            &mut [
                WheelMove {
                    actor: left,
                    speed_pct: left_pct,
                    ticks: left_ticks,
                },
                WheelMove {
                    actor: right,
                    speed_pct: right_pct,
                    ticks: right_ticks,
                },
            ],
            &self.waiter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::{Cmd, MockActor};
    use crate::wait::StopSignal;

    fn engine() -> MotionEngine {
        MotionEngine::new(Geometry::new(56.0, 120.0), Waiter::new(StopSignal::new()))
    }

    fn wheels() -> (MockActor, MockActor) {
        (MockActor::new("outB"), MockActor::new("outC"))
    }

    #[test]
    fn test_drive_one_revolution() {
        let (mut l, mut r) = wheels();
        let outcome = engine()
            .drive_distance(&Regulated, &mut l, &mut r, Direction::Forward, 50.0, 176.0)
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Completed);
        assert_eq!(l.rel_target(), Some((360, 525)));
        assert_eq!(r.rel_target(), Some((360, 525)));
        assert_eq!(l.commands[0], Cmd::StopAction(StopAction::Brake));
        // waited until the motors went idle again
        assert_eq!(l.position, 360);
        assert_eq!(r.position, 360);
    }

    #[test]
    fn test_drive_backward_negates_targets() {
        let (mut l, mut r) = wheels();
        engine()
            .drive_distance(&Regulated, &mut l, &mut r, Direction::Backward, 50.0, 176.0)
            .unwrap();
        assert_eq!(l.rel_target(), Some((-360, 525)));
        assert_eq!(r.rel_target(), Some((-360, 525)));
    }

    #[test]
    fn test_zero_distance_or_speed_resolves_instantly() {
        let (mut l, mut r) = wheels();
        let e = engine();
        e.drive_distance(&Regulated, &mut l, &mut r, Direction::Forward, 50.0, 0.0)
            .unwrap();
        assert_eq!(l.rel_target(), Some((0, 525)));

        let (mut l, mut r) = wheels();
        let outcome = e
            .drive_distance(&Regulated, &mut l, &mut r, Direction::Forward, 0.0, 500.0)
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Completed);
        assert_eq!(l.rel_target(), Some((0, 0)));
        assert_eq!(l.state_polls, 0);
        assert_eq!(r.state_polls, 0);
    }

    #[test]
    fn test_speed_is_clamped() {
        let e = engine();
        let (mut l1, mut r1) = wheels();
        let (mut l2, mut r2) = wheels();
        e.drive_distance(&Regulated, &mut l1, &mut r1, Direction::Forward, 150.0, 300.0)
            .unwrap();
        e.drive_distance(&Regulated, &mut l2, &mut r2, Direction::Forward, 100.0, 300.0)
            .unwrap();
        assert_eq!(l1.commands, l2.commands);
        assert_eq!(r1.commands, r2.commands);

        let (mut l, mut r) = wheels();
        e.regulated_drive(&Regulated, &mut l, &mut r, Direction::Forward, -250.0)
            .unwrap();
        assert_eq!(l.commands, vec![Cmd::RunForever(-1050)]);
    }

    #[test]
    fn test_rotate_half_turn_left() {
        let (mut l, mut r) = wheels();
        let outcome = engine()
            .rotate_in_place(&Regulated, &mut l, &mut r, 30.0, 180.0, Turn::Left)
            .unwrap();
        assert!(outcome.is_completed());
        assert_eq!(l.rel_target(), Some((-386, 315)));
        assert_eq!(r.rel_target(), Some((386, 315)));
    }

    #[test]
    fn test_rotate_right_mirrors_left() {
        let (mut l, mut r) = wheels();
        engine()
            .rotate_in_place(&Regulated, &mut l, &mut r, 30.0, 90.0, Turn::Right)
            .unwrap();
        let (lt, _) = l.rel_target().unwrap();
        let (rt, _) = r.rel_target().unwrap();
        assert!(lt > 0);
        assert_eq!(lt, -rt);
    }

    #[test]
    fn test_regulated_drive_scales_each_wheel() {
        let (mut l, mut r) = wheels();
        r.max_speed = 1560;
        engine()
            .regulated_drive(&Regulated, &mut l, &mut r, Direction::Backward, 50.0)
            .unwrap();
        assert_eq!(l.commands, vec![Cmd::RunForever(-525)]);
        assert_eq!(r.commands, vec![Cmd::RunForever(-780)]);
    }

    #[test]
    fn test_rotate_continuous_opposite_speeds() {
        let (mut l, mut r) = wheels();
        engine()
            .rotate_continuous(&Regulated, &mut l, &mut r, 40.0, Turn::Left)
            .unwrap();
        assert_eq!(l.commands, vec![Cmd::RunForever(-420)]);
        assert_eq!(r.commands, vec![Cmd::RunForever(420)]);
        assert_eq!(l.state_polls, 0);
    }

    #[test]
    fn test_curve_ticks_follow_speed_ratio() {
        let (mut l, mut r) = wheels();
        engine()
            .drive_curve(&Regulated, &mut l, &mut r, Direction::Forward, 50.0, 25.0, Some(300.0))
            .unwrap();
        let (lt, ls) = l.rel_target().unwrap();
        let (rt, rs) = r.rel_target().unwrap();
        assert!((lt - 2 * rt).abs() <= 1);
        assert_eq!((ls, rs), (525, 262));
    }

    #[test]
    fn test_curve_single_zero_wheel_terminates() {
        let (mut l, mut r) = wheels();
        let outcome = engine()
            .drive_curve(&Regulated, &mut l, &mut r, Direction::Forward, 40.0, 0.0, Some(100.0))
            .unwrap();
        assert!(outcome.is_completed());
        assert_eq!(r.rel_target(), Some((0, 0)));
        assert_eq!(r.state_polls, 0);
        assert!(l.state_polls > 0);
    }

    #[test]
    fn test_curve_without_distance_is_continuous() {
        let (mut l, mut r) = wheels();
        engine()
            .drive_curve(&Regulated, &mut l, &mut r, Direction::Backward, 60.0, 20.0, None)
            .unwrap();
        assert_eq!(l.commands, vec![Cmd::RunForever(-630)]);
        assert_eq!(r.commands, vec![Cmd::RunForever(-210)]);
    }

    #[test]
    fn test_stall_counts_as_completion() {
        let (mut l, mut r) = wheels();
        l.stalls = true;
        let outcome = engine()
            .drive_distance(&Regulated, &mut l, &mut r, Direction::Forward, 50.0, 500.0)
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Completed);
        assert!(!l.stopped());
    }

    #[test]
    fn test_raised_stop_cancels_and_stops_wheels() {
        let stop = StopSignal::new();
        let e = MotionEngine::new(Geometry::new(56.0, 120.0), Waiter::new(stop.clone()));
        let (mut l, mut r) = wheels();
        l.busy_for = usize::MAX;
        stop.raise();

        let outcome = e
            .drive_distance(&Regulated, &mut l, &mut r, Direction::Forward, 50.0, 500.0)
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(l.stopped());
        assert!(r.stopped());
    }

    #[test]
    fn test_unregulated_drive_polls_encoder_and_stops() {
        let (mut l, mut r) = wheels();
        let outcome = engine()
            .drive_distance(&Unregulated, &mut l, &mut r, Direction::Backward, 60.0, 176.0)
            .unwrap();
        assert!(outcome.is_completed());
        assert_eq!(l.commands[0], Cmd::RunDirect(-60));
        assert!(l.stopped());
        assert!(r.stopped());
        assert!(l.position <= -360);
        assert!(r.position <= -360);
    }

    #[test]
    fn test_unregulated_zero_speed_halts_running_wheels() {
        let e = engine();
        let (mut l, mut r) = wheels();
        e.regulated_drive(&Unregulated, &mut l, &mut r, Direction::Forward, 60.0)
            .unwrap();
        assert_eq!(l.duty, 60);

        let outcome = e
            .drive_distance(&Unregulated, &mut l, &mut r, Direction::Forward, 0.0, 500.0)
            .unwrap();
        assert!(outcome.is_completed());
        assert_eq!((l.duty, r.duty), (0, 0));
        assert_eq!(l.commands, vec![Cmd::RunDirect(60), Cmd::Stop]);
        assert_eq!(r.commands, vec![Cmd::RunDirect(60), Cmd::Stop]);
    }

    #[test]
    fn test_unregulated_zero_wheel_of_curve_is_stopped() {
        let e = engine();
        let (mut l, mut r) = wheels();
        e.regulated_drive(&Unregulated, &mut l, &mut r, Direction::Forward, 60.0)
            .unwrap();

        e.drive_curve(&Unregulated, &mut l, &mut r, Direction::Forward, 50.0, 0.0, Some(100.0))
            .unwrap();
        assert_eq!(r.duty, 0);
        assert_eq!(r.commands, vec![Cmd::RunDirect(60), Cmd::Stop]);
        assert!(l.stopped());
    }

    #[test]
    fn test_huge_distance_is_rejected() {
        let (mut l, mut r) = wheels();
        l.position = 1000;
        let result =
            engine().drive_distance(&Unregulated, &mut l, &mut r, Direction::Forward, 50.0, 1.0e12);
        assert!(matches!(result, Err(HalError::OutOfRange(_))));
        assert!(l.commands.is_empty());
    }

    #[test]
    fn test_unregulated_target_overflow_is_an_error() {
        let mut l = MockActor::new("outB");
        l.position = i32::MAX - 5;
        let result = Unregulated.run_bounded(
            &mut [WheelMove {
                actor: &mut l,
                speed_pct: 50.0,
                ticks: 360,
            }],
            engine().waiter(),
        );
        assert!(matches!(result, Err(HalError::OutOfRange(_))));
        assert_eq!(l.duty, 0);
    }

    #[test]
    fn test_curve_backward_speeds_drive_forward() {
        let (mut l, mut r) = wheels();
        engine()
            .drive_curve(&Regulated, &mut l, &mut r, Direction::Forward, -50.0, -25.0, Some(300.0))
            .unwrap();
        let (lt, _) = l.rel_target().unwrap();
        let (rt, _) = r.rel_target().unwrap();
        assert_eq!((lt, rt), (819, 409));
    }

    #[test]
    fn test_unregulated_stall_stops_motor() {
        let (mut l, mut r) = wheels();
        // encoder never moves; stall report ends the move
        l.ticks_per_poll = 0;
        r.ticks_per_poll = 0;
        l.stalled = true;
        r.stalled = true;

        let outcome = engine()
            .drive_distance(&Unregulated, &mut l, &mut r, Direction::Forward, 60.0, 176.0)
            .unwrap();
        assert!(outcome.is_completed());
        assert!(l.stopped());
        assert!(r.stopped());
    }
}
