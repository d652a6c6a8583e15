// Drive and single-motor operations keyed by port

use tracing::info;

use super::Hal;
use crate::error::Result;
use crate::motor::single::{self, RotateUnit, StopMode, TachoMode};
use crate::motor::{Direction, Turn, actuation};
use crate::wait::WaitOutcome;

fn absent_pair(left: &str, right: &str) {
    info!("drive skipped: no motor pair on [{}]/[{}]", left, right);
}

fn absent_motor(port: &str) {
    info!("no motor on port [{}]", port);
}

impl Hal {
    /// Both wheels at a shared speed until told otherwise
    pub fn regulated_drive(
        &mut self,
        left: &str,
        right: &str,
        direction: Direction,
        speed_pct: f64,
    ) -> Result<Option<WaitOutcome>> {
        let Some((l, r)) = self.registry.actor_pair(left, right)? else {
            absent_pair(left, right);
            return Ok(None);
        };
        let act = actuation(l.regulated && r.regulated);
        self.engine
            .regulated_drive(act, l.handle.as_mut(), r.handle.as_mut(), direction, speed_pct)?;
        Ok(Some(WaitOutcome::Completed))
    }

    pub fn drive_distance(
        &mut self,
        left: &str,
        right: &str,
        direction: Direction,
        speed_pct: f64,
        distance: f64,
    ) -> Result<Option<WaitOutcome>> {
        let Some((l, r)) = self.registry.actor_pair(left, right)? else {
            absent_pair(left, right);
            return Ok(None);
        };
        let act = actuation(l.regulated && r.regulated);
        self.engine
            .drive_distance(
                act,
                l.handle.as_mut(),
                r.handle.as_mut(),
                direction,
                speed_pct,
                distance,
            )
            .map(Some)
    }

    pub fn rotate_in_place(
        &mut self,
        left: &str,
        right: &str,
        speed_pct: f64,
        angle: f64,
        turn: Turn,
    ) -> Result<Option<WaitOutcome>> {
        let Some((l, r)) = self.registry.actor_pair(left, right)? else {
            absent_pair(left, right);
            return Ok(None);
        };
        let act = actuation(l.regulated && r.regulated);
        self.engine
            .rotate_in_place(act, l.handle.as_mut(), r.handle.as_mut(), speed_pct, angle, turn)
            .map(Some)
    }

    pub fn rotate_continuous(
        &mut self,
        left: &str,
        right: &str,
        speed_pct: f64,
        turn: Turn,
    ) -> Result<Option<WaitOutcome>> {
        let Some((l, r)) = self.registry.actor_pair(left, right)? else {
            absent_pair(left, right);
            return Ok(None);
        };
        let act = actuation(l.regulated && r.regulated);
        self.engine
            .rotate_continuous(act, l.handle.as_mut(), r.handle.as_mut(), speed_pct, turn)?;
        Ok(Some(WaitOutcome::Completed))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn drive_curve(
        &mut self,
        left: &str,
        right: &str,
        direction: Direction,
        left_pct: f64,
        right_pct: f64,
        distance: Option<f64>,
    ) -> Result<Option<WaitOutcome>> {
        let Some((l, r)) = self.registry.actor_pair(left, right)? else {
            absent_pair(left, right);
            return Ok(None);
        };
        let act = actuation(l.regulated && r.regulated);
        self.engine
            .drive_curve(
                act,
                l.handle.as_mut(),
                r.handle.as_mut(),
                direction,
                left_pct,
                right_pct,
                distance,
            )
            .map(Some)
    }

    /// Turn one motor by degrees or rotations and wait for it
    pub fn rotate_motor(
        &mut self,
        port: &str,
        speed_pct: f64,
        unit: RotateUnit,
        value: f64,
    ) -> Result<Option<WaitOutcome>> {
        let Some(m) = self.registry.actor(port) else {
            absent_motor(port);
            return Ok(None);
        };
        let act = actuation(m.regulated);
        single::rotate_motor(
            act,
            m.handle.as_mut(),
            speed_pct,
            unit,
            value,
            self.engine.waiter(),
        )
        .map(Some)
    }

    pub fn turn_on_motor(&mut self, port: &str, speed_pct: f64) -> Result<Option<WaitOutcome>> {
        let Some(m) = self.registry.actor(port) else {
            absent_motor(port);
            return Ok(None);
        };
        actuation(m.regulated).run(m.handle.as_mut(), speed_pct)?;
        Ok(Some(WaitOutcome::Completed))
    }

    pub fn set_motor_speed(&mut self, port: &str, speed_pct: f64) -> Result<Option<WaitOutcome>> {
        let Some(m) = self.registry.actor(port) else {
            absent_motor(port);
            return Ok(None);
        };
        actuation(m.regulated).set_speed(m.handle.as_mut(), speed_pct)?;
        Ok(Some(WaitOutcome::Completed))
    }

    /// Percent of max speed for regulated motors, duty cycle otherwise
    pub fn motor_speed(&mut self, port: &str) -> Result<Option<f64>> {
        let Some(m) = self.registry.actor(port) else {
            absent_motor(port);
            return Ok(None);
        };
        actuation(m.regulated).read_speed(m.handle.as_mut()).map(Some)
    }

    pub fn stop_motor(&mut self, port: &str, mode: StopMode) -> Result<Option<WaitOutcome>> {
        let Some(m) = self.registry.actor(port) else {
            absent_motor(port);
            return Ok(None);
        };
        single::stop_motor(m.handle.as_mut(), mode)?;
        Ok(Some(WaitOutcome::Completed))
    }

    /// Let both wheels coast to a halt; a missing one is skipped
    pub fn stop_motors(&mut self, left: &str, right: &str) -> Result<Option<WaitOutcome>> {
        let l = self.stop_motor(left, StopMode::Float)?;
        let r = self.stop_motor(right, StopMode::Float)?;
        Ok(l.or(r))
    }

    pub fn reset_motor_tacho(&mut self, port: &str) -> Result<Option<WaitOutcome>> {
        let Some(m) = self.registry.actor(port) else {
            absent_motor(port);
            return Ok(None);
        };
        single::reset_tacho(m.handle.as_mut())?;
        Ok(Some(WaitOutcome::Completed))
    }

    pub fn motor_tacho_value(&mut self, port: &str, mode: TachoMode) -> Result<Option<f64>> {
        let Some(m) = self.registry.actor(port) else {
            absent_motor(port);
            return Ok(None);
        };
        single::tacho_value(m.handle.as_mut(), self.engine.geometry(), mode).map(Some)
    }
}
