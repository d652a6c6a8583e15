// Scaled-value sensor access
//
// Raw driver values are integers with an implied decimal exponent; every
// reading here is `raw / 10^decimals`. Modes are switched lazily: a switch
// discards in-flight samples on the device, so it is only issued when the
// active mode differs from the requested one.

pub mod derived;
pub mod modes;

pub use derived::Colour;
pub use modes::{
    ColorMode, CompassMode, GyroMode, HtColorMode, InfraredMode, IrSeekerMode, LightMode,
    SensorMode, SoundMode, TouchMode, UltrasonicMode,
};

use tracing::debug;

use crate::device::Sensor;
use crate::error::Result;

/// Switch `sensor` to `mode` unless it is already active
pub fn ensure_mode<M: SensorMode>(sensor: &mut dyn Sensor, mode: M) -> Result<()> {
    let native = mode.native();
    if sensor.mode()? != native {
        debug!("{}: mode -> {}", sensor.port(), native);
        sensor.set_mode(native)?;
    }
    Ok(())
}

fn scale(sensor: &mut dyn Sensor) -> Result<f64> {
    Ok(10f64.powi(sensor.decimals()? as i32))
}

/// First value in `mode`, scaled
pub fn read<M: SensorMode>(sensor: &mut dyn Sensor, mode: M) -> Result<f64> {
    ensure_mode(sensor, mode)?;
    let scale = scale(sensor)?;
    Ok(sensor.value(0)? as f64 / scale)
}

/// Every value the device offers in `mode`, scaled
pub fn read_all<M: SensorMode>(sensor: &mut dyn Sensor, mode: M) -> Result<Vec<f64>> {
    ensure_mode(sensor, mode)?;
    let scale = scale(sensor)?;
    (0..sensor.num_values()?)
        .map(|i| Ok(sensor.value(i)? as f64 / scale))
        .collect()
}

pub fn is_pressed(sensor: &mut dyn Sensor) -> Result<bool> {
    Ok(read(sensor, TouchMode::Touch)? != 0.0)
}

/// Whether another ultrasonic sensor is transmitting nearby
pub fn presence(sensor: &mut dyn Sensor) -> Result<bool> {
    Ok(read(sensor, UltrasonicMode::Presence)? != 0.0)
}

/// Zero the gyro accumulator. The device resets it on a mode change, so the
/// switch is forced even when already in angle mode.
pub fn reset_gyro(sensor: &mut dyn Sensor) -> Result<()> {
    sensor.set_mode(GyroMode::Rate.native())?;
    sensor.set_mode(GyroMode::Angle.native())
}

pub fn colour(sensor: &mut dyn Sensor) -> Result<Colour> {
    let code = read(sensor, ColorMode::Colour)?;
    Ok(Colour::from_ev3_code(code as i64))
}

/// 0 silent, 100 loud
pub fn sound_level(sensor: &mut dyn Sensor) -> Result<f64> {
    Ok(derived::sound_level(read(sensor, SoundMode::Db)?))
}

pub fn compass_heading(sensor: &mut dyn Sensor) -> Result<f64> {
    read(sensor, CompassMode::Compass)
}

pub fn compass_angle(sensor: &mut dyn Sensor) -> Result<f64> {
    Ok(derived::compass_angle(compass_heading(sensor)?))
}

/// Beacon direction in degrees, NaN if none is seen
pub fn seeker_direction(sensor: &mut dyn Sensor, mode: IrSeekerMode) -> Result<f64> {
    Ok(derived::seeker_direction(read(sensor, mode)?))
}

pub fn ht_colour(sensor: &mut dyn Sensor) -> Result<Colour> {
    ensure_mode(sensor, HtColorMode::Colour)?;
    // colour number is an index, never scaled
    Ok(Colour::from_hitechnic_id(sensor.value(0)? as i64))
}

pub fn ht_ambient(sensor: &mut dyn Sensor) -> Result<f64> {
    ensure_mode(sensor, HtColorMode::Passive)?;
    Ok(derived::ht_ambient(sensor.value(0)?))
}

pub fn ht_light(sensor: &mut dyn Sensor) -> Result<f64> {
    let norm = read_all(sensor, HtColorMode::Norm)?;
    Ok(derived::ht_light(&norm).unwrap_or(0.0))
}

pub fn ht_rgb(sensor: &mut dyn Sensor) -> Result<Vec<f64>> {
    Ok(derived::ht_rgb(&read_all(sensor, HtColorMode::Norm)?))
}

/// Tell the HiTechnic sensor the local mains frequency (50 or 60 Hz)
pub fn set_mains_frequency(sensor: &mut dyn Sensor, hz: u32) -> Result<()> {
    sensor.set_command(&hz.to_string())
}
