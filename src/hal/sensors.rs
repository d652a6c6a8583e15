// Sensor queries keyed by port

use serde::{Deserialize, Serialize};
use tracing::info;

use super::Hal;
use crate::error::Result;
use crate::sensor::{
    self, ColorMode, Colour, GyroMode, InfraredMode, IrSeekerMode, LightMode, SoundMode,
    UltrasonicMode,
};

/// Compass output form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompassReading {
    /// Signed angle in (-180, 180]
    Angle,
    /// Raw heading in [0, 360)
    Heading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HtColorReading {
    Colour,
    Ambient,
    Light,
    Rgb,
}

/// One logical measurement: sensor family plus what to read from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sensor", rename_all = "snake_case")]
pub enum SensorQuery {
    Touch,
    Ultrasonic { mode: UltrasonicMode },
    Gyro { mode: GyroMode },
    Color { mode: ColorMode },
    Infrared { mode: InfraredMode },
    Light { mode: LightMode },
    Sound { mode: SoundMode },
    Compass { mode: CompassReading },
    IrSeeker { mode: IrSeekerMode },
    HtColor { mode: HtColorReading },
}

/// Result of a sensor query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Flag(bool),
    Number(f64),
    Values(Vec<f64>),
    Colour(Colour),
}

impl Hal {
    /// Read `query` from the sensor on `port`; `None` if nothing is plugged in
    pub fn query(&mut self, port: &str, query: SensorQuery) -> Result<Option<Reading>> {
        let Some(s) = self.registry.sensor(port) else {
            info!("no sensor on port [{}]", port);
            return Ok(None);
        };

        let reading = match query {
            SensorQuery::Touch => Reading::Flag(sensor::is_pressed(s)?),
            SensorQuery::Ultrasonic {
                mode: UltrasonicMode::Presence,
            } => Reading::Flag(sensor::presence(s)?),
            SensorQuery::Ultrasonic { mode } => Reading::Number(sensor::read(s, mode)?),
            SensorQuery::Gyro { mode } => Reading::Number(sensor::read(s, mode)?),
            SensorQuery::Color {
                mode: ColorMode::Colour,
            } => Reading::Colour(sensor::colour(s)?),
            SensorQuery::Color {
                mode: ColorMode::Rgb,
            } => Reading::Values(sensor::read_all(s, ColorMode::Rgb)?),
            SensorQuery::Color { mode } => Reading::Number(sensor::read(s, mode)?),
            SensorQuery::Infrared {
                mode: InfraredMode::Seek,
            } => Reading::Values(sensor::read_all(s, InfraredMode::Seek)?),
            SensorQuery::Infrared { mode } => Reading::Number(sensor::read(s, mode)?),
            SensorQuery::Light { mode } => Reading::Number(sensor::read(s, mode)?),
            SensorQuery::Sound {
                mode: SoundMode::Db,
            } => Reading::Number(sensor::sound_level(s)?),
            SensorQuery::Sound { mode } => Reading::Number(sensor::read(s, mode)?),
            SensorQuery::Compass {
                mode: CompassReading::Angle,
            } => Reading::Number(sensor::compass_angle(s)?),
            SensorQuery::Compass {
                mode: CompassReading::Heading,
            } => Reading::Number(sensor::compass_heading(s)?),
            SensorQuery::IrSeeker { mode } => Reading::Number(sensor::seeker_direction(s, mode)?),
            SensorQuery::HtColor { mode } => match mode {
                HtColorReading::Colour => Reading::Colour(sensor::ht_colour(s)?),
                HtColorReading::Ambient => Reading::Number(sensor::ht_ambient(s)?),
                HtColorReading::Light => Reading::Number(sensor::ht_light(s)?),
                HtColorReading::Rgb => Reading::Values(sensor::ht_rgb(s)?),
            },
        };
        Ok(Some(reading))
    }

    pub fn reset_gyro(&mut self, port: &str) -> Result<Option<()>> {
        let Some(s) = self.registry.sensor(port) else {
            info!("no gyro on port [{}]", port);
            return Ok(None);
        };
        sensor::reset_gyro(s).map(Some)
    }

    pub fn set_mains_frequency(&mut self, port: &str, hz: u32) -> Result<Option<()>> {
        let Some(s) = self.registry.sensor(port) else {
            info!("no color sensor on port [{}]", port);
            return Ok(None);
        };
        sensor::set_mains_frequency(s, hz).map(Some)
    }
}
