// Measurement modes per sensor family, mapped to the driver's native ids

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A closed set of modes for one sensor family
pub trait SensorMode: Copy + Debug {
    /// Driver mode id written to / compared with the device
    fn native(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchMode {
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UltrasonicMode {
    /// Distance in cm
    Distance,
    /// Another ultrasonic source is active nearby
    Presence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GyroMode {
    Angle,
    Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Ambient,
    Colour,
    Reflect,
    Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfraredMode {
    Seek,
    Proximity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundMode {
    Db,
    Dba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightMode {
    Reflect,
    Ambient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompassMode {
    Compass,
}

/// HiTechnic IR seeker v2: modulated (AC) or unmodulated (DC) beacons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrSeekerMode {
    Ac,
    Dc,
}

/// HiTechnic color sensor v2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HtColorMode {
    Colour,
    Passive,
    /// Normalized white, red, green, blue
    Norm,
}

impl SensorMode for TouchMode {
    fn native(self) -> &'static str {
        "TOUCH"
    }
}

impl SensorMode for UltrasonicMode {
    fn native(self) -> &'static str {
        match self {
            UltrasonicMode::Distance => "US-DIST-CM",
            UltrasonicMode::Presence => "US-LISTEN",
        }
    }
}

impl SensorMode for GyroMode {
    fn native(self) -> &'static str {
        match self {
            GyroMode::Angle => "GYRO-ANG",
            GyroMode::Rate => "GYRO-RATE",
        }
    }
}

impl SensorMode for ColorMode {
    fn native(self) -> &'static str {
        match self {
            ColorMode::Ambient => "COL-AMBIENT",
            ColorMode::Colour => "COL-COLOR",
            ColorMode::Reflect => "COL-REFLECT",
            ColorMode::Rgb => "RGB-RAW",
        }
    }
}

impl SensorMode for InfraredMode {
    fn native(self) -> &'static str {
        match self {
            InfraredMode::Seek => "IR-SEEK",
            InfraredMode::Proximity => "IR-PROX",
        }
    }
}

impl SensorMode for SoundMode {
    fn native(self) -> &'static str {
        match self {
            SoundMode::Db => "DB",
            SoundMode::Dba => "DBA",
        }
    }
}

impl SensorMode for LightMode {
    fn native(self) -> &'static str {
        match self {
            LightMode::Reflect => "REFLECT",
            LightMode::Ambient => "AMBIENT",
        }
    }
}

impl SensorMode for CompassMode {
    fn native(self) -> &'static str {
        "COMPASS"
    }
}

impl SensorMode for IrSeekerMode {
    fn native(self) -> &'static str {
        match self {
            IrSeekerMode::Ac => "AC",
            IrSeekerMode::Dc => "DC",
        }
    }
}

impl SensorMode for HtColorMode {
    fn native(self) -> &'static str {
        match self {
            HtColorMode::Colour => "COLOR",
            HtColorMode::Passive => "PASSIVE",
            HtColorMode::Norm => "NORM",
        }
    }
}
