// Semantic mappings applied on top of scaled sensor values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named colour categories reported by color sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colour {
    None,
    Black,
    Blue,
    Green,
    Yellow,
    Red,
    White,
    Brown,
}

impl Colour {
    /// EV3 color sensor code 0..=7, anything else is `None`
    pub fn from_ev3_code(code: i64) -> Self {
        match code {
            1 => Colour::Black,
            2 => Colour::Blue,
            3 => Colour::Green,
            4 => Colour::Yellow,
            5 => Colour::Red,
            6 => Colour::White,
            7 => Colour::Brown,
            _ => Colour::None,
        }
    }

    /// HiTechnic color number 0..=17, anything else is `None`
    pub fn from_hitechnic_id(id: i64) -> Self {
        match id {
            0 => Colour::Black,
            1 | 7..=10 => Colour::Red,
            2 | 3 => Colour::Blue,
            4 => Colour::Green,
            5 | 6 => Colour::Yellow,
            11..=17 => Colour::White,
            _ => Colour::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Colour::None => "none",
            Colour::Black => "black",
            Colour::Blue => "blue",
            Colour::Green => "green",
            Colour::Yellow => "yellow",
            Colour::Red => "red",
            Colour::White => "white",
            Colour::Brown => "brown",
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Heading in degrees -> signed angle in (-180, 180], clockwise negative
pub fn compass_angle(heading: f64) -> f64 {
    -((heading + 180.0).rem_euclid(360.0) - 180.0)
}

/// IR seeker zone 1..=9 -> direction in degrees (120 left .. -120 right).
/// Zone 0 means no beacon seen.
pub fn seeker_direction(zone: f64) -> f64 {
    if zone == 0.0 {
        f64::NAN
    } else {
        (zone - 5.0) * -30.0
    }
}

/// Sound pressure reading (100 silent, 0 loud) -> level (0 silent, 100 loud)
pub fn sound_level(db: f64) -> f64 {
    ((100.0 - db) * 100.0).round() / 100.0
}

/// HiTechnic passive reading -> ambient light percent
pub fn ht_ambient(raw: i32) -> f64 {
    (raw.abs() as f64 / 380.0).min(100.0)
}

/// HiTechnic normalized white channel -> light percent
pub fn ht_light(norm: &[f64]) -> Option<f64> {
    norm.get(3).map(|white| white / 2.55)
}

/// HiTechnic normalized channels without the leading white channel
pub fn ht_rgb(norm: &[f64]) -> Vec<f64> {
    norm.iter().skip(1).copied().collect()
}
