// Timeouts, sysfs paths, brick configuration
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::motor::Geometry;

// Per-attempt timeout on every blocking channel call. Short so that a raised
// stop signal is noticed quickly; not a protocol retry interval.
pub const IO_TIMEOUT: Duration = Duration::from_millis(500);

// Bytes requested per receive
pub const RECV_CHUNK: usize = 128;

// Pending connections queued by the server endpoint
pub const LISTEN_BACKLOG: u32 = 1;

// Accept loop pause while the non-blocking listener has nothing queued
pub const ACCEPT_POLL: Duration = Duration::from_millis(10);

// Device driver attribute tree
pub const SYSFS_ROOT: &str = "/sys/class";

// New lego-port attributes need time before their permissions are usable
pub const PORT_SETTLE: Duration = Duration::from_millis(500);

// Output ports returned to automatic detection on reset
pub const OUTPUT_PORTS: [&str; 4] = ["outA", "outB", "outC", "outD"];

// Default config file for the binary
pub const DEFAULT_CONFIG: &str = "brick.json";

/// Motor family plugged into an output port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Large,
    Medium,
    /// Plain DC consumer driven through a lego-port in dc-motor mode
    Other,
}

/// Mounting direction; `Backward` inverts the motor polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mounting {
    #[default]
    Forward,
    Backward,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    pub kind: ActorKind,
    #[serde(default = "default_regulated")]
    pub regulated: bool,
    #[serde(default)]
    pub direction: Mounting,
}

fn default_regulated() -> bool {
    true
}

/// Sensor family plugged into an input port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Touch,
    Ultrasonic,
    Gyro,
    Color,
    Infrared,
    Light,
    Sound,
    Compass,
    IrSeeker,
    HtColor,
}

/// Which link technology the channel manager uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    #[default]
    Tcp,
    Serial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommsConfig {
    #[serde(default)]
    pub transport: TransportKind,
    /// Local bind address for `listen` (tcp only)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Human-readable peer names resolvable by `connect`
    #[serde(default)]
    pub peers: BTreeMap<String, String>,
}

fn default_listen_address() -> String {
    "0.0.0.0:5555".to_string()
}

impl Default for CommsConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            listen_address: default_listen_address(),
            peers: BTreeMap::new(),
        }
    }
}

/// Ports of the two drive wheels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivePorts {
    pub left: String,
    pub right: String,
}

/// Everything the brick needs at startup. Read once, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrickConfig {
    pub geometry: Geometry,
    pub drive: DrivePorts,
    #[serde(default)]
    pub actors: BTreeMap<String, ActorConfig>,
    #[serde(default)]
    pub sensors: BTreeMap<String, SensorKind>,
    #[serde(default)]
    pub comms: CommsConfig,
}

impl BrickConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
