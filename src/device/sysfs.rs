// sysfs device backend
//
// Motors live under <root>/tacho-motor or <root>/dc-motor, sensors under
// <root>/lego-sensor, port muxes under <root>/lego-port. Each device is a
// directory of text attributes; writing `command` starts or stops a motor.
// Devices are matched to logical ports through their `address` attribute
// (e.g. "ev3-ports:outA" or "ev3-ports:in2:i2c1").

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, warn};

use super::registry::DeviceBackend;
use super::{Actor, MotorState, Sensor, StopAction};
use crate::config::{
    ActorConfig, ActorKind, Mounting, OUTPUT_PORTS, PORT_SETTLE, SYSFS_ROOT, SensorKind,
};
use crate::error::{HalError, Result};

const TACHO_CLASS: &str = "tacho-motor";
const DC_CLASS: &str = "dc-motor";
const SENSOR_CLASS: &str = "lego-sensor";
const PORT_CLASS: &str = "lego-port";

fn attr_error(path: PathBuf, e: std::io::Error) -> HalError {
    HalError::Attribute {
        path,
        reason: e.to_string(),
    }
}

fn read_attr(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    match fs::read_to_string(&path) {
        Ok(raw) => Ok(raw.trim().to_string()),
        Err(e) => Err(attr_error(path, e)),
    }
}

fn read_int<T: std::str::FromStr>(dir: &Path, name: &str) -> Result<T> {
    let raw = read_attr(dir, name)?;
    raw.parse().map_err(|_| HalError::Attribute {
        path: dir.join(name),
        reason: format!("not a number: {:?}", raw),
    })
}

fn write_attr(dir: &Path, name: &str, value: impl ToString) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, value.to_string()).map_err(|e| attr_error(path, e))
}

/// True if one `:`-separated segment of the address names the port
fn matches_port(address: &str, port: &str) -> bool {
    address.split(':').any(|segment| segment == port)
}

/// Backend reading the device driver attribute tree
#[derive(Debug, Clone)]
pub struct SysfsBackend {
    root: PathBuf,
}

impl Default for SysfsBackend {
    fn default() -> Self {
        Self::new(SYSFS_ROOT)
    }
}

impl SysfsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory of the `class` device sitting on `port`
    fn find(&self, class: &'static str, port: &str) -> Result<PathBuf> {
        let not_found = || HalError::DeviceNotFound {
            port: port.to_string(),
            class,
        };

        let entries = fs::read_dir(self.root.join(class)).map_err(|_| not_found())?;
        for entry in entries.flatten() {
            let dir = entry.path();
            match read_attr(&dir, "address") {
                Ok(address) if matches_port(&address, port) => return Ok(dir),
                _ => continue,
            }
        }
        Err(not_found())
    }

    fn expect_driver(dir: &Path, port: &str, expected: &'static str) -> Result<()> {
        let found = read_attr(dir, "driver_name")?;
        if found != expected {
            return Err(HalError::WrongDevice {
                port: port.to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }

    fn open_tacho(&self, port: &str, driver: &'static str) -> Result<SysfsMotor> {
        let dir = self.find(TACHO_CLASS, port)?;
        Self::expect_driver(&dir, port, driver)?;
        Ok(SysfsMotor {
            port: port.to_string(),
            max_speed: read_int(&dir, "max_speed")?,
            count_per_rot: read_int(&dir, "count_per_rot")?,
            tacho: true,
            dir,
        })
    }

    fn open_dc(&self, port: &str) -> Result<SysfsMotor> {
        let mux = self.find(PORT_CLASS, port)?;
        write_attr(&mux, "mode", "dc-motor")?;
        thread::sleep(PORT_SETTLE);

        let dir = self.find(DC_CLASS, port)?;
        Ok(SysfsMotor {
            port: port.to_string(),
            max_speed: 100,
            count_per_rot: 0,
            tacho: false,
            dir,
        })
    }

    fn select_port_device(&self, port: &str, device: &str) -> Result<()> {
        let mux = self.find(PORT_CLASS, port)?;
        write_attr(&mux, "set_device", device)
    }
}

impl DeviceBackend for SysfsBackend {
    fn open_actor(&self, port: &str, config: &ActorConfig) -> Result<Box<dyn Actor>> {
        let motor = match config.kind {
            ActorKind::Large => self.open_tacho(port, "lego-ev3-l-motor")?,
            ActorKind::Medium => self.open_tacho(port, "lego-ev3-m-motor")?,
            ActorKind::Other => self.open_dc(port)?,
        };

        let polarity = match config.direction {
            Mounting::Forward => "normal",
            Mounting::Backward => "inversed",
        };
        write_attr(&motor.dir, "polarity", polarity)?;
        Ok(Box::new(motor))
    }

    fn open_sensor(&self, port: &str, kind: SensorKind) -> Result<Box<dyn Sensor>> {
        match kind {
            SensorKind::Light => self.select_port_device(port, "lego-nxt-light")?,
            SensorKind::Sound => self.select_port_device(port, "lego-nxt-sound")?,
            _ => {}
        }

        let dir = self.find(SENSOR_CLASS, port)?;
        match kind {
            SensorKind::Compass => Self::expect_driver(&dir, port, "ht-nxt-compass")?,
            SensorKind::IrSeeker => Self::expect_driver(&dir, port, "ht-nxt-ir-seek-v2")?,
            SensorKind::HtColor => Self::expect_driver(&dir, port, "ht-nxt-color-v2")?,
            _ => {}
        }

        Ok(Box::new(SysfsSensor {
            port: port.to_string(),
            dir,
        }))
    }

    fn stop_all_motors(&self) -> Result<()> {
        for class in [TACHO_CLASS, DC_CLASS] {
            let Ok(entries) = fs::read_dir(self.root.join(class)) else {
                continue;
            };
            for entry in entries.flatten() {
                if let Err(e) = write_attr(&entry.path(), "command", "stop") {
                    warn!("Failed to stop {}: {}", entry.path().display(), e);
                }
            }
        }
        Ok(())
    }

    fn reset_outputs(&self) -> Result<()> {
        for port in OUTPUT_PORTS {
            match self.find(PORT_CLASS, port) {
                Ok(mux) => write_attr(&mux, "mode", "auto")?,
                Err(_) => debug!("no lego-port for {}", port),
            }
        }
        Ok(())
    }
}

/// Tacho or plain DC motor backed by attribute files
pub struct SysfsMotor {
    port: String,
    dir: PathBuf,
    max_speed: i32,
    count_per_rot: i32,
    tacho: bool,
}

impl SysfsMotor {
    fn command(&self, command: &str) -> Result<()> {
        write_attr(&self.dir, "command", command)
    }

    fn require_tacho(&self, what: &'static str) -> Result<()> {
        if self.tacho {
            Ok(())
        } else {
            Err(HalError::NotSupported(what))
        }
    }
}

impl Actor for SysfsMotor {
    fn port(&self) -> &str {
        &self.port
    }

    fn max_speed(&self) -> i32 {
        self.max_speed
    }

    fn count_per_rot(&self) -> i32 {
        self.count_per_rot
    }

    fn position(&mut self) -> Result<i32> {
        self.require_tacho("position on dc motor")?;
        read_int(&self.dir, "position")
    }

    fn set_position(&mut self, ticks: i32) -> Result<()> {
        self.require_tacho("position on dc motor")?;
        write_attr(&self.dir, "position", ticks)
    }

    fn state(&mut self) -> Result<MotorState> {
        Ok(MotorState::from_flags(&read_attr(&self.dir, "state")?))
    }

    fn speed(&mut self) -> Result<i32> {
        self.require_tacho("speed on dc motor")?;
        read_int(&self.dir, "speed")
    }

    fn duty_cycle(&mut self) -> Result<i32> {
        read_int(&self.dir, "duty_cycle")
    }

    fn set_stop_action(&mut self, action: StopAction) -> Result<()> {
        write_attr(&self.dir, "stop_action", action.as_str())
    }

    fn run_forever(&mut self, speed_sp: i32) -> Result<()> {
        self.require_tacho("run-forever on dc motor")?;
        write_attr(&self.dir, "speed_sp", speed_sp)?;
        self.command("run-forever")
    }

    fn run_to_rel_pos(&mut self, position_sp: i32, speed_sp: i32) -> Result<()> {
        self.require_tacho("run-to-rel-pos on dc motor")?;
        write_attr(&self.dir, "position_sp", position_sp)?;
        write_attr(&self.dir, "speed_sp", speed_sp)?;
        self.command("run-to-rel-pos")
    }

    fn run_direct(&mut self, duty_cycle_sp: i32) -> Result<()> {
        write_attr(&self.dir, "duty_cycle_sp", duty_cycle_sp)?;
        self.command("run-direct")
    }

    fn set_duty_cycle(&mut self, duty_cycle_sp: i32) -> Result<()> {
        write_attr(&self.dir, "duty_cycle_sp", duty_cycle_sp)
    }

    fn stop(&mut self) -> Result<()> {
        self.command("stop")
    }
}

/// Sensor backed by attribute files
pub struct SysfsSensor {
    port: String,
    dir: PathBuf,
}

impl Sensor for SysfsSensor {
    fn port(&self) -> &str {
        &self.port
    }

    fn mode(&mut self) -> Result<String> {
        read_attr(&self.dir, "mode")
    }

    fn set_mode(&mut self, mode: &str) -> Result<()> {
        write_attr(&self.dir, "mode", mode)
    }

    fn decimals(&mut self) -> Result<u32> {
        read_int(&self.dir, "decimals")
    }

    fn num_values(&mut self) -> Result<usize> {
        read_int(&self.dir, "num_values")
    }

    fn value(&mut self, index: usize) -> Result<i32> {
        read_int(&self.dir, &format!("value{}", index))
    }

    fn set_command(&mut self, command: &str) -> Result<()> {
        write_attr(&self.dir, "command", command)
    }
}
