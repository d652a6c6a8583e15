// Port-keyed device registry
//
// Filled once at startup from the brick configuration. A port whose device
// cannot be opened keeps an empty slot: that is logged, never an error, and
// every later operation on the port becomes a no-op.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{Actor, Sensor};
use crate::config::{ActorConfig, BrickConfig, SensorKind};
use crate::error::{HalError, Result};

/// Opens devices for the registry
pub trait DeviceBackend: Send {
    fn open_actor(&self, port: &str, config: &ActorConfig) -> Result<Box<dyn Actor>>;

    fn open_sensor(&self, port: &str, kind: SensorKind) -> Result<Box<dyn Sensor>>;

    /// Stop every motor the backend can see, configured or not
    fn stop_all_motors(&self) -> Result<()> {
        Ok(())
    }

    /// Return output ports to automatic device detection
    fn reset_outputs(&self) -> Result<()> {
        Ok(())
    }
}

/// A present motor plus how it is driven
pub struct RegisteredActor {
    pub handle: Box<dyn Actor>,
    pub regulated: bool,
}

#[derive(Default)]
pub struct DeviceRegistry {
    actors: BTreeMap<String, Option<RegisteredActor>>,
    sensors: BTreeMap<String, Option<Box<dyn Sensor>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every configured device, leaving empty slots for missing ones
    pub fn from_config(config: &BrickConfig, backend: &dyn DeviceBackend) -> Self {
        let mut registry = Self::new();

        for (port, actor) in &config.actors {
            match backend.open_actor(port, actor) {
                Ok(handle) => {
                    debug!("{:?} motor ready on port [{}]", actor.kind, port);
                    registry.insert_actor(port, handle, actor.regulated);
                }
                Err(e) => {
                    info!("no {:?} motor connected to port [{}]: {}", actor.kind, port, e);
                    registry.actors.insert(port.clone(), None);
                }
            }
        }

        for (port, &kind) in &config.sensors {
            match backend.open_sensor(port, kind) {
                Ok(handle) => {
                    debug!("{:?} sensor ready on port [{}]", kind, port);
                    registry.insert_sensor(port, handle);
                }
                Err(e) => {
                    info!("no {:?} sensor connected to port [{}]: {}", kind, port, e);
                    registry.sensors.insert(port.clone(), None);
                }
            }
        }

        registry
    }

    pub fn insert_actor(&mut self, port: &str, handle: Box<dyn Actor>, regulated: bool) {
        self.actors
            .insert(port.to_string(), Some(RegisteredActor { handle, regulated }));
    }

    pub fn insert_sensor(&mut self, port: &str, handle: Box<dyn Sensor>) {
        self.sensors.insert(port.to_string(), Some(handle));
    }

    pub fn actor(&mut self, port: &str) -> Option<&mut RegisteredActor> {
        self.actors.get_mut(port).and_then(Option::as_mut)
    }

    pub fn sensor(&mut self, port: &str) -> Option<&mut (dyn Sensor + 'static)> {
        self.sensors
            .get_mut(port)
            .and_then(Option::as_mut)
            .map(|s| &mut **s)
    }

    /// Both drive wheels at once, `None` if either is absent
    pub fn actor_pair(
        &mut self,
        left: &str,
        right: &str,
    ) -> Result<Option<(&mut RegisteredActor, &mut RegisteredActor)>> {
        if left == right {
            return Err(HalError::SamePort(left.to_string()));
        }

        let mut l = None;
        let mut r = None;
        for (port, slot) in self.actors.iter_mut() {
            if port == left {
                l = slot.as_mut();
            } else if port == right {
                r = slot.as_mut();
            }
        }
        Ok(l.zip(r))
    }

    /// Ports whose device was configured but not found
    pub fn absent_ports(&self) -> Vec<&str> {
        let actors = self.actors.iter().filter(|(_, s)| s.is_none());
        let sensors = self.sensors.iter().filter(|(_, s)| s.is_none());
        actors
            .map(|(p, _)| p.as_str())
            .chain(sensors.map(|(p, _)| p.as_str()))
            .collect()
    }
}
