// Port-keyed facade over the whole brick
//
// Owns the device registry, the motion engine, the channel manager, the
// program timers and the stop signal. Operations name devices by port; an
// absent device turns the operation into a logged no-op reported as `None`.

mod motion;
mod sensors;
mod timers;

pub use sensors::{CompassReading, HtColorReading, Reading, SensorQuery};
pub use timers::Timers;

use tracing::{debug, info};

use crate::comms::{ChannelId, ChannelManager};
use crate::config::BrickConfig;
use crate::device::{DeviceBackend, DeviceRegistry, SysfsBackend};
use crate::error::Result;
use crate::motor::MotionEngine;
use crate::wait::{StopSignal, Waiter};

pub struct Hal {
    config: BrickConfig,
    backend: Box<dyn DeviceBackend>,
    registry: DeviceRegistry,
    engine: MotionEngine,
    comms: ChannelManager,
    timers: Timers,
    stop: StopSignal,
}

impl Hal {
    /// Open every configured device through `backend`
    pub fn new(
        config: BrickConfig,
        backend: Box<dyn DeviceBackend>,
        comms: ChannelManager,
        stop: StopSignal,
    ) -> Self {
        let registry = DeviceRegistry::from_config(&config, backend.as_ref());
        let absent = registry.absent_ports();
        if !absent.is_empty() {
            info!("ports without devices: {:?}", absent);
        }

        let engine = MotionEngine::new(config.geometry, Waiter::new(stop.clone()));
        Self {
            config,
            backend,
            registry,
            engine,
            comms,
            timers: Timers::default(),
            stop,
        }
    }

    /// Real hardware under /sys/class and the configured link transport
    pub fn from_config(config: BrickConfig, stop: StopSignal) -> Self {
        let comms = ChannelManager::from_config(&config.comms, stop.clone());
        Self::new(config, Box::new(SysfsBackend::default()), comms, stop)
    }

    pub fn config(&self) -> &BrickConfig {
        &self.config
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Stop all motors, hand the output ports back to auto-detection, drop
    /// the program timers and re-arm the stop signal for the next program
    pub fn reset_state(&mut self) -> Result<()> {
        debug!("resetting brick state");
        self.backend.stop_all_motors()?;
        self.backend.reset_outputs()?;
        self.timers.clear();
        self.stop.clear();
        Ok(())
    }

    pub fn connect(&mut self, address: &str) -> Option<ChannelId> {
        self.comms.connect(address)
    }

    pub fn listen(&mut self) -> Option<ChannelId> {
        self.comms.listen()
    }

    pub fn receive(&mut self, channel: ChannelId) -> Option<String> {
        self.comms.receive(channel)
    }

    pub fn send(&mut self, channel: ChannelId, text: &str) {
        self.comms.send(channel, text)
    }

    pub fn is_open(&self, channel: ChannelId) -> bool {
        self.comms.is_open(channel)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::Hal;
    use crate::comms::ChannelManager;
    use crate::comms::mock::MockTransport;
    use crate::config::{ActorConfig, BrickConfig, SensorKind};
    use crate::device::mock::{MockActor, MockSensor};
    use crate::device::{Actor, DeviceBackend, Sensor};
    use crate::error::{HalError, Result};
    use crate::wait::StopSignal;

    pub const CONFIG: &str = r#"{
        "geometry": { "wheel_diameter": 56.0, "track_width": 120.0 },
        "drive": { "left": "outB", "right": "outC" },
        "actors": {
            "outA": { "kind": "medium", "regulated": false },
            "outB": { "kind": "large" },
            "outC": { "kind": "large" },
            "outD": { "kind": "large" }
        },
        "sensors": {
            "in1": "touch",
            "in2": "gyro",
            "in3": "color",
            "in4": "ultrasonic",
            "in5": "compass",
            "in6": "ht_color"
        }
    }"#;

    /// Mock devices on every configured port except outD
    pub struct TestBackend {
        pub calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl DeviceBackend for TestBackend {
        fn open_actor(&self, port: &str, _config: &ActorConfig) -> Result<Box<dyn Actor>> {
            if port == "outD" {
                return Err(HalError::DeviceNotFound {
                    port: port.to_string(),
                    class: "tacho-motor",
                });
            }
            Ok(Box::new(MockActor::new(port)))
        }

        fn open_sensor(&self, port: &str, kind: SensorKind) -> Result<Box<dyn Sensor>> {
            let sensor = match kind {
                SensorKind::Touch => MockSensor::new(port, "TOUCH").with_values("TOUCH", &[1]),
                SensorKind::Gyro => MockSensor::new(port, "GYRO-ANG")
                    .with_values("GYRO-ANG", &[-90])
                    .with_values("GYRO-RATE", &[12]),
                SensorKind::Color => MockSensor::new(port, "COL-REFLECT")
                    .with_values("COL-COLOR", &[3])
                    .with_values("COL-REFLECT", &[42])
                    .with_values("RGB-RAW", &[120, 80, 40]),
                SensorKind::Ultrasonic => MockSensor::new(port, "US-DIST-CM")
                    .with_values("US-DIST-CM", &[425])
                    .with_values("US-LISTEN", &[0])
                    .with_decimals(1),
                SensorKind::Compass => {
                    MockSensor::new(port, "COMPASS").with_values("COMPASS", &[300])
                }
                SensorKind::HtColor => MockSensor::new(port, "COLOR")
                    .with_values("COLOR", &[4])
                    .with_values("PASSIVE", &[3800])
                    .with_values("NORM", &[255, 1, 2, 51]),
                _ => {
                    return Err(HalError::DeviceNotFound {
                        port: port.to_string(),
                        class: "lego-sensor",
                    });
                }
            };
            Ok(Box::new(sensor))
        }

        fn stop_all_motors(&self) -> Result<()> {
            self.calls.lock().unwrap().push("stop_all_motors");
            Ok(())
        }

        fn reset_outputs(&self) -> Result<()> {
            self.calls.lock().unwrap().push("reset_outputs");
            Ok(())
        }
    }

    pub fn hal_with(transport: &MockTransport) -> (Hal, Arc<Mutex<Vec<&'static str>>>) {
        let stop = StopSignal::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let backend = TestBackend {
            calls: calls.clone(),
        };
        let comms = ChannelManager::new(Box::new(transport.clone()), stop.clone());
        let config = BrickConfig::from_json(CONFIG).unwrap();
        (Hal::new(config, Box::new(backend), comms, stop), calls)
    }

    pub fn hal() -> Hal {
        hal_with(&MockTransport::new()).0
    }
}
