// Hardware abstraction layer for a two-wheeled brick robot
//
// Layers, leaves first: device handles and their registry, the scaled-value
// sensor accessor, the differential-drive motion engine, the channel manager
// for remote links, and the port-keyed `Hal` facade tying them together.

pub mod comms;
pub mod config;
pub mod device;
pub mod error;
pub mod hal;
pub mod messages;
pub mod motor;
pub mod runtime;
pub mod sensor;
pub mod teleop;
pub mod wait;

pub use error::{HalError, Result};
pub use hal::Hal;
pub use wait::{StopSignal, WaitOutcome};
