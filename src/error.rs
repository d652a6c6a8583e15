// Error types for the brick HAL
//
// Device absence and I/O timeouts never show up here: absence is an empty
// registry slot and timeouts are retried inside the comms loops.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad attribute {path}: {reason}")]
    Attribute { path: PathBuf, reason: String },

    #[error("No {class} device found on port {port}")]
    DeviceNotFound { port: String, class: &'static str },

    #[error("Port {port} has driver {found}, expected {expected}")]
    WrongDevice {
        port: String,
        expected: &'static str,
        found: String,
    },

    #[error("Incorrect mode: {0}")]
    InvalidMode(String),

    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Target out of range: {0}")]
    OutOfRange(String),

    #[error("Left and right wheel both use port {0}")]
    SamePort(String),
}

pub type Result<T> = std::result::Result<T, HalError>;
