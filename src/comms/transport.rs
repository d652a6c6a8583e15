// Link technology seam for the channel manager
//
// A transport knows how to validate and discover peer addresses, open an
// outgoing link, and accept incoming ones. Every blocking call is bounded by
// a per-attempt timeout; the manager decides whether to retry.

use std::io;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("timed out")]
    Timeout,

    #[error("Link closed by peer")]
    Closed,

    #[error("Not supported by this transport: {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl LinkError {
    /// Timeouts are retried, every other error is a fault
    pub fn is_timeout(&self) -> bool {
        matches!(self, LinkError::Timeout)
    }
}

impl From<io::Error> for LinkError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => LinkError::Timeout,
            // some stacks only report the timeout in the message
            _ if e.to_string() == "timed out" => LinkError::Timeout,
            _ => LinkError::Io(e),
        }
    }
}

pub type LinkResult<T> = std::result::Result<T, LinkError>;

/// A reachable device found by discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub name: String,
    pub address: String,
}

/// An established point-to-point byte link
pub trait Link: Send {
    /// Write a prefix of `data` and return its length. A timeout means
    /// nothing was written, so the caller resumes from the returned offset.
    fn send(&mut self, data: &[u8]) -> LinkResult<usize>;

    /// Read up to `buf.len()` bytes; `Ok(0)` never happens, a closed link
    /// is `LinkError::Closed`
    fn recv(&mut self, buf: &mut [u8]) -> LinkResult<usize>;
}

/// Server endpoint created by `Transport::bind`
pub trait Listener: Send {
    /// Wait at most one timeout period for a peer
    fn accept(&mut self) -> LinkResult<Box<dyn Link>>;
}

pub trait Transport: Send {
    fn name(&self) -> &'static str;

    /// Whether `address` is already in canonical form
    fn is_valid_address(&self, address: &str) -> bool;

    /// Peers currently visible, with their human-readable names
    fn discover(&mut self) -> LinkResult<Vec<Peer>>;

    /// One connection attempt to a canonical address
    fn connect(&mut self, address: &str, timeout: Duration) -> LinkResult<Box<dyn Link>>;

    /// Let peers find this device without a time limit
    fn make_discoverable(&mut self) -> LinkResult<()>;

    fn bind(&mut self, backlog: u32, timeout: Duration) -> LinkResult<Box<dyn Listener>>;
}
