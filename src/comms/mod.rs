// Point-to-point text channels to remote controllers
//
// Channels live in a growable list and are addressed by index. A link that
// faults is replaced by an empty slot; the slot is never removed so indices
// handed out earlier stay valid. Timeouts are absorbed by retrying, but every
// retry loop checks the stop signal first.

#[cfg(test)]
pub(crate) mod mock;
pub mod serial;
pub mod tcp;
pub mod transport;

pub use serial::SerialTransport;
pub use tcp::TcpTransport;
pub use transport::{Link, LinkError, LinkResult, Listener, Peer, Transport};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{CommsConfig, IO_TIMEOUT, LISTEN_BACKLOG, RECV_CHUNK, TransportKind};
use crate::wait::StopSignal;

/// Returned to remote programs when a receive produced nothing
pub const NO_MESSAGE: &str = "NO MESSAGE";

/// Wire rendering of a failed connect or listen
pub const NOT_CONNECTED: i64 = -1;

/// Index into the channel list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub usize);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct ChannelManager {
    transport: Box<dyn Transport>,
    listener: Option<Box<dyn Listener>>,
    discoverable: bool,
    channels: Vec<Option<Box<dyn Link>>>,
    io_timeout: Duration,
    stop: StopSignal,
}

impl ChannelManager {
    pub fn new(transport: Box<dyn Transport>, stop: StopSignal) -> Self {
        Self {
            transport,
            listener: None,
            discoverable: false,
            channels: Vec::new(),
            io_timeout: IO_TIMEOUT,
            stop,
        }
    }

    pub fn from_config(config: &CommsConfig, stop: StopSignal) -> Self {
        let transport: Box<dyn Transport> = match config.transport {
            TransportKind::Tcp => Box::new(TcpTransport::new(
                config.listen_address.clone(),
                config.peers.clone(),
            )),
            TransportKind::Serial => Box::new(SerialTransport::new()),
        };
        info!("comms over {}", transport.name());
        Self::new(transport, stop)
    }

    pub fn with_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Number of slots ever handed out, including faulted ones
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Whether `id` names a live channel
    pub fn is_open(&self, id: ChannelId) -> bool {
        matches!(self.channels.get(id.0), Some(Some(_)))
    }

    fn push(channels: &mut Vec<Option<Box<dyn Link>>>, link: Box<dyn Link>) -> ChannelId {
        channels.push(Some(link));
        ChannelId(channels.len() - 1)
    }

    /// Canonical form of `address`, looking names up through discovery
    fn resolve(&mut self, address: &str) -> Option<String> {
        if self.transport.is_valid_address(address) {
            return Some(address.to_string());
        }

        let peers = match self.transport.discover() {
            Ok(peers) => peers,
            Err(e) => {
                warn!("discovery failed: {}", e);
                return None;
            }
        };
        let found = peers.into_iter().find(|p| p.name == address);
        match found {
            Some(peer) if self.transport.is_valid_address(&peer.address) => {
                debug!("resolved {} to {}", address, peer.address);
                Some(peer.address)
            }
            _ => {
                warn!("no peer named {}", address);
                None
            }
        }
    }

    /// Open a channel to `address`, a canonical address or a discoverable
    /// peer name. Retries on timeout; any other failure gives up.
    pub fn connect(&mut self, address: &str) -> Option<ChannelId> {
        let address = self.resolve(address)?;
        loop {
            if self.stop.is_raised() {
                info!("connect to {} cancelled", address);
                return None;
            }
            match self.transport.connect(&address, self.io_timeout) {
                Ok(link) => {
                    let id = Self::push(&mut self.channels, link);
                    info!("connected to {} on channel {}", address, id);
                    return Some(id);
                }
                Err(e) if e.is_timeout() => continue,
                Err(e) => {
                    error!("connect to {} failed: {}", address, e);
                    return None;
                }
            }
        }
    }

    /// Become discoverable once, create the server endpoint once, then block
    /// until a peer connects
    pub fn listen(&mut self) -> Option<ChannelId> {
        if !self.discoverable {
            match self.transport.make_discoverable() {
                Ok(()) => self.discoverable = true,
                Err(e) => warn!("cannot make device discoverable: {}", e),
            }
        }

        if self.listener.is_none() {
            match self.transport.bind(LISTEN_BACKLOG, self.io_timeout) {
                Ok(listener) => self.listener = Some(listener),
                Err(e) => {
                    error!("cannot create server endpoint: {}", e);
                    return None;
                }
            }
        }
        let listener = self.listener.as_mut()?;

        loop {
            if self.stop.is_raised() {
                info!("listen cancelled");
                return None;
            }
            match listener.accept() {
                Ok(link) => {
                    let id = Self::push(&mut self.channels, link);
                    info!("peer connected on channel {}", id);
                    return Some(id);
                }
                Err(e) if e.is_timeout() => continue,
                Err(e) => {
                    error!("accept failed: {}", e);
                    return None;
                }
            }
        }
    }

    /// Next chunk of text from `id`; `None` when there is no live channel,
    /// the link faulted, or the stop signal was raised
    pub fn receive(&mut self, id: ChannelId) -> Option<String> {
        let slot = self.channels.get_mut(id.0)?;
        let link = slot.as_mut()?;
        let mut buf = [0u8; RECV_CHUNK];

        debug!("reading from channel {}", id);
        loop {
            if self.stop.is_raised() {
                return None;
            }
            match link.recv(&mut buf) {
                Ok(n) => {
                    let message = String::from_utf8_lossy(&buf[..n]).into_owned();
                    debug!("received [{}]", message);
                    return Some(message);
                }
                Err(e) if e.is_timeout() => continue,
                Err(e) => {
                    error!("channel {} faulted on receive: {}", id, e);
                    *slot = None;
                    return None;
                }
            }
        }
    }

    /// Send `text` on `id`; a no-op when the channel is absent or dead
    pub fn send(&mut self, id: ChannelId, text: &str) {
        let Some(slot) = self.channels.get_mut(id.0) else {
            return;
        };
        let Some(link) = slot.as_mut() else {
            return;
        };

        debug!("sending [{}] on channel {}", text, id);
        let bytes = text.as_bytes();
        let mut written = 0;
        while written < bytes.len() {
            if self.stop.is_raised() {
                return;
            }
            match link.send(&bytes[written..]) {
                Ok(0) => {
                    error!("channel {} faulted on send: {}", id, LinkError::Closed);
                    *slot = None;
                    return;
                }
                Ok(n) => written += n,
                Err(e) if e.is_timeout() => continue,
                Err(e) => {
                    error!("channel {} faulted on send: {}", id, e);
                    *slot = None;
                    return;
                }
            }
        }
    }
}

/// Wire rendering of a channel result
pub fn render_channel(id: Option<ChannelId>) -> i64 {
    id.map_or(NOT_CONNECTED, |id| id.0 as i64)
}
