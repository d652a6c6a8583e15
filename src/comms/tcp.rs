// TCP links for bench setups and network-attached bricks

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::transport::{Link, LinkError, LinkResult, Listener, Peer, Transport};
use crate::config::ACCEPT_POLL;

/// Socket-address transport. Peer names resolve through a fixed table since
/// there is no discovery protocol.
pub struct TcpTransport {
    listen_address: String,
    peers: BTreeMap<String, String>,
}

impl TcpTransport {
    pub fn new(listen_address: impl Into<String>, peers: BTreeMap<String, String>) -> Self {
        Self {
            listen_address: listen_address.into(),
            peers,
        }
    }
}

impl Transport for TcpTransport {
    fn name(&self) -> &'static str {
        "tcp"
    }

    fn is_valid_address(&self, address: &str) -> bool {
        address.parse::<SocketAddr>().is_ok()
    }

    fn discover(&mut self) -> LinkResult<Vec<Peer>> {
        Ok(self
            .peers
            .iter()
            .map(|(name, address)| Peer {
                name: name.clone(),
                address: address.clone(),
            })
            .collect())
    }

    fn connect(&mut self, address: &str, timeout: Duration) -> LinkResult<Box<dyn Link>> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| LinkError::Unsupported("address is not a socket address"))?;
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        Ok(Box::new(TcpLink::new(stream, timeout)?))
    }

    fn make_discoverable(&mut self) -> LinkResult<()> {
        debug!("tcp endpoints are always reachable");
        Ok(())
    }

    fn bind(&mut self, backlog: u32, timeout: Duration) -> LinkResult<Box<dyn Listener>> {
        // std picks its own backlog; one pending peer is all the manager takes
        let listener = TcpListener::bind(&self.listen_address)?;
        listener.set_nonblocking(true)?;
        info!("listening on {} (backlog {})", self.listen_address, backlog);
        Ok(Box::new(TcpAcceptor { listener, timeout }))
    }
}

struct TcpAcceptor {
    listener: TcpListener,
    timeout: Duration,
}

impl Listener for TcpAcceptor {
    fn accept(&mut self) -> LinkResult<Box<dyn Link>> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("accepted {}", peer);
                    stream.set_nonblocking(false)?;
                    return Ok(Box::new(TcpLink::new(stream, self.timeout)?));
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(LinkError::Timeout);
                    }
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

struct TcpLink {
    stream: TcpStream,
}

impl TcpLink {
    fn new(stream: TcpStream, timeout: Duration) -> LinkResult<Self> {
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

impl Link for TcpLink {
    fn send(&mut self, data: &[u8]) -> LinkResult<usize> {
        match self.stream.write(data)? {
            0 if !data.is_empty() => Err(LinkError::Closed),
            n => Ok(n),
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> LinkResult<usize> {
        match self.stream.read(buf)? {
            0 => Err(LinkError::Closed),
            n => Ok(n),
        }
    }
}
