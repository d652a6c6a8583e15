// RFCOMM links exposed by the OS as serial ttys (/dev/rfcommN)
//
// Pairing and binding the tty happen outside this process; here a link is
// just an open serial port with a short read timeout.

use serialport::{SerialPort, SerialPortType};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, info};

use super::transport::{Link, LinkError, LinkResult, Listener, Peer, Transport};

/// Line rate for RFCOMM ttys; the radio ignores it but the tty layer wants one
pub const DEFAULT_BAUDRATE: u32 = 115_200;

pub struct SerialTransport {
    baudrate: u32,
}

impl SerialTransport {
    pub fn new() -> Self {
        Self::with_baudrate(DEFAULT_BAUDRATE)
    }

    pub fn with_baudrate(baudrate: u32) -> Self {
        Self { baudrate }
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable name of a port: USB product string when there is one
fn display_name(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(usb) => usb
            .product
            .clone()
            .unwrap_or_else(|| port.port_name.clone()),
        _ => port.port_name.clone(),
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn is_valid_address(&self, address: &str) -> bool {
        address.starts_with("/dev/")
    }

    fn discover(&mut self) -> LinkResult<Vec<Peer>> {
        let ports = serialport::available_ports()?;
        debug!("found {} serial ports", ports.len());
        Ok(ports
            .iter()
            .map(|p| Peer {
                name: display_name(p),
                address: p.port_name.clone(),
            })
            .collect())
    }

    fn connect(&mut self, address: &str, timeout: Duration) -> LinkResult<Box<dyn Link>> {
        let port = serialport::new(address, self.baudrate)
            .timeout(timeout)
            .open()?;
        info!("opened {} at {} baud", address, self.baudrate);
        Ok(Box::new(SerialLink { port }))
    }

    fn make_discoverable(&mut self) -> LinkResult<()> {
        Err(LinkError::Unsupported(
            "visibility is managed by the bluetooth daemon",
        ))
    }

    fn bind(&mut self, _backlog: u32, _timeout: Duration) -> LinkResult<Box<dyn Listener>> {
        Err(LinkError::Unsupported("serial ttys cannot accept connections"))
    }
}

struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl Link for SerialLink {
    fn send(&mut self, data: &[u8]) -> LinkResult<usize> {
        let n = self.port.write(data)?;
        if n == 0 && !data.is_empty() {
            return Err(LinkError::Closed);
        }
        // Bytes are queued in the tty; a slow drain must not trigger a resend
        if let Err(e) = self.port.flush().map_err(LinkError::from) {
            if !e.is_timeout() {
                return Err(e);
            }
        }
        Ok(n)
    }

    fn recv(&mut self, buf: &mut [u8]) -> LinkResult<usize> {
        match self.port.read(buf)? {
            0 => Err(LinkError::Closed),
            n => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_paths_are_canonical() {
        let t = SerialTransport::new();
        assert!(t.is_valid_address("/dev/rfcomm0"));
        assert!(!t.is_valid_address("ev3-controller"));
    }

    #[test]
    fn test_server_side_unsupported() {
        let mut t = SerialTransport::default();
        assert!(matches!(
            t.bind(1, Duration::from_millis(10)).err(),
            Some(LinkError::Unsupported(_))
        ));
        assert!(!t.make_discoverable().unwrap_err().is_timeout());
    }

    #[test]
    fn test_missing_device_is_a_fault() {
        let mut t = SerialTransport::new();
        let err = t
            .connect("/dev/does-not-exist-rfcomm9", Duration::from_millis(10))
            .err()
            .unwrap();
        assert!(!err.is_timeout());
    }
}
