// Scripted transport for channel manager tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::transport::{Link, LinkError, LinkResult, Listener, Peer, Transport};

/// What one link does on each call, consumed front to back.
/// An exhausted script times out forever.
#[derive(Default)]
pub struct LinkScript {
    pub incoming: VecDeque<LinkResult<Vec<u8>>>,
    /// `Ok(n)` accepts at most n bytes of the write
    pub send_results: VecDeque<LinkResult<usize>>,
    pub sent: Vec<Vec<u8>>,
    pub recv_calls: usize,
    pub send_calls: usize,
}

#[derive(Default)]
pub struct Script {
    pub peers: Vec<Peer>,
    pub connect_results: VecDeque<LinkResult<()>>,
    pub accept_results: VecDeque<LinkResult<()>>,
    pub bind_error: Option<LinkError>,
    pub connect_attempts: Vec<String>,
    pub discover_calls: usize,
    pub discoverable_calls: usize,
    pub bind_calls: usize,
    /// Link scripts handed out in order to each new link
    pub link_scripts: VecDeque<Arc<Mutex<LinkScript>>>,
}

/// Cloneable handle: tests keep one copy, the manager owns the other
#[derive(Clone, Default)]
pub struct MockTransport {
    pub script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a link for the next successful connect/accept and return its script
    pub fn add_link(&self) -> Arc<Mutex<LinkScript>> {
        let link = Arc::new(Mutex::new(LinkScript::default()));
        self.script.lock().unwrap().link_scripts.push_back(link.clone());
        link
    }

    fn next_link(&self) -> Box<dyn Link> {
        let script = self
            .script
            .lock()
            .unwrap()
            .link_scripts
            .pop_front()
            .unwrap_or_default();
        Box::new(MockLink { script })
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    // Canonical addresses look like bluetooth MACs
    fn is_valid_address(&self, address: &str) -> bool {
        address.split(':').count() == 6
    }

    fn discover(&mut self) -> LinkResult<Vec<Peer>> {
        let mut script = self.script.lock().unwrap();
        script.discover_calls += 1;
        Ok(script.peers.clone())
    }

    fn connect(&mut self, address: &str, _timeout: Duration) -> LinkResult<Box<dyn Link>> {
        let result = {
            let mut script = self.script.lock().unwrap();
            script.connect_attempts.push(address.to_string());
            script
                .connect_results
                .pop_front()
                .unwrap_or(Err(LinkError::Timeout))
        };
        result.map(|()| self.next_link())
    }

    fn make_discoverable(&mut self) -> LinkResult<()> {
        self.script.lock().unwrap().discoverable_calls += 1;
        Ok(())
    }

    fn bind(&mut self, _backlog: u32, _timeout: Duration) -> LinkResult<Box<dyn Listener>> {
        let mut script = self.script.lock().unwrap();
        script.bind_calls += 1;
        if let Some(e) = script.bind_error.take() {
            return Err(e);
        }
        Ok(Box::new(MockListener {
            transport: self.clone(),
        }))
    }
}

struct MockListener {
    transport: MockTransport,
}

impl Listener for MockListener {
    fn accept(&mut self) -> LinkResult<Box<dyn Link>> {
        let result = self
            .transport
            .script
            .lock()
            .unwrap()
            .accept_results
            .pop_front()
            .unwrap_or(Err(LinkError::Timeout));
        result.map(|()| self.transport.next_link())
    }
}

struct MockLink {
    script: Arc<Mutex<LinkScript>>,
}

impl Link for MockLink {
    fn send(&mut self, data: &[u8]) -> LinkResult<usize> {
        let mut script = self.script.lock().unwrap();
        script.send_calls += 1;
        let n = script
            .send_results
            .pop_front()
            .unwrap_or(Ok(data.len()))?
            .min(data.len());
        script.sent.push(data[..n].to_vec());
        Ok(n)
    }

    fn recv(&mut self, buf: &mut [u8]) -> LinkResult<usize> {
        let mut script = self.script.lock().unwrap();
        script.recv_calls += 1;
        let data = script
            .incoming
            .pop_front()
            .unwrap_or(Err(LinkError::Timeout))?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}
