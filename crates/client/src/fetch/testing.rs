//! In-memory transport for exercising the fetch pipeline without sockets.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Cursor, Read, Write};
use std::rc::Rc;

use go2web_core::Error;

use super::transport::{BoxedIoStream, Transport};

/// One recorded `Transport::connect` call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Connect {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

struct MockStream {
    input: Cursor<Vec<u8>>,
    requests: Rc<RefCell<Vec<String>>>,
    index: usize,
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut requests = self.requests.borrow_mut();
        requests[self.index].push_str(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Transport replaying canned responses in order.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: RefCell<VecDeque<Vec<u8>>>,
    pub connects: RefCell<Vec<Connect>>,
    pub requests: Rc<RefCell<Vec<String>>>,
}

impl MockTransport {
    pub fn new(responses: &[&str]) -> Self {
        let responses: Vec<&[u8]> = responses.iter().map(|r| r.as_bytes()).collect();
        Self::from_bytes(&responses)
    }

    pub fn from_bytes(responses: &[&[u8]]) -> Self {
        let transport = Self::default();
        transport.responses.borrow_mut().extend(responses.iter().map(|r| r.to_vec()));
        transport
    }

    pub fn connect_count(&self) -> usize {
        self.connects.borrow().len()
    }
}

impl Transport for &MockTransport {
    fn connect(&self, host: &str, port: u16, secure: bool) -> Result<BoxedIoStream, Error> {
        self.connects.borrow_mut().push(Connect { host: host.to_string(), port, secure });
        let input = self
            .responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Transport(format!("connection refused: {host}:{port}")))?;

        let index = {
            let mut requests = self.requests.borrow_mut();
            requests.push(String::new());
            requests.len() - 1
        };

        Ok(Box::new(MockStream { input: Cursor::new(input), requests: Rc::clone(&self.requests), index }))
    }
}
