//! Mock device handle for testing.
//!
//! Provides a `MockPort` that simulates a serial device without requiring
//! actual hardware. Supports a scripted read queue, a write log, blocking
//! mode tracking and injected failures.
//!
//! Once the read queue is exhausted a non-blocking read reports
//! `WouldBlock`. A real blocking read would hang there, so the mock reports
//! a hang-up (`UnexpectedEof`) instead.

use super::traits::{HandleOpener, OpenMode, PortHandle};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

/// Inner state of the mock port, shared between clones.
#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes to be returned by read operations. `None` is one empty read.
    read_queue: VecDeque<Option<u8>>,
    /// Every successful write, in order.
    write_log: Vec<Vec<u8>>,
    /// Buffer sizes passed to `read`, in order.
    read_requests: Vec<usize>,
    /// Every blocking mode change, in order.
    blocking_log: Vec<bool>,
    /// Current blocking mode.
    blocking: bool,
    /// Upper bound on bytes returned by one read.
    max_read: Option<usize>,
    fail_next_write: bool,
    fail_next_read: bool,
    fail_next_poll: bool,
    fail_close: bool,
    closed: bool,
    /// `(path, mode)` of every open through [`MockOpener`].
    opens: Vec<(String, String)>,
    fail_next_open: bool,
}

/// Mock device handle.
///
/// Clones share state, so a test keeps one clone for inspection while the
/// device owns another.
///
/// # Example
/// ```
/// use serialctl::port::{MockPort, PortHandle};
///
/// let mut port = MockPort::new();
/// port.enqueue_read(b"OK\r\n");
///
/// let mut buffer = [0u8; 8];
/// let n = port.read(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"OK\r\n");
///
/// port.write_all(b"ATZ\r").unwrap();
/// assert_eq!(port.written(), b"ATZ\r");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockPort {
    state: Arc<Mutex<MockPortState>>,
}

impl MockPort {
    /// A new, blocking, empty mock port.
    pub fn new() -> Self {
        let port = Self::default();
        port.state.lock().blocking = true;
        port
    }

    /// Queue bytes for subsequent reads.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state.lock().read_queue.extend(data.iter().copied().map(Some));
    }

    /// Queue `count` reads that return `Ok(0)`, like a tty with `VMIN == 0`.
    pub fn enqueue_empty_reads(&self, count: usize) {
        self.state
            .lock()
            .read_queue
            .extend(std::iter::repeat(None).take(count));
    }

    /// Limit how many bytes one read may return, to simulate short reads.
    pub fn set_max_read(&self, max: Option<usize>) {
        self.state.lock().max_read = max;
    }

    /// Each write call, in order.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    /// Buffer sizes requested by each read call.
    pub fn read_requests(&self) -> Vec<usize> {
        self.state.lock().read_requests.clone()
    }

    pub fn blocking_log(&self) -> Vec<bool> {
        self.state.lock().blocking_log.clone()
    }

    pub fn is_blocking(&self) -> bool {
        self.state.lock().blocking
    }

    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.iter().flatten().count()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn fail_next_write(&self) {
        self.state.lock().fail_next_write = true;
    }

    pub fn fail_next_read(&self) {
        self.state.lock().fail_next_read = true;
    }

    pub fn fail_next_poll(&self) {
        self.state.lock().fail_next_poll = true;
    }

    pub fn fail_close(&self) {
        self.state.lock().fail_close = true;
    }

    /// Opens recorded by a [`MockOpener`] built from this port.
    pub fn opens(&self) -> Vec<(String, String)> {
        self.state.lock().opens.clone()
    }

    pub fn fail_next_open(&self) {
        self.state.lock().fail_next_open = true;
    }

    /// An opener that hands out clones of this port.
    pub fn opener(&self) -> MockOpener {
        MockOpener { port: self.clone() }
    }
}

impl PortHandle for MockPort {
    fn set_blocking(&mut self, blocking: bool) -> io::Result<()> {
        let mut state = self.state.lock();
        state.blocking = blocking;
        state.blocking_log.push(blocking);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        state.read_requests.push(buf.len());

        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated read failure"));
        }

        let limit = state.max_read.unwrap_or(usize::MAX).min(buf.len());
        let mut n = 0;
        while n < limit {
            match state.read_queue.front().copied() {
                Some(Some(byte)) => {
                    state.read_queue.pop_front();
                    buf[n] = byte;
                    n += 1;
                }
                // An empty read ends the current read without being consumed.
                Some(None) if n > 0 => break,
                Some(None) => {
                    state.read_queue.pop_front();
                    return Ok(0);
                }
                None => break,
            }
        }

        if n == 0 && !buf.is_empty() {
            return Err(if state.blocking {
                io::Error::new(io::ErrorKind::UnexpectedEof, "simulated hang-up")
            } else {
                io::Error::new(io::ErrorKind::WouldBlock, "No data available")
            });
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "simulated write failure"));
        }
        state.write_log.push(data.to_vec());
        Ok(())
    }

    fn poll_readable(&mut self) -> io::Result<bool> {
        let mut state = self.state.lock();
        if state.fail_next_poll {
            state.fail_next_poll = false;
            return Err(io::Error::new(io::ErrorKind::Other, "simulated poll failure"));
        }
        Ok(matches!(state.read_queue.front(), Some(Some(_))))
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let mut state = self.state.lock();
        state.closed = true;
        if state.fail_close {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated close failure"));
        }
        Ok(())
    }
}

/// [`HandleOpener`] that returns clones of one [`MockPort`].
#[derive(Debug, Clone)]
pub struct MockOpener {
    port: MockPort,
}

impl HandleOpener for MockOpener {
    fn open(&self, path: &str, mode: &OpenMode) -> io::Result<Box<dyn PortHandle>> {
        {
            let mut state = self.port.state.lock();
            state.opens.push((path.to_string(), mode.to_string()));
            if state.fail_next_open {
                state.fail_next_open = false;
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "simulated open failure",
                ));
            }
            state.closed = false;
            state.blocking = true;
        }
        Ok(Box::new(self.port.clone()))
    }
}
