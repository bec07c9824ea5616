//! Buffered writes and polling reads.
//!
//! Outgoing bytes accumulate in the write buffer until [`SerialDevice::flush`]
//! (or every `send`, with auto-flush on). Reads work on the non-blocking
//! handle in chunks of [`READ_CHUNK_SIZE`]; a short read means nothing more is
//! ready right now.

use super::{DeviceState, FlushPolicy, SerialDevice};
use crate::error::{Result, SerialError};
use crate::port::PortHandle;
use std::io;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Largest single read issued against the handle.
pub const READ_CHUNK_SIZE: usize = 128;

/// Sleep between polls while waiting for a line with a deadline.
const LINE_POLL_INTERVAL: Duration = Duration::from_millis(5);

fn is_line_terminator(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Read until `count` bytes are collected or a read comes back short.
/// `count == 0` reads until the first short read.
fn read_chunks(handle: &mut dyn PortHandle, count: usize) -> io::Result<Vec<u8>> {
    let mut content = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let want = if count == 0 {
            READ_CHUNK_SIZE
        } else {
            (count - content.len()).min(READ_CHUNK_SIZE)
        };

        let n = match handle.read(&mut chunk[..want]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => 0,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        content.extend_from_slice(&chunk[..n]);

        if n < want || (count != 0 && content.len() >= count) {
            return Ok(content);
        }
    }
}

impl SerialDevice {
    /// Queue `data` for transmission, flush it when auto-flush is on, then
    /// sleep for `wait` to give the peer time to answer.
    ///
    /// # Errors
    ///
    /// - `DeviceNotOpened` or `Flush` from the automatic flush
    pub fn send(&mut self, data: impl AsRef<[u8]>, wait: Duration) -> Result<()> {
        self.write_buffer.extend_from_slice(data.as_ref());

        if self.auto_flush {
            self.flush()?;
        }

        if !wait.is_zero() {
            thread::sleep(wait);
        }
        Ok(())
    }

    /// Write the whole buffer to the handle in one operation.
    ///
    /// With [`FlushPolicy::Discard`] the buffer is emptied even when the write
    /// fails; with [`FlushPolicy::Retain`] it is kept for another attempt.
    ///
    /// # Errors
    ///
    /// - `DeviceNotOpened` if the device is not opened
    /// - `Flush` if the write fails
    pub fn flush(&mut self) -> Result<()> {
        let DeviceState::Opened { handle, .. } = &mut self.state else {
            return Err(SerialError::DeviceNotOpened);
        };

        match handle.write_all(&self.write_buffer) {
            Ok(()) => {
                debug!("Flushed {} bytes", self.write_buffer.len());
                self.write_buffer.clear();
                Ok(())
            }
            Err(e) => {
                warn!("Flush of {} bytes failed: {}", self.write_buffer.len(), e);
                if self.flush_policy == FlushPolicy::Discard {
                    self.write_buffer.clear();
                }
                Err(SerialError::Flush(e))
            }
        }
    }

    /// Read from the handle.
    ///
    /// With `count == 0`, reads chunks of [`READ_CHUNK_SIZE`] until a short
    /// read. Otherwise reads at most `count` bytes, stopping early on a short
    /// read.
    ///
    /// # Errors
    ///
    /// - `DeviceNotOpened` if the device is not opened
    /// - `Read` if the handle reports an error other than "would block"
    pub fn read_port(&mut self, count: usize) -> Result<Vec<u8>> {
        let handle = self.handle_mut()?;
        let content = read_chunks(handle.as_mut(), count).map_err(SerialError::Read)?;
        if !content.is_empty() {
            debug!("Read {} bytes", content.len());
        }
        Ok(content)
    }

    /// Block until a non-empty line arrives and return it without its
    /// terminator. Empty lines (`\r\n`, repeated terminators) are skipped.
    ///
    /// There is no timeout: this waits forever for a terminator, and empty
    /// reads (a tty with `VMIN == 0`) just mean nothing has arrived yet. See
    /// [`SerialDevice::read_line_timeout`] for a bounded variant.
    ///
    /// # Errors
    ///
    /// - `DeviceNotOpened` if the device is not opened
    /// - `Read` if the handle reports an error, e.g. a hang-up surfaced as
    ///   `UnexpectedEof`
    pub fn read_line(&mut self) -> Result<Vec<u8>> {
        self.set_blocking(true)?;
        let line = self.read_line_blocking();
        let restored = self.set_blocking(false);
        let line = line?;
        restored?;
        Ok(line)
    }

    fn read_line_blocking(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            let Some(&byte) = self.read_port(1)?.first() else {
                continue;
            };

            if !is_line_terminator(byte) {
                line.push(byte);
            } else if !line.is_empty() {
                return Ok(line);
            }
        }
    }

    /// Like [`SerialDevice::read_line`], but gives up after `timeout`.
    ///
    /// Polls the handle in non-blocking mode. The deadline is checked before
    /// every read, so a peer streaming bytes without a terminator still times
    /// out. Bytes received before the deadline are discarded on timeout.
    ///
    /// # Errors
    ///
    /// - `DeviceNotOpened` if the device is not opened
    /// - `ReadTimeout` if no complete line arrives in time
    /// - `Read` on a read error
    pub fn read_line_timeout(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        let was_blocking = self.is_blocking().ok_or(SerialError::DeviceNotOpened)?;
        if was_blocking {
            self.set_blocking(false)?;
        }

        let deadline = Instant::now() + timeout;
        let line = self.poll_line(deadline, timeout);

        if was_blocking {
            self.set_blocking(true)?;
        }
        line
    }

    fn poll_line(&mut self, deadline: Instant, timeout: Duration) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            if Instant::now() >= deadline {
                debug!("Discarding {} bytes of an unterminated line", line.len());
                return Err(SerialError::ReadTimeout(timeout));
            }
            match self.read_port(1)?.first() {
                Some(&byte) if !is_line_terminator(byte) => line.push(byte),
                Some(_) if !line.is_empty() => return Ok(line),
                Some(_) => {}
                None => thread::sleep(LINE_POLL_INTERVAL),
            }
        }
    }

    /// Discard everything that is immediately available. Returns the number
    /// of bytes dropped.
    pub fn read_flush(&mut self) -> Result<usize> {
        let mut discarded = 0;
        while self.data_available()? > 0 {
            if self.read_port(1)?.is_empty() {
                break;
            }
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Discarded {} pending bytes", discarded);
        }
        Ok(discarded)
    }

    /// Zero-timeout readiness poll: `1` when data is ready, `0` otherwise.
    ///
    /// # Errors
    ///
    /// - `DeviceNotOpened` if the device is not opened
    /// - `Read` if the poll itself fails
    pub fn data_available(&mut self) -> Result<usize> {
        let handle = self.handle_mut()?;
        let ready = handle.poll_readable().map_err(SerialError::Read)?;
        Ok(usize::from(ready))
    }
}
