//! Core traits for the device handle.
//!
//! Defines `PortHandle`, the minimal set of operations the device needs from
//! an open OS handle, and `HandleOpener`, which produces handles. Both real
//! file-backed handles and mocks implement them.

use crate::error::{Result, SerialError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::str::FromStr;

static MODE_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[raw]\+?b?$").expect("open mode pattern is valid"));

/// Primary access requested by an open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Append,
}

/// A validated open mode such as `r`, `w+` or `r+b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMode {
    text: String,
    access: Access,
    update: bool,
    binary: bool,
}

impl OpenMode {
    /// Parse a mode string. Accepts `r`, `w` or `a`, optionally followed by
    /// `+` for read/write and `b` for binary.
    pub fn parse(mode: &str) -> Result<Self> {
        if !MODE_GRAMMAR.is_match(mode) {
            return Err(SerialError::InvalidOpenMode(mode.to_string()));
        }

        let access = match mode.as_bytes()[0] {
            b'r' => Access::Read,
            b'w' => Access::Write,
            _ => Access::Append,
        };

        Ok(Self {
            text: mode.to_string(),
            access,
            update: mode.contains('+'),
            binary: mode.ends_with('b'),
        })
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// Whether `+` was given.
    pub fn is_update(&self) -> bool {
        self.update
    }

    /// Binary is accepted for compatibility; serial devices have no text mode.
    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn readable(&self) -> bool {
        self.access == Access::Read || self.update
    }

    pub fn writable(&self) -> bool {
        self.access != Access::Read || self.update
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Options for `std::fs` matching this mode.
    pub fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.readable());
        match self.access {
            Access::Read => {
                options.write(self.update);
            }
            Access::Write => {
                options.write(true).create(true).truncate(true);
            }
            Access::Append => {
                options.append(true).create(true);
            }
        }
        options
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self {
            text: "r+b".to_string(),
            access: Access::Read,
            update: true,
            binary: true,
        }
    }
}

impl FromStr for OpenMode {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An open, exclusively owned OS handle to a serial device.
pub trait PortHandle: fmt::Debug + Send {
    /// Switch between blocking and non-blocking reads.
    fn set_blocking(&mut self, blocking: bool) -> io::Result<()>;

    /// Read up to `buf.len()` bytes. Short reads are allowed; a non-blocking
    /// handle with nothing ready may return `WouldBlock` or `Ok(0)`.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write every byte or fail.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Zero-timeout readiness poll.
    fn poll_readable(&mut self) -> io::Result<bool>;

    /// Release the handle. The handle is unusable afterwards even on error.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Produces handles for device paths.
pub trait HandleOpener: fmt::Debug {
    fn open(&self, path: &str, mode: &OpenMode) -> io::Result<Box<dyn PortHandle>>;
}
