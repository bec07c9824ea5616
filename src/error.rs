//! Error types for device lifecycle, configuration and port I/O.
//!
//! Every public operation on [`SerialDevice`](crate::device::SerialDevice)
//! fails fast with one of these variants. Nothing retries internally.

use std::convert::Infallible;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by serial device operations.
#[derive(Debug, Error)]
pub enum SerialError {
    /// The operation needs a device path, but none was set.
    #[error("The device must be set before it can be opened")]
    DeviceNotSet,

    /// The device is open and must be closed before another one can be set.
    #[error("Close the open device before setting another one")]
    DeviceBusy,

    /// The path was rejected by the platform probe.
    #[error("Specified serial port is not valid: {path}")]
    InvalidDevice { path: String, stderr: String },

    /// `open` was called on an already opened device.
    #[error("The device is already opened")]
    AlreadyOpen,

    /// The operating system refused to open the device.
    #[error("Unable to open device {path} in mode {mode}: {source}")]
    DeviceOpen {
        path: String,
        mode: String,
        #[source]
        source: std::io::Error,
    },

    /// The operation needs an open handle.
    #[error("Device must be opened")]
    DeviceNotOpened,

    /// The handle could not be released.
    #[error("Unable to close the device: {0}")]
    DeviceClose(#[source] std::io::Error),

    /// Configuration only works while the device is set and not opened.
    #[error("Unable to configure the device: it is either not set or opened")]
    DeviceNotConfigurable,

    /// The baud rate is not in the supported list.
    #[error("Unknown baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// Parity must be none, odd or even.
    #[error("Parity mode not supported: {0}")]
    UnsupportedParity(String),

    /// Stop bits must be 1, 1.5 or 2.
    #[error("Specified stop bit length is invalid: {0}")]
    InvalidStopBits(String),

    /// Flow control must be none, rts_cts or xon_xoff.
    #[error("Invalid flow control mode specified: {0}")]
    InvalidFlowControl(String),

    /// The platform configuration command exited non-zero.
    #[error("Command `{command}` failed with exit code {exit_code}: {stderr}")]
    ConfigurationCommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// Writing the output buffer to the handle failed.
    #[error("Error while sending message: {0}")]
    Flush(#[source] std::io::Error),

    /// Reading from or polling the handle failed.
    #[error("Error while reading the device: {0}")]
    Read(#[source] std::io::Error),

    /// A bounded line read expired before a terminator arrived.
    #[error("No line terminator received within {0:?}")]
    ReadTimeout(Duration),

    /// The open mode does not follow the `[raw]+?b?` grammar.
    #[error("Invalid opening mode: {0}. Use r, w or a, optionally followed by + and b")]
    InvalidOpenMode(String),

    /// The host is none of Linux, macOS or Windows.
    #[error("Host OS is neither macOS, Linux nor Windows, unable to run ({0})")]
    UnsupportedPlatform(String),

    /// A required external tool is missing.
    #[error("No {0} available, unable to run")]
    ToolUnavailable(String),

    /// `setserial` rejected the flag or the device file.
    #[error("setserial: {0}")]
    SetSerialFailed(String),

    /// The operation has no meaning on this platform.
    #[error("{operation} is not supported on {platform}")]
    UnsupportedOperation {
        operation: &'static str,
        platform: &'static str,
    },
}

impl SerialError {
    /// Create an `InvalidDevice` error with no captured output.
    pub fn invalid_device(path: impl Into<String>) -> Self {
        Self::InvalidDevice {
            path: path.into(),
            stderr: String::new(),
        }
    }

    /// Captured stderr carried by the error, when there is any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::InvalidDevice { stderr, .. }
            | Self::ConfigurationCommandFailed { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}

impl From<Infallible> for SerialError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Result alias for serial operations.
pub type Result<T> = std::result::Result<T, SerialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SerialError::UnsupportedBaudRate(1234);
        assert_eq!(err.to_string(), "Unknown baud rate: 1234");

        let err = SerialError::invalid_device("/dev/ttyS9");
        assert_eq!(err.to_string(), "Specified serial port is not valid: /dev/ttyS9");

        let err = SerialError::AlreadyOpen;
        assert_eq!(err.to_string(), "The device is already opened");
    }

    #[test]
    fn test_command_failure_carries_stderr() {
        let err = SerialError::ConfigurationCommandFailed {
            command: "stty -F /dev/ttyS0 cs9".to_string(),
            exit_code: 1,
            stderr: "stty: invalid argument 'cs9'".to_string(),
        };
        assert_eq!(err.stderr(), Some("stty: invalid argument 'cs9'"));
        assert!(err.to_string().contains("exit code 1"));
    }

    #[test]
    fn test_timeout_error() {
        let err = SerialError::ReadTimeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }
}
