//! serialctl library
//!
//! Drives RS-232 devices on Linux, macOS and Windows. Line parameters are set
//! with the platform's own tools (`stty`, `mode`); data goes through a plain
//! file handle with a write buffer and polling reads.
//!
//! # Modules
//!
//! - `device`: the [`SerialDevice`] lifecycle, configuration and I/O
//! - `settings`: validated line parameters
//! - `os`: per-platform command translation
//! - `shell`: external command execution
//! - `port`: device handle abstraction, file-backed and mock handles
//! - `config`: TOML configuration with environment overrides
//! - `logging`: tracing subscriber setup
//! - `error`: error types
//!
//! # Example
//!
//! ```no_run
//! use serialctl::SerialDevice;
//! use std::time::Duration;
//!
//! # fn main() -> serialctl::Result<()> {
//! let mut device = SerialDevice::new()?;
//! device.set_device("/dev/ttyUSB0")?;
//! device.set_baud_rate(9600)?;
//! device.set_parity("none")?;
//!
//! let mut session = device.session("r+b")?;
//! session.send("AT\r\n", Duration::from_millis(100))?;
//! let reply = session.read_port(0)?;
//! println!("{}", String::from_utf8_lossy(&reply));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod os;
pub mod port;
pub mod settings;
pub mod shell;

pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use device::{DeviceLifecycleState, FlushPolicy, OpenSession, SerialDevice};
pub use error::{Result, SerialError};
pub use os::{OsStrategy, OsVariant};
pub use settings::{
    BaudRate, CharacterLength, ConfigurationValue, FlowControl, LineSettings, Parity, StopBits,
    SUPPORTED_BAUD_RATES,
};
