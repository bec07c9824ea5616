//! TOML configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! 1. `SERIALCTL_CONFIG` environment variable (explicit path)
//! 2. `./serialctl.toml` (current directory)
//! 3. `serialctl.toml` in the platform config directory
//!    (`~/.config/serialctl` on Linux, `%APPDATA%\serialctl\config` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `SERIALCTL_<SECTION>_<KEY>`:
//! - `SERIALCTL_SERIAL_DEVICE=/dev/ttyUSB0`
//! - `SERIALCTL_SERIAL_BAUD_RATE=9600`
//! - `SERIALCTL_SERIAL_AUTO_FLUSH=false`
//! - `SERIALCTL_SERIAL_REPLY_WAIT_MS=250`
//! - `SERIALCTL_LOGGING_LEVEL=debug`
//!
//! # Example
//!
//! ```toml
//! [serial]
//! device = "modem"
//! baud_rate = 9600
//! parity = "none"
//! character_length = 8
//! stop_bits = 1
//! flow_control = "none"
//!
//! [serial.port_aliases]
//! modem = "/dev/ttyUSB0"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig};
