//! Platform strategies.
//!
//! Each supported OS family translates device paths and line parameters into
//! its own command vocabulary: `stty -F` on Linux, `stty -f` on macOS and
//! `mode` on Windows. The strategy is picked once when a device is built.

pub mod mode;
pub mod stty;

pub use mode::ModeStrategy;
pub use stty::SttyStrategy;

use crate::error::{Result, SerialError};
use crate::settings::ConfigurationValue;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Windows-style port labels such as `COM3` or `com3:`.
static COM_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^COM(\d+):?$").expect("COM label pattern is valid"));

/// Device paths that reach `sh -c` unquoted: no whitespace, no shell
/// metacharacters and no leading `-` that the tool would take for an option.
static PLAIN_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_./:+,@%=][A-Za-z0-9_./:+,@%=-]*$").expect("path pattern is valid")
});

/// `setserial` parameters and arguments, e.g. `^spd_hi`, `baud_base`, `0x3f8`.
static SETSERIAL_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\^?[A-Za-z0-9_.,:+-]+$").expect("setserial pattern is valid"));

/// Whether `path` can be spliced into a shell command line as one word.
pub fn is_plain_path(path: &str) -> bool {
    PLAIN_PATH.is_match(path)
}

/// Whether `word` is a well-formed `setserial` parameter or argument.
pub fn is_setserial_word(word: &str) -> bool {
    SETSERIAL_WORD.is_match(word)
}

/// Extract the port number from a `COM<N>` label.
pub fn com_port_number(label: &str) -> Option<u32> {
    COM_LABEL
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|n| n.as_str().parse().ok())
}

/// Supported operating system families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsVariant {
    Linux,
    Mac,
    Windows,
}

impl OsVariant {
    /// Detect the family of the running host.
    pub fn detect() -> Result<Self> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style name to a variant.
    pub fn from_os_name(name: &str) -> Result<Self> {
        match name {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::Mac),
            "windows" => Ok(Self::Windows),
            other => Err(SerialError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Build the strategy for this family.
    pub fn strategy(self) -> Box<dyn OsStrategy> {
        match self {
            Self::Linux => Box::new(SttyStrategy::linux()),
            Self::Mac => Box::new(SttyStrategy::mac()),
            Self::Windows => Box::new(ModeStrategy::new()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Mac => "macOS",
            Self::Windows => "Windows",
        }
    }
}

impl fmt::Display for OsVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a device lives once its requested name has been resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Path passed to `stty` and used to open the handle.
    pub path: String,
    /// `COM<N>` label used by `mode`; Windows only.
    pub windows_alias: Option<String>,
}

impl DeviceIdentity {
    pub fn unix(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            windows_alias: None,
        }
    }

    /// The name configuration commands address.
    pub fn command_target(&self) -> &str {
        self.windows_alias.as_deref().unwrap_or(&self.path)
    }
}

/// Translates generic device operations into one platform's commands.
pub trait OsStrategy: fmt::Debug + Send {
    fn variant(&self) -> OsVariant;

    /// Command that must succeed before the strategy can be used at all.
    fn availability_check(&self) -> Option<&'static str> {
        None
    }

    /// Normalize a requested device name into its identity.
    ///
    /// Fails with `InvalidDevice` when the name can never address a serial
    /// port on this platform.
    fn resolve_device(&self, requested: &str) -> Result<DeviceIdentity>;

    /// Command whose success proves the device is usable.
    fn probe_command(&self, requested: &str, identity: &DeviceIdentity) -> String;

    /// Flags for a configuration value, without the command prefix.
    fn configuration_flags(&self, value: &ConfigurationValue) -> String;

    /// Full command line applying `value` to the device.
    fn configure_command(&self, identity: &DeviceIdentity, value: &ConfigurationValue) -> String;

    /// `setserial` command line for a raw flag.
    fn setserial_command(
        &self,
        _identity: &DeviceIdentity,
        _param: &str,
        _arg: &str,
    ) -> Result<String> {
        Err(SerialError::UnsupportedOperation {
            operation: "setserial",
            platform: self.variant().name(),
        })
    }
}
