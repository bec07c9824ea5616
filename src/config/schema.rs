//! Configuration schema definitions.
//!
//! Every section uses `#[serde(default)]`, so a file only needs the keys it
//! changes.

use crate::device::FlushPolicy;
use crate::port::OpenMode;
use crate::settings::LineSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub logging: LoggingConfig,
}

/// `[serial]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device to use when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// `fopen`-style mode used when opening the device.
    pub open_mode: String,
    /// Flush after every send.
    pub auto_flush: bool,
    /// Pause after a send, giving the peer time to reply.
    pub reply_wait_ms: u64,
    /// Deadline for line reads; unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_timeout_ms: Option<u64>,
    pub flush_policy: FlushPolicy,
    /// Short names for device paths, e.g. `modem = "/dev/ttyUSB0"`.
    pub port_aliases: HashMap<String, String>,
    /// Line parameters applied after the device is set.
    #[serde(flatten)]
    pub line: LineSettings,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: None,
            open_mode: OpenMode::default().to_string(),
            auto_flush: true,
            reply_wait_ms: 100,
            line_timeout_ms: None,
            flush_policy: FlushPolicy::default(),
            port_aliases: HashMap::new(),
            line: LineSettings::default(),
        }
    }
}

impl SerialConfig {
    pub fn reply_wait(&self) -> Duration {
        Duration::from_millis(self.reply_wait_ms)
    }

    pub fn line_timeout(&self) -> Option<Duration> {
        self.line_timeout_ms.map(Duration::from_millis)
    }

    /// Resolve a device name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// The configured default device, resolved through aliases.
    pub fn default_device(&self) -> Option<String> {
        self.device.as_deref().map(|name| self.resolve_port(name))
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive: "trace", "debug", "info", "warn", "error" or a full
    /// `EnvFilter` expression.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    /// Multi-line output with colors
    #[default]
    Pretty,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}
