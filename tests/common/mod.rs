//! Shared helpers for the integration tests.
//!
//! Devices are built on a [`ScriptedShell`] and a [`MockPort`]; both are
//! returned so tests can inspect the commands that ran and the bytes that
//! moved.

#![allow(dead_code)]

use serialctl::os::OsVariant;
use serialctl::port::MockPort;
use serialctl::shell::ScriptedShell;
use serialctl::SerialDevice;

/// A device with its scripted shell and mock handle.
pub struct Harness {
    pub device: SerialDevice,
    pub shell: ScriptedShell,
    pub port: MockPort,
}

impl Harness {
    pub fn new(variant: OsVariant) -> Self {
        let shell = ScriptedShell::new();
        let port = MockPort::new();
        let device = SerialDevice::with_backend(variant, shell.clone(), port.opener())
            .expect("scripted shell accepts the stty check");
        Self {
            device,
            shell,
            port,
        }
    }

    /// A device already set to `path`, with the probe cleared from the log.
    pub fn with_device(variant: OsVariant, path: &str) -> Self {
        let mut harness = Self::new(variant);
        harness.device.set_device(path).expect("probe succeeds");
        harness.shell.clear_log();
        harness
    }

    /// A device set to `path` and opened with `r+b`.
    pub fn opened(variant: OsVariant, path: &str) -> Self {
        let mut harness = Self::with_device(variant, path);
        harness.device.open("r+b").expect("mock opener succeeds");
        harness
    }
}

/// A typical device path for `variant`.
pub fn sample_path(variant: OsVariant) -> &'static str {
    match variant {
        OsVariant::Linux => "/dev/ttyUSB0",
        OsVariant::Mac => "/dev/tty.usbserial",
        OsVariant::Windows => "COM3",
    }
}

pub const ALL_VARIANTS: [OsVariant; 3] = [OsVariant::Linux, OsVariant::Mac, OsVariant::Windows];
