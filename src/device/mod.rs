//! The serial device aggregate.
//!
//! A [`SerialDevice`] owns the device identity, the OS handle and the write
//! buffer, and gates every operation on its lifecycle state:
//!
//! ```text
//! Unset ──set_device──> Set ──open──> Opened
//!                        ^              │
//!                        └────close─────┘
//! ```
//!
//! Configuration is only allowed in `Set`, I/O only in `Opened`. The handle is
//! released when the device is closed or dropped; [`SerialDevice::session`]
//! gives a guard that closes on every exit path.

mod configure;
mod io;
mod session;

pub use io::READ_CHUNK_SIZE;
pub use session::OpenSession;

use crate::error::{Result, SerialError};
use crate::os::{DeviceIdentity, OsStrategy, OsVariant};
use crate::port::{FileOpener, HandleOpener, OpenMode, PortHandle};
use crate::shell::{ShellRunner, SystemShell};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Observable lifecycle state. Closing returns a device to `Set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceLifecycleState {
    Unset,
    Set,
    Opened,
}

/// What happens to buffered bytes when a flush fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushPolicy {
    /// The buffer is emptied whether or not the write succeeded.
    #[default]
    Discard,
    /// The buffer is only emptied after a successful write.
    Retain,
}

#[derive(Debug)]
enum DeviceState {
    Unset,
    Set(DeviceIdentity),
    Opened {
        identity: DeviceIdentity,
        handle: Box<dyn PortHandle>,
        blocking: bool,
    },
}

/// A serial device driven through platform commands and a file handle.
#[derive(Debug)]
pub struct SerialDevice {
    strategy: Box<dyn OsStrategy>,
    shell: Box<dyn ShellRunner>,
    opener: Box<dyn HandleOpener>,
    state: DeviceState,
    write_buffer: Vec<u8>,
    auto_flush: bool,
    flush_policy: FlushPolicy,
}

impl SerialDevice {
    /// Build a device for the running host, using the system shell and real
    /// file handles.
    ///
    /// # Errors
    ///
    /// - `UnsupportedPlatform` if the host is not Linux, macOS or Windows
    /// - `ToolUnavailable` if `stty` is missing on Linux
    pub fn new() -> Result<Self> {
        Self::with_backend(OsVariant::detect()?, SystemShell::new(), FileOpener::new())
    }

    /// Build a device for an explicit platform and backend.
    pub fn with_backend(
        variant: OsVariant,
        shell: impl ShellRunner + 'static,
        opener: impl HandleOpener + 'static,
    ) -> Result<Self> {
        Self::with_strategy(variant.strategy(), shell, opener)
    }

    /// Build a device around any strategy.
    pub fn with_strategy(
        strategy: Box<dyn OsStrategy>,
        shell: impl ShellRunner + 'static,
        opener: impl HandleOpener + 'static,
    ) -> Result<Self> {
        if let Some(check) = strategy.availability_check() {
            let available = shell.run(check).map(|o| o.is_success()).unwrap_or(false);
            if !available {
                return Err(SerialError::ToolUnavailable("stty".to_string()));
            }
        }

        debug!("Serial device created for {}", strategy.variant());
        Ok(Self {
            strategy,
            shell: Box::new(shell),
            opener: Box::new(opener),
            state: DeviceState::Unset,
            write_buffer: Vec::new(),
            auto_flush: true,
            flush_policy: FlushPolicy::default(),
        })
    }

    pub fn os_variant(&self) -> OsVariant {
        self.strategy.variant()
    }

    pub fn state(&self) -> DeviceLifecycleState {
        match self.state {
            DeviceState::Unset => DeviceLifecycleState::Unset,
            DeviceState::Set(_) => DeviceLifecycleState::Set,
            DeviceState::Opened { .. } => DeviceLifecycleState::Opened,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DeviceState::Opened { .. })
    }

    fn identity(&self) -> Option<&DeviceIdentity> {
        match &self.state {
            DeviceState::Unset => None,
            DeviceState::Set(identity) | DeviceState::Opened { identity, .. } => Some(identity),
        }
    }

    /// Path of the current device, once set.
    pub fn device_path(&self) -> Option<&str> {
        self.identity().map(|id| id.path.as_str())
    }

    /// `COM<N>` label of the current device on Windows.
    pub fn windows_alias(&self) -> Option<&str> {
        self.identity().and_then(|id| id.windows_alias.as_deref())
    }

    pub fn auto_flush(&self) -> bool {
        self.auto_flush
    }

    /// Whether every `send` flushes immediately.
    pub fn set_auto_flush(&mut self, auto_flush: bool) {
        self.auto_flush = auto_flush;
    }

    pub fn flush_policy(&self) -> FlushPolicy {
        self.flush_policy
    }

    pub fn set_flush_policy(&mut self, policy: FlushPolicy) {
        self.flush_policy = policy;
    }

    /// Bytes waiting for the next flush.
    pub fn buffered(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Select the device to work with.
    ///
    /// On Linux a `COM<N>` label is rewritten to `/dev/ttyS<N-1>`. The path is
    /// then probed with `stty` (or `mode` on Windows, which also resets the
    /// port to 9600 baud with XON enabled).
    ///
    /// # Errors
    ///
    /// - `DeviceBusy` if a device is currently opened
    /// - `InvalidDevice` if the path contains whitespace or shell syntax, or
    ///   the probe fails; the previous state is kept
    pub fn set_device(&mut self, path: &str) -> Result<()> {
        if self.is_open() {
            return Err(SerialError::DeviceBusy);
        }

        let identity = self.strategy.resolve_device(path)?;
        let probe = self.strategy.probe_command(path, &identity);
        let outcome = self.shell.run(&probe).map_err(|e| SerialError::InvalidDevice {
            path: path.to_string(),
            stderr: e.to_string(),
        })?;

        if !outcome.is_success() {
            warn!("Probe `{}` failed with exit code {}", probe, outcome.exit_code);
            return Err(SerialError::InvalidDevice {
                path: path.to_string(),
                stderr: outcome.stderr_lossy(),
            });
        }

        info!("Device set to {}", identity.path);
        self.state = DeviceState::Set(identity);
        Ok(())
    }

    /// Open the device with an `fopen`-style mode such as `r+b`.
    ///
    /// The handle starts in non-blocking mode.
    ///
    /// # Errors
    ///
    /// - `AlreadyOpen` if the device is already opened
    /// - `DeviceNotSet` if no device was set
    /// - `InvalidOpenMode` if `mode` is malformed
    /// - `DeviceOpen` if the OS refuses the path or the mode
    pub fn open(&mut self, mode: &str) -> Result<()> {
        let identity = match &self.state {
            DeviceState::Opened { .. } => return Err(SerialError::AlreadyOpen),
            DeviceState::Unset => return Err(SerialError::DeviceNotSet),
            DeviceState::Set(identity) => identity.clone(),
        };
        let mode = OpenMode::parse(mode)?;

        let open_error = |source| SerialError::DeviceOpen {
            path: identity.path.clone(),
            mode: mode.to_string(),
            source,
        };

        let mut handle = self.opener.open(&identity.path, &mode).map_err(open_error)?;
        if let Err(e) = handle.set_blocking(false) {
            let _ = handle.close();
            return Err(open_error(e));
        }

        info!("Opened {} in mode {}", identity.path, mode);
        self.state = DeviceState::Opened {
            identity,
            handle,
            blocking: false,
        };
        Ok(())
    }

    /// Open with the default `r+b` mode.
    pub fn open_default(&mut self) -> Result<()> {
        self.open(OpenMode::default().as_str())
    }

    /// Set the handle's blocking mode.
    ///
    /// # Errors
    ///
    /// - `DeviceNotOpened` if there is no handle
    /// - `Read` if the OS rejects the change
    pub fn set_blocking(&mut self, blocking: bool) -> Result<()> {
        match &mut self.state {
            DeviceState::Opened {
                handle,
                blocking: current,
                ..
            } => {
                handle.set_blocking(blocking).map_err(SerialError::Read)?;
                *current = blocking;
                Ok(())
            }
            _ => Err(SerialError::DeviceNotOpened),
        }
    }

    /// Whether the handle is in blocking mode. `None` when not opened.
    pub fn is_blocking(&self) -> Option<bool> {
        match &self.state {
            DeviceState::Opened { blocking, .. } => Some(*blocking),
            _ => None,
        }
    }

    /// Release the handle and return to `Set`. Does nothing unless opened.
    ///
    /// The handle is invalidated even when the OS reports a failure.
    ///
    /// # Errors
    ///
    /// - `DeviceClose` if the OS reports a failure while closing
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, DeviceState::Unset) {
            DeviceState::Opened { identity, handle, .. } => {
                let path = identity.path.clone();
                self.state = DeviceState::Set(identity);
                handle.close().map_err(SerialError::DeviceClose)?;
                info!("Closed {}", path);
                Ok(())
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// Open the device and return a guard that closes it when dropped.
    pub fn session(&mut self, mode: &str) -> Result<OpenSession<'_>> {
        self.open(mode)?;
        Ok(OpenSession::new(self))
    }

    fn handle_mut(&mut self) -> Result<&mut Box<dyn PortHandle>> {
        match &mut self.state {
            DeviceState::Opened { handle, .. } => Ok(handle),
            _ => Err(SerialError::DeviceNotOpened),
        }
    }
}

impl Drop for SerialDevice {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close device on drop: {}", e);
        }
    }
}
