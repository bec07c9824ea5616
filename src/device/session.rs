//! Scoped access to an opened device.

use super::SerialDevice;
use crate::error::Result;
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// Guard returned by [`SerialDevice::session`].
///
/// Dereferences to the device and closes it when dropped, whether the scope
/// ends normally, through `?` or by unwinding. Use [`OpenSession::close`] to
/// observe close errors.
#[derive(Debug)]
pub struct OpenSession<'a> {
    device: &'a mut SerialDevice,
}

impl<'a> OpenSession<'a> {
    pub(super) fn new(device: &'a mut SerialDevice) -> Self {
        Self { device }
    }

    /// Close now and report the outcome.
    pub fn close(self) -> Result<()> {
        self.device.close()
    }
}

impl Deref for OpenSession<'_> {
    type Target = SerialDevice;

    fn deref(&self) -> &SerialDevice {
        self.device
    }
}

impl DerefMut for OpenSession<'_> {
    fn deref_mut(&mut self) -> &mut SerialDevice {
        self.device
    }
}

impl Drop for OpenSession<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.device.close() {
            warn!("Failed to close device at end of session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::device::{DeviceLifecycleState, SerialDevice};
    use crate::error::SerialError;
    use crate::os::OsVariant;
    use crate::port::MockPort;
    use crate::shell::ScriptedShell;
    use std::time::Duration;

    fn set_device(port: &MockPort) -> SerialDevice {
        let mut device =
            SerialDevice::with_backend(OsVariant::Mac, ScriptedShell::new(), port.opener())
                .unwrap();
        device.set_device("/dev/tty.usbserial").unwrap();
        device
    }

    #[test]
    fn test_session_closes_on_scope_exit() {
        let port = MockPort::new();
        let mut device = set_device(&port);
        {
            let mut session = device.session("r+b").unwrap();
            session.send(b"AT\r\n", Duration::ZERO).unwrap();
        }
        assert_eq!(device.state(), DeviceLifecycleState::Set);
        assert!(port.is_closed());
        assert_eq!(port.written(), b"AT\r\n");
    }

    #[test]
    fn test_session_closes_on_early_error() {
        fn exchange(device: &mut SerialDevice) -> crate::error::Result<Vec<u8>> {
            let mut session = device.session("r+b")?;
            session.flush()?;
            session.read_port(0)
        }

        let port = MockPort::new();
        let mut device = set_device(&port);
        device.set_auto_flush(false);
        device.send(b"ping", Duration::ZERO).unwrap();
        port.fail_next_write();

        assert!(matches!(exchange(&mut device), Err(SerialError::Flush(_))));
        assert_eq!(device.state(), DeviceLifecycleState::Set);
        assert!(port.is_closed());
    }

    #[test]
    fn test_explicit_close_reports_errors() {
        let port = MockPort::new();
        let mut device = set_device(&port);
        let session = device.session("r").unwrap();
        port.fail_close();
        assert!(matches!(session.close(), Err(SerialError::DeviceClose(_))));
    }
}
