//! File-backed device handle.
//!
//! Opens the device node with `std::fs` and uses the platform API for the
//! parts `std` does not cover: non-blocking mode and readiness polling.
//! On Unix that is `fcntl`/`poll`; on Windows the comm timeouts and
//! `ClearCommError`.

use super::traits::{HandleOpener, OpenMode, PortHandle};
use std::fs::File;
use std::io::{self, Read, Write};

/// Opens device paths as [`FileHandle`]s.
#[derive(Debug, Clone, Default)]
pub struct FileOpener;

impl FileOpener {
    pub fn new() -> Self {
        Self
    }
}

impl HandleOpener for FileOpener {
    fn open(&self, path: &str, mode: &OpenMode) -> io::Result<Box<dyn PortHandle>> {
        let file = mode.open_options().open(path)?;
        Ok(Box::new(FileHandle::new(file, path)))
    }
}

/// A serial device opened as a file.
#[derive(Debug)]
pub struct FileHandle {
    file: File,
    path: String,
}

impl FileHandle {
    pub fn new(file: File, path: impl Into<String>) -> Self {
        Self {
            file,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(unix)]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::{AsRawFd, IntoRawFd};

    pub fn set_blocking(file: &File, blocking: bool) -> io::Result<()> {
        let fd = file.as_raw_fd();
        // SAFETY: fd is owned by `file` and stays open for the call.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        let flags = if blocking {
            flags & !libc::O_NONBLOCK
        } else {
            flags | libc::O_NONBLOCK
        };
        // SAFETY: as above.
        if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn poll_readable(file: &File) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: pfd is a valid pollfd and nfds is 1.
        let ready = unsafe { libc::poll(&mut pfd, 1, 0) };
        if ready < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ready > 0 && pfd.revents & libc::POLLIN != 0)
    }

    pub fn close(file: File) -> io::Result<()> {
        let fd = file.into_raw_fd();
        // SAFETY: ownership of fd was released by `into_raw_fd`.
        if unsafe { libc::close(fd) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(windows)]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::windows::io::{AsRawHandle, IntoRawHandle};
    use winapi::um::commapi::{ClearCommError, SetCommTimeouts};
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::winbase::{COMMTIMEOUTS, COMSTAT};
    use winapi::um::winnt::{HANDLE, MAXDWORD};

    fn raw(file: &File) -> HANDLE {
        file.as_raw_handle() as HANDLE
    }

    pub fn set_blocking(file: &File, blocking: bool) -> io::Result<()> {
        // MAXDWORD interval with zero totals makes ReadFile return at once.
        let mut timeouts = COMMTIMEOUTS {
            ReadIntervalTimeout: if blocking { 0 } else { MAXDWORD },
            ReadTotalTimeoutMultiplier: 0,
            ReadTotalTimeoutConstant: 0,
            WriteTotalTimeoutMultiplier: 0,
            WriteTotalTimeoutConstant: 0,
        };
        // SAFETY: handle is owned by `file`; timeouts outlives the call.
        if unsafe { SetCommTimeouts(raw(file), &mut timeouts) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn poll_readable(file: &File) -> io::Result<bool> {
        let mut errors: u32 = 0;
        // SAFETY: COMSTAT is plain data; zeroed is a valid value.
        let mut status: COMSTAT = unsafe { std::mem::zeroed() };
        // SAFETY: handle is owned by `file`; out-params are valid.
        if unsafe { ClearCommError(raw(file), &mut errors, &mut status) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(status.cbInQue > 0)
    }

    pub fn close(file: File) -> io::Result<()> {
        let handle = file.into_raw_handle() as HANDLE;
        // SAFETY: ownership of the handle was released by `into_raw_handle`.
        if unsafe { CloseHandle(handle) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl PortHandle for FileHandle {
    fn set_blocking(&mut self, blocking: bool) -> io::Result<()> {
        sys::set_blocking(&self.file, blocking)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.file.flush()
    }

    fn poll_readable(&mut self) -> io::Result<bool> {
        sys::poll_readable(&self.file)
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        sys::close(self.file)
    }
}
