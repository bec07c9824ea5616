//! Device handle abstraction.
//!
//! Provides the handle contract the device drives, a file-backed handle for
//! real devices and a mock for tests.

pub mod file;
pub mod mock;
pub mod traits;

pub use file::{FileHandle, FileOpener};
pub use mock::{MockOpener, MockPort};
pub use traits::*;
