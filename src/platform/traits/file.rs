//! File interface trait
//!
//! Positional access to files on removable storage (SD card). The settings
//! file is edited in place and never grows, so the trait has no append or
//! truncate operation.

use crate::platform::Result;

/// File interface trait
///
/// Paths are absolute, e.g. `/sd/config`.
pub trait FileInterface {
    /// True if `path` names an existing file
    fn exists(&mut self, path: &str) -> bool;

    /// Read up to `buf.len()` bytes starting at `offset`
    ///
    /// Returns the number of bytes read; zero means end of file.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::File(FileError::NotFound)` if the file does not exist.
    fn read(&mut self, path: &str, offset: u32, buf: &mut [u8]) -> Result<usize>;

    /// Overwrite bytes starting at `offset`
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::File(FileError::NotFound)` if the file does not exist.
    /// Returns `PlatformError::File(FileError::OutOfBounds)` if the range passes the end of the file.
    fn write(&mut self, path: &str, offset: u32, data: &[u8]) -> Result<()>;
}

impl<T: FileInterface + ?Sized> FileInterface for &mut T {
    fn exists(&mut self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn read(&mut self, path: &str, offset: u32, buf: &mut [u8]) -> Result<usize> {
        (**self).read(path, offset, buf)
    }

    fn write(&mut self, path: &str, offset: u32, data: &[u8]) -> Result<()> {
        (**self).write(path, offset, data)
    }
}
