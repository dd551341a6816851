//! Mock file system for testing

use crate::platform::{error::FileError, traits::FileInterface, Result};
use std::string::{String, ToString};
use std::vec::Vec;

/// In-memory file system
///
/// Files are fixed-size byte buffers keyed by path. Writes past the end of a
/// file fail, like the in-place editing the settings file store performs.
#[derive(Debug, Clone, Default)]
pub struct MockFiles {
    files: Vec<(String, Vec<u8>)>,
    reads: u32,
}

impl MockFiles {
    /// Create an empty file system
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file
    pub fn insert(&mut self, path: &str, contents: &[u8]) {
        match self.files.iter_mut().find(|(p, _)| p == path) {
            Some((_, data)) => *data = contents.to_vec(),
            None => self.files.push((path.to_string(), contents.to_vec())),
        }
    }

    /// Remove a file
    pub fn remove(&mut self, path: &str) {
        self.files.retain(|(p, _)| p != path);
    }

    /// Current contents of a file
    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, data)| data.as_slice())
    }

    /// Number of read calls served
    pub fn read_count(&self) -> u32 {
        self.reads
    }

    fn file(&self, path: &str) -> Result<&Vec<u8>> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, data)| data)
            .ok_or(FileError::NotFound.into())
    }
}

impl FileInterface for MockFiles {
    fn exists(&mut self, path: &str) -> bool {
        self.contents(path).is_some()
    }

    fn read(&mut self, path: &str, offset: u32, buf: &mut [u8]) -> Result<usize> {
        self.reads += 1;
        let data = self.file(path)?;
        let start = (offset as usize).min(data.len());
        let len = buf.len().min(data.len() - start);
        buf[..len].copy_from_slice(&data[start..start + len]);
        Ok(len)
    }

    fn write(&mut self, path: &str, offset: u32, bytes: &[u8]) -> Result<()> {
        let data = self
            .files
            .iter_mut()
            .find(|(p, _)| p == path)
            .map(|(_, data)| data)
            .ok_or(FileError::NotFound)?;
        let start = offset as usize;
        if start + bytes.len() > data.len() {
            return Err(FileError::OutOfBounds.into());
        }
        data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_files_read_write() {
        let mut files = MockFiles::new();
        files.insert("/sd/config", b"speed_rate 100\n");

        let mut buf = [0u8; 4];
        assert_eq!(files.read("/sd/config", 11, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"100\n");
        assert_eq!(files.read("/sd/config", 15, &mut buf).unwrap(), 0);

        files.write("/sd/config", 11, b"250").unwrap();
        assert_eq!(files.contents("/sd/config").unwrap(), b"speed_rate 250\n");
    }

    #[test]
    fn test_mock_files_missing_and_bounds() {
        let mut files = MockFiles::new();
        let mut buf = [0u8; 4];
        assert_eq!(
            files.read("/sd/none", 0, &mut buf),
            Err(FileError::NotFound.into())
        );

        files.insert("/sd/config", b"abc");
        assert_eq!(
            files.write("/sd/config", 2, b"xy"),
            Err(FileError::OutOfBounds.into())
        );

        files.remove("/sd/config");
        assert!(!files.exists("/sd/config"));
    }
}
