//! `std::fs` backed file access

use crate::platform::{error::FileError, traits::FileInterface, Result};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Files under a host directory
///
/// Settings paths are absolute (`/sd/config`); they are resolved relative to
/// `root`, so `/sd/config` with root `/tmp/card` opens `/tmp/card/sd/config`.
#[derive(Debug, Clone)]
pub struct HostFiles {
    root: PathBuf,
}

impl HostFiles {
    /// Serve files from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn open(&self, path: &Path, write: bool) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .write(write)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => FileError::NotFound.into(),
                _ if write => FileError::WriteFailed.into(),
                _ => FileError::ReadFailed.into(),
            })
    }
}

impl FileInterface for HostFiles {
    fn exists(&mut self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn read(&mut self, path: &str, offset: u32, buf: &mut [u8]) -> Result<usize> {
        let mut file = self.open(&self.resolve(path), false)?;
        file.seek(SeekFrom::Start(u64::from(offset)))
            .map_err(|_| FileError::ReadFailed)?;

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => return Err(FileError::ReadFailed.into()),
            }
        }
        Ok(filled)
    }

    fn write(&mut self, path: &str, offset: u32, data: &[u8]) -> Result<()> {
        let mut file = self.open(&self.resolve(path), true)?;
        let len = file.metadata().map_err(|_| FileError::WriteFailed)?.len();
        if u64::from(offset) + data.len() as u64 > len {
            return Err(FileError::OutOfBounds.into());
        }

        file.seek(SeekFrom::Start(u64::from(offset)))
            .map_err(|_| FileError::WriteFailed)?;
        file.write_all(data).map_err(|_| FileError::WriteFailed)?;
        file.sync_all().map_err(|_| FileError::WriteFailed)?;
        Ok(())
    }
}
