//! File-backed settings source
//!
//! Reads the `key value` text file on removable media (the SD card config
//! at `/sd/config` by default). Writes edit an existing value in place: the
//! new value must fit in the span the old one occupies, and is padded with
//! spaces so the rest of the file never moves.

use super::error::SettingsError;
use super::source::{find_value, is_single_token, load_lines, ConfigSource, SourceFlags};
use crate::platform::{BlockingContext, FileInterface, PlatformError};
use heapless::Vec;
use pico_settings_core::{
    checksum, ByteSource, ConfigCache, ConfigError, KeyTriplet, LineCursor, ValueText, MAX_LINE_LEN,
    MAX_VALUE_LEN,
};

/// Default settings file
pub const DEFAULT_CONFIG_PATH: &str = "/sd/config";

/// Default source name
pub const DEFAULT_FILE_SOURCE_NAME: &str = "sd";

/// [`ByteSource`] view of one file
struct FileBytes<'a, F: FileInterface> {
    files: &'a mut F,
    path: &'a str,
}

impl<'a, F: FileInterface> FileBytes<'a, F> {
    fn new(files: &'a mut F, path: &'a str) -> Self {
        Self { files, path }
    }
}

impl<F: FileInterface> ByteSource for FileBytes<'_, F> {
    type Error = PlatformError;

    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.files.read(self.path, offset, buf)
    }
}

/// Settings stored in a text file
///
/// # Example
///
/// ```
/// use pico_settings::config::{ConfigSource, FileSource};
/// use pico_settings::platform::mock::MockFiles;
/// use pico_settings_core::ConfigCache;
///
/// let mut files = MockFiles::new();
/// files.insert("/sd/config", b"speed_rate 100\n");
///
/// let mut source = FileSource::new(files);
/// let mut cache = ConfigCache::new();
/// assert_eq!(source.load_into(&mut cache).unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct FileSource<F: FileInterface> {
    files: F,
    path: &'static str,
    name_checksum: u16,
}

impl<F: FileInterface> FileSource<F> {
    /// Source named `sd` reading `/sd/config`
    pub fn new(files: F) -> Self {
        Self::with_path(files, DEFAULT_CONFIG_PATH, DEFAULT_FILE_SOURCE_NAME)
    }

    /// Source with a custom path and name
    pub fn with_path(files: F, path: &'static str, name: &str) -> Self {
        Self {
            files,
            path,
            name_checksum: checksum(name),
        }
    }

    /// Path of the settings file
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Underlying file system
    pub fn files(&self) -> &F {
        &self.files
    }

    /// Underlying file system (mutable)
    pub fn files_mut(&mut self) -> &mut F {
        &mut self.files
    }

    fn bytes(&mut self) -> FileBytes<'_, F> {
        FileBytes::new(&mut self.files, self.path)
    }
}

impl<F: FileInterface> ConfigSource for FileSource<F> {
    fn name_checksum(&self) -> u16 {
        self.name_checksum
    }

    fn flags(&self) -> SourceFlags {
        SourceFlags::WRITABLE | SourceFlags::REMOVABLE
    }

    fn load_into(&mut self, cache: &mut ConfigCache) -> Result<usize, SettingsError> {
        if !self.files.exists(self.path) {
            crate::log_info!("Settings file {} not found, skipping", self.path);
            return Ok(0);
        }

        let loaded = load_lines(&mut self.bytes(), LineCursor::new(), cache)?;
        crate::log_debug!("Loaded {} settings from {}", loaded, self.path);
        Ok(loaded)
    }

    fn read(&mut self, key: &str) -> Result<Option<ValueText>, SettingsError> {
        if !self.files.exists(self.path) {
            return Ok(None);
        }
        find_value(&mut self.bytes(), LineCursor::new(), &KeyTriplet::from_path(key))
    }

    fn write(&mut self, key: &str, value: &str, _ctx: &BlockingContext) -> Result<bool, SettingsError> {
        if !is_single_token(value) {
            crate::log_warn!("Refusing to write {}: value must be a single token", key);
            return Ok(false);
        }
        if value.len() > MAX_VALUE_LEN {
            crate::log_warn!("Refusing to write {}: value longer than {} bytes", key, MAX_VALUE_LEN);
            return Ok(false);
        }
        if !self.files.exists(self.path) {
            crate::log_warn!("Cannot write {}: {} not found", key, self.path);
            return Ok(false);
        }

        let target = KeyTriplet::from_path(key);
        let mut cursor = LineCursor::new();
        loop {
            let Some(line) = cursor.next_line(&mut self.bytes())? else {
                break;
            };
            let Some(parsed) = line.parse() else {
                continue;
            };
            if KeyTriplet::from_path(parsed.key) != target {
                continue;
            }

            if value.len() >= parsed.value_span {
                crate::log_warn!(
                    "Cannot write {}: value needs {} bytes, line has room for {}",
                    key,
                    value.len(),
                    parsed.value_span
                );
                return Ok(false);
            }

            let mut padded: Vec<u8, MAX_LINE_LEN> =
                Vec::from_slice(value.as_bytes()).map_err(|_| ConfigError::ValueTooLong)?;
            padded
                .resize(parsed.value_span, b' ')
                .map_err(|_| ConfigError::ValueTooLong)?;

            let offset = line.offset() + parsed.value_offset as u32;
            self.files.write(self.path, offset, &padded)?;
            crate::log_info!("Wrote {} = {} to {}", key, value, self.path);
            return Ok(true);
        }

        crate::log_warn!("Cannot write {}: key not present in {}", key, self.path);
        Ok(false)
    }
}
