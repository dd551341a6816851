//! Firmware-image settings source
//!
//! Defaults compiled into the binary. The text is the same `key value`
//! format as the SD card file and is loaded first, so every other source
//! overrides it.

use super::error::SettingsError;
use super::source::{find_value, load_lines, ConfigSource, SourceFlags};
use crate::platform::BlockingContext;
use pico_settings_core::{checksum, ConfigCache, KeyTriplet, LineCursor, ValueText};

/// Default source name
pub const DEFAULT_FIRMWARE_SOURCE_NAME: &str = "firm";

/// Defaults embedded at build time (path exported by `build.rs`)
static EMBEDDED_DEFAULTS: &[u8] = include_bytes!(env!("PICO_SETTINGS_DEFAULTS"));

/// Read-only settings baked into the firmware image
#[derive(Debug, Clone, Copy)]
pub struct FirmwareSource {
    text: &'static [u8],
    name_checksum: u16,
}

impl FirmwareSource {
    /// Source over the defaults embedded at build time
    pub fn embedded() -> Self {
        Self::new(EMBEDDED_DEFAULTS)
    }

    /// Source over an arbitrary static text region
    pub fn new(text: &'static [u8]) -> Self {
        Self::with_name(text, DEFAULT_FIRMWARE_SOURCE_NAME)
    }

    /// Source with a custom name
    pub fn with_name(text: &'static [u8], name: &str) -> Self {
        Self {
            text,
            name_checksum: checksum(name),
        }
    }

    /// Raw settings text
    pub fn text(&self) -> &'static [u8] {
        self.text
    }
}

impl ConfigSource for FirmwareSource {
    fn name_checksum(&self) -> u16 {
        self.name_checksum
    }

    fn flags(&self) -> SourceFlags {
        SourceFlags::empty()
    }

    fn load_into(&mut self, cache: &mut ConfigCache) -> Result<usize, SettingsError> {
        let mut text = self.text;
        let loaded = load_lines(&mut text, LineCursor::new(), cache)?;
        crate::log_debug!("Loaded {} firmware default settings", loaded);
        Ok(loaded)
    }

    fn read(&mut self, key: &str) -> Result<Option<ValueText>, SettingsError> {
        let mut text = self.text;
        find_value(&mut text, LineCursor::new(), &KeyTriplet::from_path(key))
    }

    fn write(&mut self, key: &str, _value: &str, _ctx: &BlockingContext) -> Result<bool, SettingsError> {
        crate::log_warn!("Cannot write {}: firmware settings are read-only", key);
        Ok(false)
    }
}
