//! Backing-store contract
//!
//! Every settings source (SD card file, firmware image, raw flash) exposes
//! the same operations so the orchestrator can treat them uniformly. All of
//! them hold the same `key value` text and share the line reader and parser
//! from `pico_settings_core::line`.

use super::error::SettingsError;
use crate::platform::BlockingContext;
use bitflags::bitflags;
use pico_settings_core::{
    ByteSource, ConfigCache, ConfigError, ConfigValue, KeyTriplet, LineCursor, ValueText,
};

bitflags! {
    /// Source capabilities
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceFlags: u8 {
        /// Source accepts writes
        const WRITABLE = 0b0000_0001;
        /// Source lives on removable media and may be missing or fail
        const REMOVABLE = 0b0000_0010;
    }
}

/// A store that supplies, and optionally persists, settings lines
pub trait ConfigSource {
    /// Checksum of the source's name (`sd`, `firm`, `flash`, ...)
    fn name_checksum(&self) -> u16;

    /// Capabilities of this source
    fn flags(&self) -> SourceFlags;

    /// True if this source is the one named by `name_checksum`
    fn identifies_as(&self, name_checksum: u16) -> bool {
        self.name_checksum() == name_checksum
    }

    /// Stream every setting into the cache
    ///
    /// Returns the number of lines accepted.
    fn load_into(&mut self, cache: &mut ConfigCache) -> Result<usize, SettingsError>;

    /// Look a single key up directly in the store, bypassing any cache
    fn read(&mut self, key: &str) -> Result<Option<ValueText>, SettingsError>;

    /// Persist a value
    ///
    /// Returns `Ok(false)` when the source refuses the write (read-only,
    /// unknown key, no room); `Err` only when the storage medium fails.
    fn write(&mut self, key: &str, value: &str, ctx: &BlockingContext) -> Result<bool, SettingsError>;
}

/// Replay every line of `source` into `cache`
pub(crate) fn load_lines<S>(
    source: &mut S,
    mut cursor: LineCursor,
    cache: &mut ConfigCache,
) -> Result<usize, SettingsError>
where
    S: ByteSource,
    SettingsError: From<S::Error>,
{
    let mut accepted = 0;
    while let Some(line) = cursor.next_line(source)? {
        let Some(parsed) = line.parse() else {
            if line.is_truncated() {
                crate::log_warn!("Skipping over-long settings line at offset {}", line.offset());
            }
            continue;
        };

        match ConfigValue::from_line(&parsed) {
            Ok(value) => {
                cache.insert_or_replace(value)?;
                accepted += 1;
            }
            Err(e) => crate::log_warn!("Skipping setting {}: {}", parsed.key, e),
        }
    }
    Ok(accepted)
}

/// Find the first line whose key matches `key`
pub(crate) fn find_value<S>(
    source: &mut S,
    mut cursor: LineCursor,
    key: &KeyTriplet,
) -> Result<Option<ValueText>, SettingsError>
where
    S: ByteSource,
    SettingsError: From<S::Error>,
{
    while let Some(line) = cursor.next_line(source)? {
        let Some(parsed) = line.parse() else {
            continue;
        };
        if KeyTriplet::from_path(parsed.key).matches(key) {
            let value = ValueText::try_from(parsed.value).map_err(|_| ConfigError::ValueTooLong)?;
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// True for a non-empty token that survives a round trip through the line
/// parser unchanged
pub(crate) fn is_single_token(text: &str) -> bool {
    !text.is_empty()
        && !text
            .bytes()
            .any(|b| b.is_ascii_whitespace() || b == b'#' || b == pico_settings_core::END_MARKER)
}
