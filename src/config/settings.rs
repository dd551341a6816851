//! Settings orchestrator
//!
//! Owns the cache and the ordered list of sources. Loading replays every
//! source into the cache in registration order, so a source registered later
//! overrides the ones before it. Firmware defaults go first, then the SD
//! card file, then flash.
//!
//! # Example
//!
//! ```
//! use pico_settings::config::{FileSource, FirmwareSource, Settings};
//! use pico_settings::platform::mock::MockFiles;
//!
//! let mut firm = FirmwareSource::new(b"speed_rate 50\nenable true\n");
//! let mut files = MockFiles::new();
//! files.insert("/sd/config", b"speed_rate 100\n");
//! let mut sd = FileSource::new(files);
//!
//! let mut settings = Settings::new();
//! settings.add_source(&mut firm).unwrap();
//! settings.add_source(&mut sd).unwrap();
//! settings.load().unwrap();
//!
//! assert_eq!(settings.value("speed_rate").as_number(), Ok(100.0));
//! assert!(settings.value("enable").as_bool());
//! ```

use super::error::SettingsError;
use super::source::{ConfigSource, SourceFlags};
use crate::platform::BlockingContext;
use heapless::Vec;
use pico_settings_core::{checksum, ConfigCache, ConfigValue, InstanceList, KeyTriplet, ValueText};

/// Maximum number of registered sources
pub const MAX_SOURCES: usize = 4;

/// Cached settings backed by an ordered list of sources
pub struct Settings<'a> {
    sources: Vec<&'a mut dyn ConfigSource, MAX_SOURCES>,
    cache: ConfigCache,
    staged: ConfigCache,
}

impl<'a> Settings<'a> {
    /// Create settings with no sources and an empty cache
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            cache: ConfigCache::new(),
            staged: ConfigCache::new(),
        }
    }

    /// Register a source; later sources take priority
    pub fn add_source(&mut self, source: &'a mut dyn ConfigSource) -> Result<(), SettingsError> {
        self.sources
            .push(source)
            .map_err(|_| SettingsError::TooManySources)
    }

    /// Number of registered sources
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Rebuild the cache from every source
    ///
    /// Each source is read into a staging cache and merged only once it has
    /// been read completely. A failing removable source is skipped with a
    /// warning and contributes nothing; any other failure empties the cache
    /// and aborts the load. Returns the number of distinct settings.
    pub fn load(&mut self) -> Result<usize, SettingsError> {
        self.cache.clear();

        for source in self.sources.iter_mut() {
            self.staged.clear();
            let result = source
                .load_into(&mut self.staged)
                .and_then(|_| merge(&mut self.cache, &self.staged));
            match result {
                Ok(()) => {}
                Err(SettingsError::Platform(e)) if source.flags().contains(SourceFlags::REMOVABLE) => {
                    crate::log_warn!("Skipping removable settings source: {}", e);
                }
                Err(e) => {
                    crate::log_error!("Settings load failed: {}", e);
                    self.cache.clear();
                    self.staged.clear();
                    return Err(e);
                }
            }
        }
        self.staged.clear();

        crate::log_info!("Loaded {} settings", self.cache.len());
        Ok(self.cache.len())
    }

    /// Look up a setting by dotted or space-separated path
    ///
    /// Never fails: an unknown key yields a not-found value the caller can
    /// chain [`ConfigValue::with_default`] onto.
    pub fn value(&self, path: &str) -> ConfigValue {
        self.value_of(KeyTriplet::from_path(path))
    }

    /// Look up a setting by key triplet
    pub fn value_of(&self, key: KeyTriplet) -> ConfigValue {
        self.cache
            .lookup(&key)
            .cloned()
            .unwrap_or_else(|| ConfigValue::missing(key))
    }

    /// Look up a setting that must be present
    pub fn required(&self, path: &str) -> Result<ConfigValue, SettingsError> {
        let value = self.value(path);
        if let Err(e) = value.required() {
            crate::log_error!("Required setting {} is missing", path);
            return Err(e.into());
        }
        Ok(value)
    }

    /// Instance names configured under a category, as checksums
    pub fn instances_of(&self, category: &str) -> InstanceList {
        self.cache
            .instances_of(KeyTriplet::from_path(category).category())
    }

    /// Write a setting to the source named `source_name`
    ///
    /// The cache is not touched; call [`load`](Self::load) to pick the
    /// change up.
    pub fn set(
        &mut self,
        source_name: &str,
        key: &str,
        value: &str,
        ctx: &BlockingContext,
    ) -> Result<bool, SettingsError> {
        let name = checksum(source_name);
        let Some(source) = self.sources.iter_mut().find(|s| s.identifies_as(name)) else {
            crate::log_warn!("No settings source named {}", source_name);
            return Err(SettingsError::SourceNotFound(name));
        };

        if !source.flags().contains(SourceFlags::WRITABLE) {
            crate::log_warn!("Settings source {} is read-only", source_name);
            return Ok(false);
        }
        source.write(key, value, ctx)
    }

    /// Read a setting straight from the source named `source_name`
    pub fn get(&mut self, source_name: &str, key: &str) -> Result<Option<ValueText>, SettingsError> {
        let name = checksum(source_name);
        let Some(source) = self.sources.iter_mut().find(|s| s.identifies_as(name)) else {
            return Err(SettingsError::SourceNotFound(name));
        };
        source.read(key)
    }

    /// Cached settings
    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }
}

/// Replay one fully read source into the live cache
fn merge(cache: &mut ConfigCache, staged: &ConfigCache) -> Result<(), SettingsError> {
    for value in staged.iter() {
        cache.insert_or_replace(value.clone())?;
    }
    Ok(())
}

impl Default for Settings<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileSource, FirmwareSource, FlashSource};
    use crate::platform::mock::{MockFiles, MockFlash};
    use crate::platform::{FileError, PlatformError};
    use pico_settings_core::ConfigError;

    const FIRMWARE: &[u8] = b"speed_rate 50\nenable true\n\
temperature_control.hotend.enable true\n\
temperature_control.bed.enable true\n";

    fn sd_card(contents: &[u8]) -> FileSource<MockFiles> {
        let mut files = MockFiles::new();
        files.insert("/sd/config", contents);
        FileSource::new(files)
    }

    #[test]
    fn test_lookup_and_default() {
        let mut sd = sd_card(b"speed_rate 100\n");
        let mut settings = Settings::new();
        settings.add_source(&mut sd).unwrap();
        settings.load().unwrap();

        assert_eq!(settings.value("speed_rate").as_number(), Ok(100.0));

        let unknown = settings.value("unknown").with_default(42);
        assert!(!unknown.is_found());
        assert_eq!(unknown.as_number(), Ok(42.0));
    }

    #[test]
    fn test_load_order_overrides() {
        let mut firm = FirmwareSource::new(FIRMWARE);
        let mut sd = sd_card(b"enable false\n");
        let mut settings = Settings::new();
        settings.add_source(&mut firm).unwrap();
        settings.add_source(&mut sd).unwrap();

        settings.load().unwrap();
        assert!(!settings.value("enable").as_bool());
        assert_eq!(settings.value("speed_rate").as_number(), Ok(50.0));
    }

    #[test]
    fn test_reload_replaces_cache() {
        let mut flash = FlashSource::new(MockFlash::new());
        let ctx = BlockingContext::thread_mode();
        let mut settings = Settings::new();
        settings.add_source(&mut flash).unwrap();
        settings.load().unwrap();
        assert!(!settings.value("speed_rate").is_found());

        assert!(settings.set("flash", "speed_rate", "75", &ctx).unwrap());
        // Not visible until the next load
        assert!(!settings.value("speed_rate").is_found());

        settings.load().unwrap();
        assert_eq!(settings.value("speed_rate").as_number(), Ok(75.0));
    }

    #[test]
    fn test_set_routes_by_name() {
        let mut firm = FirmwareSource::new(FIRMWARE);
        let mut sd = sd_card(b"speed_rate 100\n");
        let ctx = BlockingContext::thread_mode();
        let mut settings = Settings::new();
        settings.add_source(&mut firm).unwrap();
        settings.add_source(&mut sd).unwrap();

        assert!(!settings.set("firm", "speed_rate", "1", &ctx).unwrap());
        assert!(settings.set("sd", "speed_rate", "2", &ctx).unwrap());
        assert_eq!(settings.get("sd", "speed_rate").unwrap().as_deref(), Some("2"));
        assert_eq!(settings.get("firm", "speed_rate").unwrap().as_deref(), Some("50"));
        assert_eq!(
            settings.set("nvram", "speed_rate", "3", &ctx),
            Err(SettingsError::SourceNotFound(checksum("nvram")))
        );
    }

    #[test]
    fn test_instances_of() {
        let mut firm = FirmwareSource::new(FIRMWARE);
        let mut settings = Settings::new();
        settings.add_source(&mut firm).unwrap();
        settings.load().unwrap();

        let instances = settings.instances_of("temperature_control");
        assert_eq!(instances.len(), 2);
        assert!(instances.contains(&checksum("hotend")));
        assert!(instances.contains(&checksum("bed")));
        assert!(settings.instances_of("switch").is_empty());
    }

    #[test]
    fn test_required() {
        let mut firm = FirmwareSource::new(FIRMWARE);
        let mut settings = Settings::new();
        settings.add_source(&mut firm).unwrap();
        settings.load().unwrap();

        assert!(settings.required("speed_rate").is_ok());
        let key = KeyTriplet::from_path("xsteps");
        assert_eq!(
            settings.required("xsteps"),
            Err(SettingsError::Config(ConfigError::MissingRequired(key)))
        );
    }

    #[test]
    fn test_too_many_sources() {
        let mut sources = [
            FirmwareSource::new(FIRMWARE),
            FirmwareSource::new(FIRMWARE),
            FirmwareSource::new(FIRMWARE),
            FirmwareSource::new(FIRMWARE),
            FirmwareSource::new(FIRMWARE),
        ];
        let (last, rest) = sources.split_last_mut().unwrap();
        let mut settings = Settings::new();
        for source in rest {
            settings.add_source(source).unwrap();
        }

        assert_eq!(settings.add_source(last), Err(SettingsError::TooManySources));
        assert_eq!(settings.source_count(), MAX_SOURCES);
    }

    /// Source that yields one line and then fails
    struct FailsMidStream {
        flags: SourceFlags,
    }

    impl ConfigSource for FailsMidStream {
        fn name_checksum(&self) -> u16 {
            checksum("usb")
        }

        fn flags(&self) -> SourceFlags {
            self.flags
        }

        fn load_into(&mut self, cache: &mut ConfigCache) -> Result<usize, SettingsError> {
            cache.insert_or_replace(ConfigValue::found(KeyTriplet::from_path("speed_rate"), "999")?)?;
            Err(PlatformError::File(FileError::ReadFailed).into())
        }

        fn read(&mut self, _key: &str) -> Result<Option<ValueText>, SettingsError> {
            Ok(None)
        }

        fn write(&mut self, _key: &str, _value: &str, _ctx: &BlockingContext) -> Result<bool, SettingsError> {
            Ok(false)
        }
    }

    #[test]
    fn test_partial_removable_source_discarded() {
        let mut firm = FirmwareSource::new(FIRMWARE);
        let mut usb = FailsMidStream {
            flags: SourceFlags::REMOVABLE,
        };
        let mut settings = Settings::new();
        settings.add_source(&mut firm).unwrap();
        settings.add_source(&mut usb).unwrap();

        assert_eq!(settings.load().unwrap(), 4);
        assert_eq!(settings.value("speed_rate").as_number(), Ok(50.0));
    }

    #[test]
    fn test_fatal_source_failure_empties_cache() {
        let mut firm = FirmwareSource::new(FIRMWARE);
        let mut usb = FailsMidStream {
            flags: SourceFlags::WRITABLE,
        };
        let mut settings = Settings::new();
        settings.add_source(&mut firm).unwrap();
        settings.add_source(&mut usb).unwrap();

        assert_eq!(
            settings.load(),
            Err(SettingsError::Platform(PlatformError::File(FileError::ReadFailed)))
        );
        assert!(settings.cache().is_empty());
        assert!(!settings.value("speed_rate").is_found());
    }

    struct BrokenCard;

    impl crate::platform::FileInterface for BrokenCard {
        fn exists(&mut self, _path: &str) -> bool {
            true
        }

        fn read(&mut self, _path: &str, _offset: u32, _buf: &mut [u8]) -> crate::platform::Result<usize> {
            Err(FileError::ReadFailed.into())
        }

        fn write(&mut self, _path: &str, _offset: u32, _data: &[u8]) -> crate::platform::Result<()> {
            Err(FileError::WriteFailed.into())
        }
    }

    #[test]
    fn test_broken_card_skipped() {
        let mut firm = FirmwareSource::new(FIRMWARE);
        let mut sd = FileSource::new(BrokenCard);
        let mut settings = Settings::new();
        settings.add_source(&mut firm).unwrap();
        settings.add_source(&mut sd).unwrap();

        assert_eq!(settings.load().unwrap(), 4);
        assert!(settings.value("enable").as_bool());
    }
}
