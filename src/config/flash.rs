//! Raw-flash settings source
//!
//! Settings written at runtime live in two flash sectors used as a
//! ping-pong pair. Each sector starts with a header page whose first byte
//! records the sector state, followed by `key value` lines ending in an end
//! marker byte.
//!
//! ```text
//! 0x040000  sector 0  [state | reserved ...][data ........ 0x00]
//! 0x041000  sector 1  [state | reserved ...][data ........ 0x00]
//! ```
//!
//! A write copies the current sector forward into the other one, minus any
//! line carrying the written key, appends the new line, commits the target
//! as `VALID` and only then marks the old sector `BLANK`. Erased flash reads
//! `0xFF`, which is neither state, and programming only clears bits, so both
//! transitions are single-byte programs on an already-erased header.

use super::error::SettingsError;
use super::source::{find_value, is_single_token, load_lines, ConfigSource, SourceFlags};
use crate::platform::{BlockingContext, FlashError, FlashInterface, PlatformError};
use pico_settings_core::{
    checksum, ByteSource, ConfigCache, KeyTriplet, LineCursor, ValueText, END_MARKER, MAX_LINE_LEN,
    MAX_VALUE_LEN,
};

/// Flash sector addresses for settings storage
pub const SETTINGS_SECTOR_ADDRESSES: [u32; 2] = [
    0x040000, // Sector 0: 256 KB offset
    0x041000, // Sector 1: 260 KB offset
];

/// Size of one settings sector
pub const SECTOR_SIZE: u32 = 4096;

/// Header page at the start of each sector
pub const SECTOR_HEADER_SIZE: u32 = 256;

/// Bytes available for settings text, end marker included
pub const SECTOR_DATA_SIZE: u32 = SECTOR_SIZE - SECTOR_HEADER_SIZE;

/// State byte of the sector holding current settings
pub const SECTOR_VALID: u8 = 0xA5;

/// State byte of a retired sector
pub const SECTOR_BLANK: u8 = 0x00;

/// Default source name
pub const DEFAULT_FLASH_SOURCE_NAME: &str = "flash";

/// Program granularity of the staging buffer
const STAGING_SIZE: usize = 256;

/// Decoded sector state byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SectorState {
    /// Holds the current settings
    Valid,
    /// Retired by a later write
    Blank,
    /// Erased and never committed
    Erased,
    /// Anything else (torn header program, foreign data)
    Unknown(u8),
}

impl SectorState {
    fn from_byte(byte: u8) -> Self {
        match byte {
            SECTOR_VALID => SectorState::Valid,
            SECTOR_BLANK => SectorState::Blank,
            0xFF => SectorState::Erased,
            other => SectorState::Unknown(other),
        }
    }
}

/// Flash source statistics for wear monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashSourceStats {
    /// Completed settings writes
    pub total_writes: u32,
    /// Sector committed by the last write (0-1)
    pub active_sector: Option<u8>,
    /// Erase count per sector
    pub erase_counts: [u32; 2],
}

/// [`ByteSource`] over the data region of one sector
struct SectorBytes<'a, F: FlashInterface> {
    flash: &'a mut F,
    base: u32,
}

impl<F: FlashInterface> ByteSource for SectorBytes<'_, F> {
    type Error = PlatformError;

    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.flash.read(self.base + offset, buf)?;
        Ok(buf.len())
    }
}

/// Page buffer that programs the target sector as it fills
struct Staging {
    buf: [u8; STAGING_SIZE],
    len: usize,
    address: u32,
    used: u32,
}

impl Staging {
    fn new(address: u32) -> Self {
        Self {
            buf: [0; STAGING_SIZE],
            len: 0,
            address,
            used: 0,
        }
    }

    /// Queue bytes, keeping one byte of the budget for the end marker
    fn push<F: FlashInterface>(&mut self, flash: &mut F, bytes: &[u8]) -> Result<(), SettingsError> {
        if self.used + bytes.len() as u32 + 1 > SECTOR_DATA_SIZE {
            return Err(SettingsError::SectorFull);
        }
        for &byte in bytes {
            self.buf[self.len] = byte;
            self.len += 1;
            if self.len == STAGING_SIZE {
                self.flush(flash)?;
            }
        }
        self.used += bytes.len() as u32;
        Ok(())
    }

    fn flush<F: FlashInterface>(&mut self, flash: &mut F) -> Result<(), SettingsError> {
        if self.len > 0 {
            flash.write(self.address, &self.buf[..self.len])?;
            crate::log_trace!("Programmed {} settings bytes at {}", self.len, self.address);
            self.address += self.len as u32;
            self.len = 0;
        }
        Ok(())
    }

    /// Terminate the text and program the last, zero-padded page
    fn finish<F: FlashInterface>(mut self, flash: &mut F) -> Result<(), SettingsError> {
        self.buf[self.len] = END_MARKER;
        self.buf[self.len + 1..].fill(0);
        self.len = STAGING_SIZE;
        self.flush(flash)
    }
}

/// Settings persisted in a pair of flash sectors
///
/// # Example
///
/// ```
/// use pico_settings::config::{ConfigSource, FlashSource};
/// use pico_settings::platform::mock::MockFlash;
/// use pico_settings::platform::BlockingContext;
///
/// let mut source = FlashSource::new(MockFlash::new());
/// let ctx = BlockingContext::thread_mode();
///
/// assert!(source.write("speed_rate", "120", &ctx).unwrap());
/// assert_eq!(source.read("speed_rate").unwrap().as_deref(), Some("120"));
/// ```
pub struct FlashSource<F: FlashInterface> {
    flash: F,
    sectors: [u32; 2],
    name_checksum: u16,
    stats: FlashSourceStats,
}

impl<F: FlashInterface> FlashSource<F> {
    /// Source named `flash` over the default sector pair
    pub fn new(flash: F) -> Self {
        Self::with_sectors(flash, SETTINGS_SECTOR_ADDRESSES, DEFAULT_FLASH_SOURCE_NAME)
    }

    /// Source over a custom sector pair
    ///
    /// Both addresses must be sector aligned and at least [`SECTOR_SIZE`]
    /// apart.
    pub fn with_sectors(flash: F, sectors: [u32; 2], name: &str) -> Self {
        Self {
            flash,
            sectors,
            name_checksum: checksum(name),
            stats: FlashSourceStats {
                total_writes: 0,
                active_sector: None,
                erase_counts: [0; 2],
            },
        }
    }

    /// State of one sector (0 or 1)
    pub fn sector_state(&mut self, index: usize) -> Result<SectorState, SettingsError> {
        let mut state = [0u8; 1];
        self.flash.read(self.sectors[index], &mut state)?;
        Ok(SectorState::from_byte(state[0]))
    }

    /// Sector holding current settings, if any
    ///
    /// Sector 1 wins when both are `VALID`.
    pub fn current_sector(&mut self) -> Result<Option<usize>, SettingsError> {
        for index in [1, 0] {
            if self.sector_state(index)? == SectorState::Valid {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Get storage statistics
    pub fn stats(&self) -> FlashSourceStats {
        self.stats
    }

    /// Get mutable reference to Flash interface (for testing)
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Release the flash interface
    pub fn into_inner(self) -> F {
        self.flash
    }

    fn data_address(&self, index: usize) -> u32 {
        self.sectors[index] + SECTOR_HEADER_SIZE
    }

    fn data(&mut self, index: usize) -> SectorBytes<'_, F> {
        let base = self.data_address(index);
        SectorBytes {
            flash: &mut self.flash,
            base,
        }
    }

    /// Sectors must be block aligned, inside the part and must not overlap
    fn check_layout(&self) -> Result<(), SettingsError> {
        let block = self.flash.block_size();
        let capacity = self.flash.capacity();
        let fits = |address: u32| {
            address.is_multiple_of(block)
                && SECTOR_SIZE.is_multiple_of(block)
                && address.checked_add(SECTOR_SIZE).is_some_and(|end| end <= capacity)
        };
        let [first, second] = self.sectors;
        if first.abs_diff(second) >= SECTOR_SIZE && self.sectors.iter().all(|&address| fits(address)) {
            Ok(())
        } else {
            crate::log_error!("Flash settings sectors do not fit the flash layout");
            Err(PlatformError::Flash(FlashError::InvalidAddress).into())
        }
    }

    fn erase_sector(&mut self, index: usize) -> Result<(), SettingsError> {
        self.flash.erase(self.sectors[index], SECTOR_SIZE)?;
        self.stats.erase_counts[index] += 1;
        Ok(())
    }

    fn set_state(&mut self, index: usize, state: u8) -> Result<(), SettingsError> {
        self.flash.write(self.sectors[index], &[state])?;
        Ok(())
    }

    /// Turn sector 0 into an empty, committed sector
    fn bootstrap(&mut self) -> Result<(), SettingsError> {
        crate::log_info!("No valid settings sector, initializing sector 0");
        self.erase_sector(0)?;
        let data = self.data_address(0);
        self.flash.write(data, &[END_MARKER])?;
        self.set_state(0, SECTOR_VALID)
    }

    /// Copy `current` into `target`, replacing any line keyed `key`
    fn copy_forward(
        &mut self,
        current: usize,
        target: usize,
        key: &str,
        value: &str,
    ) -> Result<(), SettingsError> {
        let mut staging = Staging::new(self.data_address(target));
        let mut cursor = LineCursor::with_limit(SECTOR_DATA_SIZE);
        let mut copied = 0u32;

        loop {
            let Some(line) = cursor.next_line(&mut self.data(current))? else {
                break;
            };
            if line.bytes().is_empty() || line.parse().is_some_and(|l| l.key == key) {
                continue;
            }
            staging.push(&mut self.flash, line.bytes())?;
            staging.push(&mut self.flash, b"\n")?;
            copied += 1;
        }

        staging.push(&mut self.flash, key.as_bytes())?;
        staging.push(&mut self.flash, b" ")?;
        staging.push(&mut self.flash, value.as_bytes())?;
        staging.push(&mut self.flash, b"\n")?;
        staging.finish(&mut self.flash)?;

        crate::log_debug!("Copied {} settings lines into sector {}", copied, target);
        Ok(())
    }
}

impl<F: FlashInterface> ConfigSource for FlashSource<F> {
    fn name_checksum(&self) -> u16 {
        self.name_checksum
    }

    fn flags(&self) -> SourceFlags {
        SourceFlags::WRITABLE
    }

    fn load_into(&mut self, cache: &mut ConfigCache) -> Result<usize, SettingsError> {
        let Some(current) = self.current_sector()? else {
            crate::log_debug!("No valid flash settings sector");
            return Ok(0);
        };

        let loaded = load_lines(&mut self.data(current), LineCursor::with_limit(SECTOR_DATA_SIZE), cache)?;
        self.stats.active_sector = Some(current as u8);
        crate::log_debug!("Loaded {} settings from flash sector {}", loaded, current);
        Ok(loaded)
    }

    fn read(&mut self, key: &str) -> Result<Option<ValueText>, SettingsError> {
        let Some(current) = self.current_sector()? else {
            return Ok(None);
        };
        find_value(
            &mut self.data(current),
            LineCursor::with_limit(SECTOR_DATA_SIZE),
            &KeyTriplet::from_path(key),
        )
    }

    fn write(&mut self, key: &str, value: &str, _ctx: &BlockingContext) -> Result<bool, SettingsError> {
        if !is_single_token(key) || !is_single_token(value) {
            crate::log_warn!("Refusing flash setting {}: key and value must be single tokens", key);
            return Ok(false);
        }
        if value.len() > MAX_VALUE_LEN || key.len() + value.len() + 1 > MAX_LINE_LEN {
            crate::log_warn!("Refusing flash setting {}: line too long", key);
            return Ok(false);
        }

        self.check_layout()?;

        let current = match self.current_sector()? {
            Some(index) => index,
            None => {
                self.bootstrap()?;
                0
            }
        };
        let target = 1 - current;

        self.erase_sector(target)?;
        self.copy_forward(current, target, key, value)?;

        // Commit before invalidating: a crash in between leaves both valid
        self.set_state(target, SECTOR_VALID)?;
        self.set_state(current, SECTOR_BLANK)?;

        self.stats.total_writes += 1;
        self.stats.active_sector = Some(target as u8);
        crate::log_info!("Flash setting {} = {} committed to sector {}", key, value, target);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockFlash;

    fn source() -> FlashSource<MockFlash> {
        FlashSource::new(MockFlash::new())
    }

    fn valid_sectors(src: &mut FlashSource<MockFlash>) -> usize {
        (0..2)
            .filter(|&i| src.sector_state(i).unwrap() == SectorState::Valid)
            .count()
    }

    fn data_text(src: &mut FlashSource<MockFlash>, index: usize) -> std::string::String {
        let address = src.data_address(index);
        let bytes = src.flash_mut().get_contents(address, SECTOR_DATA_SIZE as usize);
        let end = bytes.iter().position(|&b| b == END_MARKER).unwrap();
        std::string::String::from_utf8(bytes[..end].to_vec()).unwrap()
    }

    #[test]
    fn test_empty_flash() {
        let mut src = source();
        let mut cache = ConfigCache::new();

        assert_eq!(src.current_sector().unwrap(), None);
        assert_eq!(src.load_into(&mut cache).unwrap(), 0);
        assert_eq!(src.read("speed_rate").unwrap(), None);
    }

    #[test]
    fn test_bootstrap_on_first_write() {
        let mut src = source();
        let ctx = BlockingContext::thread_mode();

        assert!(src.write("speed_rate", "100", &ctx).unwrap());

        // Sector 0 was bootstrapped, then retired by the copy into sector 1
        assert_eq!(src.sector_state(0).unwrap(), SectorState::Blank);
        assert_eq!(src.sector_state(1).unwrap(), SectorState::Valid);
        assert_eq!(data_text(&mut src, 1), "speed_rate 100\n");
        assert_eq!(src.stats().erase_counts, [1, 1]);
    }

    #[test]
    fn test_ping_pong_single_valid_sector() {
        let mut src = source();
        let ctx = BlockingContext::thread_mode();

        for i in 0..10u32 {
            let mut value = ValueText::new();
            core::fmt::write(&mut value, format_args!("{}", i)).unwrap();
            assert!(src.write("speed_rate", &value, &ctx).unwrap());
            assert_eq!(valid_sectors(&mut src), 1);
        }
        assert_eq!(src.read("speed_rate").unwrap().as_deref(), Some("9"));
        assert_eq!(src.stats().total_writes, 10);
    }

    #[test]
    fn test_copy_forward_preserves_other_keys() {
        let mut src = source();
        let ctx = BlockingContext::thread_mode();

        assert!(src.write("speed_rate", "100", &ctx).unwrap());
        assert!(src.write("xsteps", "320", &ctx).unwrap());
        assert!(src.write("speed_rate", "200", &ctx).unwrap());

        let current = src.current_sector().unwrap().unwrap();
        assert_eq!(data_text(&mut src, current), "xsteps 320\nspeed_rate 200\n");

        let mut cache = ConfigCache::new();
        assert_eq!(src.load_into(&mut cache).unwrap(), 2);
        let speed = cache.lookup(&KeyTriplet::from_path("speed_rate")).unwrap();
        assert_eq!(speed.as_number(), Ok(200.0));
    }

    #[test]
    fn test_refuses_bad_tokens() {
        let mut src = source();
        let ctx = BlockingContext::thread_mode();

        assert!(!src.write("", "1", &ctx).unwrap());
        assert!(!src.write("speed_rate", "", &ctx).unwrap());
        assert!(!src.write("speed rate", "1", &ctx).unwrap());
        assert!(!src.write("speed_rate", "1#2", &ctx).unwrap());

        let long = [b'9'; MAX_VALUE_LEN + 1];
        assert!(!src.write("speed_rate", core::str::from_utf8(&long).unwrap(), &ctx).unwrap());

        // Nothing touched the flash
        assert_eq!(src.flash_mut().get_total_erase_count(), 0);
    }

    #[test]
    fn test_sector_full_keeps_current() {
        let mut src = source();
        let ctx = BlockingContext::thread_mode();

        // Each line is 64 + 1 + 64 + 1 bytes; the data region fits 29 of them
        let mut written = 0;
        let result = loop {
            let mut key = ValueText::new();
            core::fmt::write(&mut key, format_args!("{:0>64}", written)).unwrap();
            let value = [b'v'; MAX_VALUE_LEN];
            match src.write(&key, core::str::from_utf8(&value).unwrap(), &ctx) {
                Ok(true) => written += 1,
                other => break other,
            }
        };

        assert_eq!(result, Err(SettingsError::SectorFull));
        assert_eq!(written, 29);
        assert_eq!(valid_sectors(&mut src), 1);

        let mut cache = ConfigCache::new();
        assert_eq!(src.load_into(&mut cache).unwrap(), 29);
    }

    #[test]
    fn test_crash_before_commit_keeps_old_value() {
        let mut src = source();
        let ctx = BlockingContext::thread_mode();
        assert!(src.write("speed_rate", "100", &ctx).unwrap());

        // Erase succeeds, the copy does not
        src.flash_mut().cut_power_after(1);
        assert_eq!(
            src.write("speed_rate", "200", &ctx),
            Err(SettingsError::Platform(PlatformError::Flash(FlashError::WriteFailed)))
        );
        src.flash_mut().restore_power();

        let mut rebooted = FlashSource::new(src.into_inner());
        assert_eq!(valid_sectors(&mut rebooted), 1);
        assert_eq!(rebooted.read("speed_rate").unwrap().as_deref(), Some("100"));
    }

    #[test]
    fn test_crash_between_commit_and_invalidate() {
        let mut src = source();
        let ctx = BlockingContext::thread_mode();
        assert!(src.write("speed_rate", "100", &ctx).unwrap());

        // Erase, page program and commit succeed; invalidating sector 1 fails
        src.flash_mut().cut_power_after(3);
        assert!(src.write("speed_rate", "200", &ctx).is_err());
        src.flash_mut().restore_power();

        let mut rebooted = FlashSource::new(src.into_inner());
        assert_eq!(valid_sectors(&mut rebooted), 2);
        // Sector 1 wins the tie, so the update into sector 0 is lost
        assert_eq!(rebooted.read("speed_rate").unwrap().as_deref(), Some("100"));

        // The next write resolves back to a single valid sector
        assert!(rebooted.write("xsteps", "320", &ctx).unwrap());
        assert_eq!(valid_sectors(&mut rebooted), 1);
        assert_eq!(rebooted.read("speed_rate").unwrap().as_deref(), Some("100"));
        assert_eq!(rebooted.read("xsteps").unwrap().as_deref(), Some("320"));
    }

    #[test]
    fn test_misaligned_sectors_rejected() {
        let mut src = FlashSource::with_sectors(MockFlash::new(), [0x040000, 0x040800], "flash");
        let ctx = BlockingContext::thread_mode();

        assert_eq!(
            src.write("speed_rate", "1", &ctx),
            Err(SettingsError::Platform(PlatformError::Flash(FlashError::InvalidAddress)))
        );
        assert_eq!(src.flash_mut().get_total_erase_count(), 0);
    }

    #[test]
    fn test_overlapping_sectors_rejected() {
        let ctx = BlockingContext::thread_mode();
        for sectors in [[0x040000, 0x040000], [0x041000, 0x040000 + SECTOR_SIZE / 2]] {
            let mut src = FlashSource::with_sectors(MockFlash::new(), sectors, "flash");
            assert_eq!(
                src.write("bar", "1", &ctx),
                Err(SettingsError::Platform(PlatformError::Flash(FlashError::InvalidAddress)))
            );
            assert_eq!(src.flash_mut().get_total_erase_count(), 0);
        }

        // Adjacent sectors in reverse order are fine
        let mut src = FlashSource::with_sectors(MockFlash::new(), [0x041000, 0x040000], "flash");
        assert!(src.write("bar", "1", &ctx).unwrap());
        assert!(src.write("foo", "2", &ctx).unwrap());
        assert_eq!(src.read("bar").unwrap().as_deref(), Some("1"));
        assert_eq!(src.read("foo").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_torn_page_program_not_committed() {
        let mut src = source();
        let ctx = BlockingContext::thread_mode();
        assert!(src.write("speed_rate", "100", &ctx).unwrap());

        // The page program loses its second half, so the end marker never lands
        src.flash_mut().simulate_power_loss();
        src.flash_mut().cut_power_after(2);
        assert!(src.write("speed_rate", "200", &ctx).is_err());
        src.flash_mut().restore_power();

        let mut rebooted = FlashSource::new(src.into_inner());
        assert_eq!(valid_sectors(&mut rebooted), 1);
        assert_eq!(rebooted.read("speed_rate").unwrap().as_deref(), Some("100"));
    }

    #[test]
    fn test_corrupt_header_ignored() {
        let mut src = source();
        let ctx = BlockingContext::thread_mode();
        assert!(src.write("speed_rate", "100", &ctx).unwrap());

        src.flash_mut().inject_corruption(SETTINGS_SECTOR_ADDRESSES[1], 1);
        assert_eq!(src.sector_state(1).unwrap(), SectorState::Unknown(0xAA));
        assert_eq!(src.read("speed_rate").unwrap(), None);
    }
}
