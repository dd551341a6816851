//! Settings sources and the consumer API
//!
//! - [`source`]: the contract every backing store implements
//! - [`file`], [`firmware`], [`flash`]: the three backing stores
//! - [`settings`]: cache plus ordered sources, the API the rest of the
//!   firmware reads settings through
//! - [`configurator`]: console commands on top of [`Settings`]

pub mod configurator;
pub mod error;
pub mod file;
pub mod firmware;
pub mod flash;
pub mod settings;
pub mod source;

pub use configurator::{execute, Command};
pub use error::SettingsError;
pub use file::{FileSource, DEFAULT_CONFIG_PATH, DEFAULT_FILE_SOURCE_NAME};
pub use firmware::{FirmwareSource, DEFAULT_FIRMWARE_SOURCE_NAME};
pub use flash::{
    FlashSource, FlashSourceStats, SectorState, DEFAULT_FLASH_SOURCE_NAME, SECTOR_BLANK, SECTOR_DATA_SIZE,
    SECTOR_HEADER_SIZE, SECTOR_SIZE, SECTOR_VALID, SETTINGS_SECTOR_ADDRESSES,
};
pub use settings::{Settings, MAX_SOURCES};
pub use source::{ConfigSource, SourceFlags};
