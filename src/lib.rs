#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! pico_settings - Checksum-keyed settings store for Raspberry Pi Pico firmware
//!
//! Settings come from three places, loaded in priority order into one cache:
//! defaults compiled into the firmware image, a `key value` text file on the
//! SD card, and a pair of raw flash sectors written at runtime. The key
//! hashing, value and cache types live in `pico_settings_core` and are
//! re-exported here.

// Logging macros (exported at crate root)
pub mod logging;

// Storage primitives: flash, files, blocking capability
pub mod platform;

// Settings sources, orchestrator and console commands
pub mod config;

pub use config::{ConfigSource, Settings, SettingsError};
pub use pico_settings_core::{checksum, ConfigCache, ConfigError, ConfigValue, DefaultValue, KeyTriplet};
