//! Configuration error types
//!
//! Errors raised while interpreting settings text. `InvalidNumber` and
//! `MissingRequired` mean the configuration itself is unusable; callers are
//! expected to stop booting rather than continue with a guessed value.

use crate::checksum::KeyTriplet;

/// Errors from settings interpretation and caching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Value could not be read as a number and no default was supplied
    InvalidNumber(KeyTriplet),
    /// Mandatory setting is absent and has no default
    MissingRequired(KeyTriplet),
    /// Raw value text exceeds the value buffer
    ValueTooLong,
    /// Cache has no room for another distinct key
    CacheFull,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::InvalidNumber(key) => write!(f, "setting {} is not a number", key),
            ConfigError::MissingRequired(key) => write!(f, "required setting {} is missing", key),
            ConfigError::ValueTooLong => write!(f, "setting value too long"),
            ConfigError::CacheFull => write!(f, "settings cache full"),
        }
    }
}

impl core::error::Error for ConfigError {}
