//! Settings error type

use crate::platform::PlatformError;
use pico_settings_core::ConfigError;

/// Errors from settings sources and the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Storage primitive failed
    #[error("storage failure: {0}")]
    Platform(#[from] PlatformError),

    /// Settings text could not be interpreted or cached
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No registered source answers to this name checksum
    #[error("no settings source with name checksum {0:04x}")]
    SourceNotFound(u16),

    /// Source list is full
    #[error("too many settings sources")]
    TooManySources,

    /// Flash sector budget exhausted; the previous sector is still current
    #[error("flash settings sector full")]
    SectorFull,
}

impl From<core::convert::Infallible> for SettingsError {
    fn from(never: core::convert::Infallible) -> Self {
        match never {}
    }
}
