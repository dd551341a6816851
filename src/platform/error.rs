//! Platform error types
//!
//! This module defines error types for the storage primitives the settings
//! sources sit on.

use core::fmt;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
///
/// Flash and file implementations map their driver-specific errors to these
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlatformError {
    /// Flash operation failed
    Flash(FlashError),
    /// File operation failed
    File(FileError),
}

/// Flash-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Erase operation failed
    EraseFailed,
    /// Write operation failed
    WriteFailed,
    /// Read operation failed
    ReadFailed,
    /// Invalid address (out of bounds, unaligned, or protected)
    InvalidAddress,
}

/// File-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileError {
    /// File does not exist
    NotFound,
    /// Read operation failed
    ReadFailed,
    /// Write operation failed
    WriteFailed,
    /// Write would extend past the end of the file
    OutOfBounds,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Flash(e) => write!(f, "Flash error: {:?}", e),
            PlatformError::File(e) => write!(f, "File error: {:?}", e),
        }
    }
}

impl core::error::Error for PlatformError {}

impl From<FlashError> for PlatformError {
    fn from(error: FlashError) -> Self {
        PlatformError::Flash(error)
    }
}

impl From<FileError> for PlatformError {
    fn from(error: FileError) -> Self {
        PlatformError::File(error)
    }
}
