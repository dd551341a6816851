//! Platform abstraction traits
//!
//! This module defines the storage traits that platform implementations must
//! provide.

pub mod file;
pub mod flash;

// Re-export trait interfaces
pub use file::FileInterface;
pub use flash::FlashInterface;
