//! Mock platform implementation for testing
//!
//! In-memory doubles of the storage primitives, used by unit tests and by
//! host integration tests.
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! ```
//! use pico_settings::platform::mock::MockFiles;
//! use pico_settings::platform::traits::FileInterface;
//!
//! let mut files = MockFiles::new();
//! files.insert("/sd/config", b"speed_rate 100\n");
//! assert!(files.exists("/sd/config"));
//! ```

mod file;
mod flash;

pub use file::MockFiles;
pub use flash::MockFlash;
