//! Platform abstraction layer
//!
//! Storage primitives the settings sources are built on. Hardware drivers
//! implement [`FlashInterface`] and [`FileInterface`]; host builds get a
//! `std::fs` file implementation and, for tests, in-memory doubles.

pub mod context;
pub mod error;
pub mod traits;

#[cfg(feature = "std")]
pub mod host;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use context::BlockingContext;
pub use error::{FileError, FlashError, PlatformError, Result};
pub use traits::{FileInterface, FlashInterface};
