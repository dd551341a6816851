//! pico_settings_core - Pure no_std data model for the pico_settings store
//!
//! This crate holds everything about settings that does not touch hardware:
//! key checksums, the typed value wrapper, the deduplicating cache and the
//! shared line protocol. Storage backends live in the `pico_settings` crate
//! and feed this model through [`line::ByteSource`].
//!
//! # Modules
//!
//! - [`checksum`]: Fletcher-16 key hashing and key triplets
//! - [`value`]: Typed value wrapper with lazy accessors
//! - [`cache`]: Insertion-ordered, key-deduplicated value cache
//! - [`line`]: Buffered line cursor and `key value` line parser
//! - [`error`]: Configuration error type

#![no_std]

pub mod cache;
pub mod checksum;
pub mod error;
pub mod line;
pub mod value;

pub use cache::{ConfigCache, InstanceList, MAX_CONFIG_VALUES, MAX_INSTANCES};
pub use checksum::{checksum, KeyTriplet, KEY_SEPARATOR};
pub use error::ConfigError;
pub use line::{ByteSource, ConfigLine, LineCursor, RawLine, END_MARKER, MAX_LINE_LEN};
pub use value::{ConfigValue, DefaultValue, ValueText, MAX_VALUE_LEN};
