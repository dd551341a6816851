//! Host platform implementation
//!
//! Storage primitives backed by the host operating system, for running the
//! settings store on a development machine or in a simulator.

mod file;

pub use file::HostFiles;
