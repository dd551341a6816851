//! Flash interface trait
//!
//! This module defines the Flash primitive the flash settings source is
//! built on.

use crate::platform::Result;

/// Flash interface trait
///
/// Platform implementations must provide this interface for Flash
/// read/write/erase operations.
///
/// # Flash Characteristics
///
/// - Flash is organized in blocks (typically 4 KB on RP2040/RP2350)
/// - Erase operations set all bytes to 0xFF
/// - Write operations can only change bits from 1→0 (must erase first to reset to 1)
/// - Erase and write are blocking and can take milliseconds
///
/// # Memory Layout (RP2040/RP2350)
///
/// ```text
/// [Firmware]           0x000000 - 0x040000 (256 KB) - DO NOT WRITE
/// [Settings Sector 0]  0x040000 - 0x041000 (4 KB)
/// [Settings Sector 1]  0x041000 - 0x042000 (4 KB)
/// ```
pub trait FlashInterface {
    /// Read `buf.len()` bytes starting at `address`
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the range is out of bounds.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Program `data` starting at `address`
    ///
    /// The target range must have been erased; programming only clears bits.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the range is protected.
    /// Returns `PlatformError::Flash(FlashError::WriteFailed)` if the program operation fails.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase `size` bytes starting at `address`, setting them to 0xFF
    ///
    /// Address and size must be multiples of [`block_size`](Self::block_size).
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the range is
    /// protected or unaligned.
    /// Returns `PlatformError::Flash(FlashError::EraseFailed)` if the erase operation fails.
    fn erase(&mut self, address: u32, size: u32) -> Result<()>;

    /// Minimum erasable unit size
    fn block_size(&self) -> u32;

    /// Total Flash capacity in bytes
    fn capacity(&self) -> u32;
}

impl<F: FlashInterface + ?Sized> FlashInterface for &mut F {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read(address, buf)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        (**self).write(address, data)
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        (**self).erase(address, size)
    }

    fn block_size(&self) -> u32 {
        (**self).block_size()
    }

    fn capacity(&self) -> u32 {
        (**self).capacity()
    }
}
