//! Mock Flash implementation for testing
//!
//! Provides in-memory Flash simulation for unit tests.

use crate::platform::{error::FlashError, traits::FlashInterface, Result};
use std::vec::Vec;

/// Flash block size (4 KB)
const BLOCK_SIZE: u32 = 4096;

/// Flash capacity (512 KB is enough for firmware + settings sectors)
const FLASH_CAPACITY: u32 = 512 * 1024;

/// Minimum firmware size (protect first 256 KB)
const FIRMWARE_SIZE: u32 = 0x40000;

/// Mock Flash implementation
///
/// Simulates NOR Flash in memory. Supports:
/// - Read/write/erase operations with 1→0 programming semantics
/// - Corruption injection
/// - Erase count tracking
/// - Torn writes and power cuts after a number of operations
///
/// # Example
///
/// ```
/// use pico_settings::platform::mock::MockFlash;
/// use pico_settings::platform::traits::FlashInterface;
///
/// let mut flash = MockFlash::new();
///
/// flash.erase(0x040000, 4096).unwrap();
/// flash.write(0x040000, b"speed_rate 100\n").unwrap();
///
/// let mut buf = [0u8; 10];
/// flash.read(0x040000, &mut buf).unwrap();
/// assert_eq!(&buf, b"speed_rate");
/// assert_eq!(flash.get_erase_count(0x040000), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockFlash {
    /// Flash storage (initialized to 0xFF - erased state)
    storage: Vec<u8>,
    /// Erase count per block
    erase_counts: Vec<u32>,
    /// Next write only programs half its bytes
    torn_write: bool,
    /// Remaining write/erase operations before power is cut
    ops_until_power_cut: Option<u32>,
    /// Total write calls that reached the array
    write_count: u32,
}

impl MockFlash {
    /// Create a new mock Flash instance
    pub fn new() -> Self {
        let block_count = (FLASH_CAPACITY / BLOCK_SIZE) as usize;

        Self {
            storage: vec![0xFF; FLASH_CAPACITY as usize],
            erase_counts: vec![0; block_count],
            torn_write: false,
            ops_until_power_cut: None,
            write_count: 0,
        }
    }

    /// Get Flash contents (for test verification)
    pub fn get_contents(&self, address: u32, len: usize) -> Vec<u8> {
        self.storage[address as usize..(address as usize + len)].to_vec()
    }

    /// Overwrite bytes with a fixed pattern, ignoring Flash semantics
    pub fn inject_corruption(&mut self, address: u32, len: usize) {
        for byte in &mut self.storage[address as usize..address as usize + len] {
            *byte = 0xAA;
        }
    }

    /// Number of times the block containing `address` has been erased
    pub fn get_erase_count(&self, address: u32) -> u32 {
        self.erase_counts[(address / BLOCK_SIZE) as usize]
    }

    /// Total erase count across all blocks
    pub fn get_total_erase_count(&self) -> u32 {
        self.erase_counts.iter().sum()
    }

    /// Number of successful write calls
    pub fn get_write_count(&self) -> u32 {
        self.write_count
    }

    /// Make the next write program only the first half of its data
    pub fn simulate_power_loss(&mut self) {
        self.torn_write = true;
    }

    /// Let `ops` more write/erase operations succeed, then fail all others
    ///
    /// Models power disappearing part-way through a multi-step update.
    pub fn cut_power_after(&mut self, ops: u32) {
        self.ops_until_power_cut = Some(ops);
    }

    /// Undo [`cut_power_after`](Self::cut_power_after) (simulated reboot)
    pub fn restore_power(&mut self) {
        self.ops_until_power_cut = None;
    }

    /// Consume one operation from the power budget
    fn has_power(&mut self) -> bool {
        match self.ops_until_power_cut {
            Some(0) => false,
            Some(ref mut remaining) => {
                *remaining -= 1;
                true
            }
            None => true,
        }
    }

    fn is_writable(&self, address: u32) -> bool {
        (FIRMWARE_SIZE..FLASH_CAPACITY).contains(&address)
    }

    fn is_block_aligned(&self, address: u32) -> bool {
        address.is_multiple_of(BLOCK_SIZE)
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashInterface for MockFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        if address as usize + buf.len() > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }

        buf.copy_from_slice(&self.storage[address as usize..address as usize + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        if !self.is_writable(address) || address as usize + data.len() > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }
        if !self.has_power() {
            return Err(FlashError::WriteFailed.into());
        }

        let write_len = if self.torn_write {
            self.torn_write = false;
            data.len() / 2
        } else {
            data.len()
        };

        // Programming can only clear bits
        let target = &mut self.storage[address as usize..address as usize + write_len];
        for (cell, byte) in target.iter_mut().zip(data) {
            *cell &= byte;
        }
        self.write_count += 1;

        Ok(())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if !self.is_writable(address)
            || !self.is_block_aligned(address)
            || !size.is_multiple_of(BLOCK_SIZE)
            || address + size > FLASH_CAPACITY
        {
            return Err(FlashError::InvalidAddress.into());
        }
        if !self.has_power() {
            return Err(FlashError::EraseFailed.into());
        }

        self.storage[address as usize..(address + size) as usize].fill(0xFF);

        let start_block = (address / BLOCK_SIZE) as usize;
        let block_count = (size / BLOCK_SIZE) as usize;
        for count in &mut self.erase_counts[start_block..start_block + block_count] {
            *count += 1;
        }

        Ok(())
    }

    fn block_size(&self) -> u32 {
        BLOCK_SIZE
    }

    fn capacity(&self) -> u32 {
        FLASH_CAPACITY
    }
}
