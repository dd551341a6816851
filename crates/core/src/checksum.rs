//! Key checksums
//!
//! Settings are addressed by up to three 16-bit checksums instead of by
//! their text, so lookups compare integers rather than strings.
//!
//! # Key paths
//!
//! A key path such as `temperature_control.hotend.enable` (as written in a
//! settings file) or `temperature_control hotend enable` (as passed by code)
//! is split on whitespace and `.` into category, instance and parameter
//! tokens. Missing trailing tokens leave their slot at zero.
//!
//! Collisions are possible in a 16-bit space and are not detected.

/// Byte appended to every token before hashing
pub const KEY_SEPARATOR: u8 = b' ';

/// Number of slots in a key triplet
const KEY_SLOTS: usize = 3;

/// Compute the Fletcher-16 checksum of a single key token
///
/// The token is hashed followed by [`KEY_SEPARATOR`], matching the way tokens
/// are delimited in a key path.
///
/// # Example
///
/// ```
/// use pico_settings_core::checksum;
///
/// assert_eq!(checksum("speed_rate"), 0x1B40);
/// ```
pub fn checksum(token: &str) -> u16 {
    let mut sum1: u16 = 0;
    let mut sum2: u16 = 0;
    for byte in token.bytes().chain(core::iter::once(KEY_SEPARATOR)) {
        sum1 = (sum1 + u16::from(byte)) % 255;
        sum2 = (sum2 + sum1) % 255;
    }
    (sum2 << 8) | sum1
}

/// Hierarchical setting key: category, instance and parameter checksums
///
/// Unused trailing slots are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyTriplet([u16; KEY_SLOTS]);

impl KeyTriplet {
    /// Build a triplet from raw checksums
    pub const fn new(category: u16, instance: u16, parameter: u16) -> Self {
        Self([category, instance, parameter])
    }

    /// Hash a key path into a triplet
    ///
    /// Tokens are separated by whitespace or `.`; empty tokens are skipped
    /// and anything past the third token is ignored.
    pub fn from_path(path: &str) -> Self {
        let mut slots = [0u16; KEY_SLOTS];
        let tokens = path
            .split(|c: char| c.is_ascii_whitespace() || c == '.')
            .filter(|token| !token.is_empty());
        for (slot, token) in slots.iter_mut().zip(tokens) {
            *slot = checksum(token);
        }
        Self(slots)
    }

    /// Category checksum (first slot)
    pub fn category(&self) -> u16 {
        self.0[0]
    }

    /// Instance checksum (second slot)
    pub fn instance(&self) -> u16 {
        self.0[1]
    }

    /// Parameter checksum (third slot)
    pub fn parameter(&self) -> u16 {
        self.0[2]
    }

    /// All three slots
    pub fn slots(&self) -> [u16; KEY_SLOTS] {
        self.0
    }

    /// True when no slot is set
    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// Partial-prefix key comparison
    ///
    /// Slots are compared pairwise until either key reaches a zero slot, so
    /// a category-only key matches every instance and parameter of that
    /// category.
    pub fn matches(&self, other: &KeyTriplet) -> bool {
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            if *a == 0 || *b == 0 {
                break;
            }
            if a != b {
                return false;
            }
        }
        true
    }
}

impl core::fmt::Display for KeyTriplet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04x}:{:04x}:{:04x}", self.0[0], self.0[1], self.0[2])
    }
}
