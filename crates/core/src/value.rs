//! Typed value wrapper
//!
//! A [`ConfigValue`] carries the raw text of one setting and converts it on
//! demand. Nothing is parsed ahead of time: the cache only stores text, and a
//! number is produced when a caller asks for one.

use crate::checksum::KeyTriplet;
use crate::error::ConfigError;
use crate::line::ConfigLine;
use heapless::String;

/// Maximum length of a raw setting value
pub const MAX_VALUE_LEN: usize = 64;

/// Raw setting text
pub type ValueText = String<MAX_VALUE_LEN>;

/// Characters kept when reading a value as a number
const NUMBER_CHARS: &[u8] = b"0123456789.-";

/// Caller-supplied fallback for a setting that no source defines
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DefaultValue {
    /// Numeric default
    Number(f32),
    /// Boolean default
    Bool(bool),
    /// Text default
    Text(&'static str),
}

impl From<f32> for DefaultValue {
    fn from(value: f32) -> Self {
        DefaultValue::Number(value)
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        DefaultValue::Number(value as f32)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        DefaultValue::Number(value as f32)
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        DefaultValue::Bool(value)
    }
}

impl From<&'static str> for DefaultValue {
    fn from(value: &'static str) -> Self {
        DefaultValue::Text(value)
    }
}

/// One discovered or defaulted setting
///
/// # Example
///
/// ```
/// use pico_settings_core::{ConfigValue, KeyTriplet};
///
/// let missing = ConfigValue::missing(KeyTriplet::from_path("acceleration"));
/// assert_eq!(missing.with_default(3000.0).as_number(), Ok(3000.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue {
    key: KeyTriplet,
    value: ValueText,
    found: bool,
    default: Option<DefaultValue>,
}

impl ConfigValue {
    /// Create a value that was found in a source
    pub fn found(key: KeyTriplet, text: &str) -> Result<Self, ConfigError> {
        let value = ValueText::try_from(text).map_err(|_| ConfigError::ValueTooLong)?;
        Ok(Self {
            key,
            value,
            found: true,
            default: None,
        })
    }

    /// Create a value from a parsed `key value` line
    pub fn from_line(line: &ConfigLine<'_>) -> Result<Self, ConfigError> {
        Self::found(KeyTriplet::from_path(line.key), line.value)
    }

    /// Synthesize a value for a key no source defines
    pub fn missing(key: KeyTriplet) -> Self {
        Self {
            key,
            value: ValueText::new(),
            found: false,
            default: None,
        }
    }

    /// Attach a default used when the setting was not found
    pub fn with_default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Key this value is stored under
    pub fn key(&self) -> KeyTriplet {
        self.key
    }

    /// True if a source defined this setting
    pub fn is_found(&self) -> bool {
        self.found
    }

    /// Default attached by the caller, if any
    pub fn default_value(&self) -> Option<DefaultValue> {
        self.default
    }

    /// Fail unless the setting was found or has a default
    pub fn required(&self) -> Result<&Self, ConfigError> {
        if self.found || self.default.is_some() {
            Ok(self)
        } else {
            Err(ConfigError::MissingRequired(self.key))
        }
    }

    /// Read the setting as a number
    ///
    /// Characters other than digits, `.` and `-` are discarded before
    /// parsing, so `"200mm"` reads as `200`.
    pub fn as_number(&self) -> Result<f32, ConfigError> {
        if self.found {
            return parse_number(&self.value).ok_or(ConfigError::InvalidNumber(self.key));
        }
        match self.default {
            Some(DefaultValue::Number(n)) => Ok(n),
            Some(DefaultValue::Bool(b)) => Ok(if b { 1.0 } else { 0.0 }),
            Some(DefaultValue::Text(text)) => {
                parse_number(text).ok_or(ConfigError::InvalidNumber(self.key))
            }
            None => Err(ConfigError::InvalidNumber(self.key)),
        }
    }

    /// Read the setting as an integer, truncating toward zero
    pub fn as_int(&self) -> Result<i32, ConfigError> {
        self.as_number().map(|n| n as i32)
    }

    /// Raw text, the text default, or an empty string
    pub fn as_string(&self) -> &str {
        if self.found {
            return &self.value;
        }
        match self.default {
            Some(DefaultValue::Text(text)) => text,
            _ => "",
        }
    }

    /// Read the setting as a flag
    ///
    /// Any value containing `t` or `1` is true (`true`, `t`, `1`, `on_t`).
    pub fn as_bool(&self) -> bool {
        if self.found {
            return truthy(&self.value);
        }
        match self.default {
            Some(DefaultValue::Bool(b)) => b,
            Some(DefaultValue::Number(n)) => n != 0.0,
            Some(DefaultValue::Text(text)) => truthy(text),
            None => false,
        }
    }
}

fn truthy(text: &str) -> bool {
    text.bytes().any(|b| b == b't' || b == b'1')
}

/// Parse the leading `-?digits[.digits]` run after stripping non-numeric
/// characters
fn parse_number(text: &str) -> Option<f32> {
    let mut digits = String::<MAX_VALUE_LEN>::new();
    for byte in text.bytes().filter(|b| NUMBER_CHARS.contains(b)) {
        digits.push(byte as char).ok()?;
    }

    let bytes = digits.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut seen_digit = end > int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || seen_digit {
            seen_digit |= frac_end > frac_start;
            end = frac_end;
        }
    }

    if !seen_digit {
        return None;
    }
    digits[..end].parse::<f32>().ok()
}
