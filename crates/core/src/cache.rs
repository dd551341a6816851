//! Settings cache
//!
//! The cache is rebuilt on every load pass by replaying each source's lines
//! through [`ConfigCache::insert_or_replace`]. A source loaded later replaces
//! same-keyed values from sources loaded earlier, so load order is priority
//! order.

use crate::checksum::KeyTriplet;
use crate::error::ConfigError;
use crate::value::ConfigValue;
use heapless::Vec;

/// Maximum number of distinct settings held by the cache
pub const MAX_CONFIG_VALUES: usize = 256;

/// Maximum number of instances reported per category
pub const MAX_INSTANCES: usize = 32;

/// Instance checksums found under one category
pub type InstanceList = Vec<u16, MAX_INSTANCES>;

/// Insertion-ordered, key-deduplicated collection of settings
#[derive(Debug, Clone, Default)]
pub struct ConfigCache {
    values: Vec<ConfigValue, MAX_CONFIG_VALUES>,
}

impl ConfigCache {
    /// Create an empty cache
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Insert a value, replacing the first entry whose key matches
    ///
    /// Matching uses [`KeyTriplet::matches`], so no two entries with
    /// matching keys ever coexist.
    pub fn insert_or_replace(&mut self, value: ConfigValue) -> Result<(), ConfigError> {
        let key = value.key();
        if let Some(slot) = self.values.iter_mut().find(|v| v.key().matches(&key)) {
            *slot = value;
            return Ok(());
        }
        self.values.push(value).map_err(|_| ConfigError::CacheFull)
    }

    /// Find the value for a key
    ///
    /// An exact key wins; otherwise the first entry matching under the
    /// partial-prefix rule is returned.
    pub fn lookup(&self, key: &KeyTriplet) -> Option<&ConfigValue> {
        self.values
            .iter()
            .find(|v| v.key() == *key)
            .or_else(|| self.values.iter().find(|v| v.key().matches(key)))
    }

    /// Distinct non-zero instance checksums under a category
    pub fn instances_of(&self, category: u16) -> InstanceList {
        let mut instances = InstanceList::new();
        for key in self.values.iter().map(ConfigValue::key) {
            let instance = key.instance();
            if key.category() != category || instance == 0 || instances.contains(&instance) {
                continue;
            }
            if instances.push(instance).is_err() {
                break;
            }
        }
        instances
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValue> {
        self.values.iter()
    }
}
