//! Collection presets and storage settings.

use std::num::NonZeroUsize;

/// Durable key of the favorites shortlist.
pub const FAVORITES_KEY: &str = "favoriteManufacturers";

/// Durable key of the side-by-side compare list.
pub const COMPARE_KEY: &str = "compareManufacturers";

/// Maximum number of listings the compare view can show at once.
pub const COMPARE_CAPACITY: usize = 3;

/// Name of the LMDB database holding every slot.
pub const SLOT_DB_NAME: &str = "slots";

/// Suffix of the directory an LMDB environment lives in.
pub const SLOT_DIR_SUFFIX: &str = ".lmdb";

/// How one toggled collection is stored and bounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    /// Durable slot key.
    pub key: String,
    /// Human wording used in notices ("favorites", "compare list").
    pub label: String,
    /// `None` means unbounded.
    pub capacity: Option<NonZeroUsize>,
}

impl CollectionConfig {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            capacity: None,
        }
    }

    /// Caps the collection. A zero capacity leaves it unbounded.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = NonZeroUsize::new(capacity);
        self
    }

    pub fn favorites() -> Self {
        Self::new(FAVORITES_KEY, "favorites")
    }

    pub fn compare() -> Self {
        Self::new(COMPARE_KEY, "compare list").with_capacity(COMPARE_CAPACITY)
    }

    /// Config for an arbitrary slot key, borrowing the preset label when the
    /// key is one of the known shortlists. Capacity is left unbounded.
    pub fn for_key(key: &str) -> Self {
        let label = match key {
            FAVORITES_KEY => "favorites",
            COMPARE_KEY => "compare list",
            other => other,
        };
        Self::new(key, label)
    }
}

/// LMDB environment settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDbConfig {
    /// Upper bound of the memory map, in bytes.
    pub map_size: usize,
    pub max_dbs: u32,
}

impl Default for SlotDbConfig {
    fn default() -> Self {
        Self {
            // 10 MiB is plenty for a handful of JSON arrays.
            map_size: 10 * 1024 * 1024,
            max_dbs: 4,
        }
    }
}
