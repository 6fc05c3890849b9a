//! Configuration for pageindex.
//!
//! Page geometry is fixed at compile time; node fan-out and write
//! durability are chosen per index through [`IndexConfig`].

use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// # Memory Layout
/// With 4KB pages and 32-bit PageIds:
/// - Max pages: 2^32 - 1 (`u32::MAX` is reserved as the invalid id)
/// - Max index size: just under 16TB
pub const PAGE_SIZE: usize = 4096;

/// Size of an encoded key (`i32`).
pub const KEY_SIZE: usize = 4;

/// Size of an encoded page id (`u32`).
pub const PAGE_ID_SIZE: usize = 4;

/// Size of the per-node entry count field.
pub const COUNT_SIZE: usize = 4;

/// Size of one leaf entry: key + record id (page id + slot).
pub const LEAF_ENTRY_SIZE: usize = KEY_SIZE + PAGE_ID_SIZE + 4;

/// Size of one internal entry: key + child page id.
pub const INTERNAL_ENTRY_SIZE: usize = KEY_SIZE + PAGE_ID_SIZE;

/// Most entries a leaf page can physically hold.
///
/// The page carries a count header and a trailing next-leaf pointer.
pub const LEAF_MAX_KEYS: usize = (PAGE_SIZE - COUNT_SIZE - PAGE_ID_SIZE) / LEAF_ENTRY_SIZE;

/// Most entries an internal page can physically hold.
///
/// The page carries a count header and a leading child pointer.
pub const INTERNAL_MAX_KEYS: usize =
    (PAGE_SIZE - COUNT_SIZE - PAGE_ID_SIZE) / INTERNAL_ENTRY_SIZE;

/// Smallest fan-out accepted for either node kind.
///
/// With fewer than two entries an internal split would leave a node with
/// only its leftmost pointer.
pub const MIN_NODE_KEYS: usize = 2;

/// How the backing file is opened.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Reads only. The file must already exist.
    ReadOnly,
    /// Reads and writes. The file is created if it does not exist.
    #[default]
    ReadWrite,
}

impl OpenMode {
    /// Whether this mode permits page writes.
    #[inline]
    pub fn is_writable(self) -> bool {
        self == OpenMode::ReadWrite
    }
}

/// Per-index tuning knobs.
///
/// # Example
/// ```
/// use pageindex::IndexConfig;
///
/// let config = IndexConfig::default()
///     .with_max_leaf_keys(3)
///     .with_max_internal_keys(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Entries a leaf holds before it splits.
    pub max_leaf_keys: usize,
    /// Entries an internal node holds before it splits.
    pub max_internal_keys: usize,
    /// Call `fsync()` after every page write instead of only on flush/close.
    pub sync_on_write: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_leaf_keys: LEAF_MAX_KEYS,
            max_internal_keys: INTERNAL_MAX_KEYS,
            sync_on_write: false,
        }
    }
}

impl IndexConfig {
    pub fn with_max_leaf_keys(mut self, max: usize) -> Self {
        self.max_leaf_keys = max;
        self
    }

    pub fn with_max_internal_keys(mut self, max: usize) -> Self {
        self.max_internal_keys = max;
        self
    }

    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Check the fan-out against the page geometry.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if either capacity is below
    /// [`MIN_NODE_KEYS`] or does not fit in a page.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_NODE_KEYS..=LEAF_MAX_KEYS).contains(&self.max_leaf_keys) {
            return Err(Error::InvalidConfig(format!(
                "max_leaf_keys must be in {}..={}, got {}",
                MIN_NODE_KEYS, LEAF_MAX_KEYS, self.max_leaf_keys
            )));
        }
        if !(MIN_NODE_KEYS..=INTERNAL_MAX_KEYS).contains(&self.max_internal_keys) {
            return Err(Error::InvalidConfig(format!(
                "max_internal_keys must be in {}..={}, got {}",
                MIN_NODE_KEYS, INTERNAL_MAX_KEYS, self.max_internal_keys
            )));
        }
        Ok(())
    }
}
