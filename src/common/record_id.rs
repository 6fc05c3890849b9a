//! Record locator type.

use std::fmt;

use crate::common::PageId;

/// Locates a row in the record store: the page it lives on and its slot
/// within that page.
///
/// The index never dereferences a `RecordId`; it only stores and returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u32,
}

impl RecordId {
    /// Encoded size in bytes.
    pub const SIZE: usize = 8;

    #[inline]
    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self { page_id, slot }
    }

    /// Write this locator as `page_id u32 | slot u32`, little-endian.
    ///
    /// # Panics
    /// Panics if `data.len() < RecordId::SIZE`.
    pub(crate) fn write_to(&self, data: &mut [u8]) {
        data[0..4].copy_from_slice(&self.page_id.to_le_bytes());
        data[4..8].copy_from_slice(&self.slot.to_le_bytes());
    }

    /// # Panics
    /// Panics if `data.len() < RecordId::SIZE`.
    pub(crate) fn from_bytes(data: &[u8]) -> Self {
        Self {
            page_id: PageId::from_le_bytes([data[0], data[1], data[2], data[3]]),
            slot: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, slot {})", self.page_id, self.slot)
    }
}
