//! Encoding shared by leaf and internal pages.
//!
//! Both node kinds start with a little-endian `u32` entry count. Storing
//! the count explicitly (rather than scanning for an empty slot) keeps
//! every `i32`, including 0, usable as a key.

use crate::storage::page::Page;

pub(crate) const OFFSET_KEY_COUNT: usize = 0;

/// Stored entry count, clamped to the physical capacity of the page kind.
///
/// The clamp keeps a damaged count from indexing past the page.
#[inline]
pub(crate) fn key_count(page: &Page, capacity: usize) -> usize {
    (page.u32_at(OFFSET_KEY_COUNT) as usize).min(capacity)
}

#[inline]
pub(crate) fn set_key_count(page: &mut Page, count: usize) {
    page.put_u32(OFFSET_KEY_COUNT, count as u32);
}
