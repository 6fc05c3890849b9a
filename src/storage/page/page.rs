//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw 4KB byte array that serves as the unit of I/O
//! between the index file and memory. Tree nodes are views over a page.

use crate::common::config::PAGE_SIZE;

/// A page of data (4KB, 4KB-aligned).
///
/// # Byte Order
/// All multi-byte fields are encoded little-endian regardless of host, so an
/// index file is portable between machines.
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code (copying 4KB should
/// be explicit). A `#[cfg(test)]` Clone is provided for tests.
///
/// # Example
/// ```
/// use pageindex::storage::page::Page;
///
/// let mut page = Page::new();
/// page.put_u32(8, 0xDEADBEEF);
/// assert_eq!(page.u32_at(8), 0xDEADBEEF);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Get the size of a page.
    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }

    /// Read a little-endian `u32` at `offset`.
    ///
    /// # Panics
    /// Panics if `offset + 4 > PAGE_SIZE`.
    #[inline]
    pub fn u32_at(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Write a little-endian `u32` at `offset`.
    #[inline]
    pub fn put_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Read a little-endian `i32` at `offset`.
    #[inline]
    pub fn i32_at(&self, offset: usize) -> i32 {
        self.u32_at(offset) as i32
    }

    /// Write a little-endian `i32` at `offset`.
    #[inline]
    pub fn put_i32(&mut self, offset: usize, value: i32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Move `len` bytes starting at `src` so they start at `dest`.
    ///
    /// The ranges may overlap.
    #[inline]
    pub fn shift(&mut self, src: usize, len: usize, dest: usize) {
        self.data.copy_within(src..src + len, dest);
    }

    /// Zero `len` bytes starting at `offset`.
    #[inline]
    pub fn zero(&mut self, offset: usize, len: usize) {
        self.data[offset..offset + len].fill(0);
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.data.copy_from_slice(&self.data);
        new_page
    }
}

// ============================================================================
// TESTS
// ============================================================================
