//! Internal (non-leaf) node: a leftmost child pointer followed by sorted
//! `(key, child)` separators.

use crate::common::config::{COUNT_SIZE, INTERNAL_ENTRY_SIZE, INTERNAL_MAX_KEYS, PAGE_ID_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PageFile;

use super::codec;

/// An internal page viewed as a leftmost pointer plus a separator array.
///
/// # Layout
/// ```text
/// Offset     Size  Field
/// ------     ----  -----
/// 0          4     key_count
/// 4          4     leftmost child PageId
/// 8 + 8*i    4     entry[i].key (i32)
/// 12 + 8*i   4     entry[i].child PageId
/// ```
///
/// # Routing
/// The leftmost child holds keys `< entry[0].key`; `entry[i].child` holds
/// keys in `[entry[i].key, entry[i+1].key)`, and the last child everything
/// from its key upward. [`locate_child_ptr`](Self::locate_child_ptr) is the
/// only routing rule; insert and search descent both go through it.
pub struct InternalNode {
    page: Page,
    max_keys: usize,
}

impl InternalNode {
    const OFFSET_LEFTMOST: usize = COUNT_SIZE;
    const OFFSET_ENTRIES: usize = COUNT_SIZE + PAGE_ID_SIZE;

    /// Create an empty node that splits once it holds `max_keys` entries.
    pub fn new(max_keys: usize) -> Self {
        let mut node = Self {
            page: Page::new(),
            max_keys: max_keys.min(INTERNAL_MAX_KEYS),
        };
        node.set_leftmost(PageId::INVALID);
        node
    }

    /// Load the node stored at `page_id`.
    pub fn read(page_id: PageId, pf: &PageFile, max_keys: usize) -> Result<Self> {
        let mut node = Self {
            page: Page::new(),
            max_keys: max_keys.min(INTERNAL_MAX_KEYS),
        };
        pf.read(page_id, &mut node.page)?;
        Ok(node)
    }

    /// Store this node at `page_id`.
    pub fn write(&self, page_id: PageId, pf: &PageFile) -> Result<()> {
        pf.write(page_id, &self.page)
    }

    #[inline]
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    pub fn key_count(&self) -> usize {
        codec::key_count(&self.page, INTERNAL_MAX_KEYS)
    }

    /// Index of the rightmost entry whose key is `<= search_key`.
    ///
    /// Returns `None` if `search_key` is below every key, meaning the
    /// leftmost pointer covers it.
    pub fn locate(&self, search_key: i32) -> Option<usize> {
        let (mut lo, mut hi) = (0, self.key_count());
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.key_at(mid) <= search_key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo.checked_sub(1)
    }

    /// Child pointer for an entry index from [`locate`](Self::locate).
    ///
    /// `None` selects the leftmost pointer.
    ///
    /// # Errors
    /// Returns `Error::EntryOutOfRange` if `eid >= key_count()`.
    pub fn read_entry(&self, eid: Option<usize>) -> Result<PageId> {
        match eid {
            None => Ok(self.leftmost()),
            Some(eid) => {
                let count = self.key_count();
                if eid >= count {
                    return Err(Error::EntryOutOfRange { eid, count });
                }
                Ok(self.child_at(eid))
            }
        }
    }

    /// The child subtree that holds `search_key`.
    pub fn locate_child_ptr(&self, search_key: i32) -> PageId {
        match self.locate(search_key) {
            None => self.leftmost(),
            Some(eid) => self.child_at(eid),
        }
    }

    /// Insert a separator in key order.
    ///
    /// # Errors
    /// Returns `Error::NodeFull` if the node already holds `max_keys` entries.
    pub fn insert(&mut self, key: i32, child: PageId) -> Result<()> {
        let count = self.key_count();
        if count >= self.max_keys {
            return Err(Error::NodeFull);
        }

        let eid = self.insert_position(key);
        self.page.shift(
            Self::entry_offset(eid),
            (count - eid) * INTERNAL_ENTRY_SIZE,
            Self::entry_offset(eid + 1),
        );
        self.put_entry(eid, key, child);
        self.set_key_count(count + 1);
        Ok(())
    }

    /// Insert a separator into a full node and move the upper half to
    /// `sibling`, promoting the middle key.
    ///
    /// Of the `count + 1` separators in key order, the one at
    /// `mid = count / 2` leaves both nodes: its key is returned for the
    /// parent and its child becomes the sibling's leftmost pointer. This
    /// node keeps the separators before `mid`; the sibling gets the ones
    /// after it.
    pub fn insert_and_split(&mut self, key: i32, child: PageId, sibling: &mut InternalNode) -> i32 {
        let count = self.key_count();
        let pos = self.insert_position(key);
        let mid = count / 2;

        let (mid_key, mid_child) = self.merged_entry(mid, pos, (key, child));
        let (first_key, first_child) = self.merged_entry(mid + 1, pos, (key, child));
        sibling.initialize_root(mid_child, first_key, first_child);
        for merged in mid + 2..=count {
            let (k, c) = self.merged_entry(merged, pos, (key, child));
            sibling.put_entry(merged - mid - 1, k, c);
        }
        sibling.set_key_count(count - mid);

        if pos < mid {
            self.page.shift(
                Self::entry_offset(pos),
                (mid - 1 - pos) * INTERNAL_ENTRY_SIZE,
                Self::entry_offset(pos + 1),
            );
            self.put_entry(pos, key, child);
        }
        self.page.zero(
            Self::entry_offset(mid),
            (count - mid) * INTERNAL_ENTRY_SIZE,
        );
        self.set_key_count(mid);

        mid_key
    }

    /// Reset to a single separator: `left` below `key`, `right` from `key` up.
    pub fn initialize_root(&mut self, left: PageId, key: i32, right: PageId) {
        self.page.reset();
        self.set_leftmost(left);
        self.put_entry(0, key, right);
        self.set_key_count(1);
    }

    /// All separator keys in order.
    pub fn keys(&self) -> Vec<i32> {
        (0..self.key_count()).map(|eid| self.key_at(eid)).collect()
    }

    /// All child pointers, leftmost first.
    pub fn children(&self) -> Vec<PageId> {
        std::iter::once(self.leftmost())
            .chain((0..self.key_count()).map(|eid| self.child_at(eid)))
            .collect()
    }

    // ========================================================================
    // Internal: entry encoding
    // ========================================================================

    #[inline]
    fn entry_offset(eid: usize) -> usize {
        Self::OFFSET_ENTRIES + eid * INTERNAL_ENTRY_SIZE
    }

    fn set_key_count(&mut self, count: usize) {
        codec::set_key_count(&mut self.page, count);
    }

    #[inline]
    fn leftmost(&self) -> PageId {
        PageId::new(self.page.u32_at(Self::OFFSET_LEFTMOST))
    }

    fn set_leftmost(&mut self, page_id: PageId) {
        self.page.put_u32(Self::OFFSET_LEFTMOST, page_id.0);
    }

    #[inline]
    fn key_at(&self, eid: usize) -> i32 {
        self.page.i32_at(Self::entry_offset(eid))
    }

    #[inline]
    fn child_at(&self, eid: usize) -> PageId {
        PageId::new(self.page.u32_at(Self::entry_offset(eid) + 4))
    }

    fn put_entry(&mut self, eid: usize, key: i32, child: PageId) {
        let offset = Self::entry_offset(eid);
        self.page.put_i32(offset, key);
        self.page.put_u32(offset + 4, child.0);
    }

    /// Slot `key` goes into: right after the last separator `<= key`.
    fn insert_position(&self, key: i32) -> usize {
        self.locate(key).map_or(0, |eid| eid + 1)
    }

    /// Entry `merged` of the sequence this node would hold with `new`
    /// inserted at `pos`.
    fn merged_entry(&self, merged: usize, pos: usize, new: (i32, PageId)) -> (i32, PageId) {
        match merged.cmp(&pos) {
            std::cmp::Ordering::Less => (self.key_at(merged), self.child_at(merged)),
            std::cmp::Ordering::Equal => new,
            std::cmp::Ordering::Greater => (self.key_at(merged - 1), self.child_at(merged - 1)),
        }
    }
}
