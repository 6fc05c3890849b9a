//! Leaf node: sorted `(key, RecordId)` entries plus a next-leaf pointer.

use crate::common::config::{COUNT_SIZE, LEAF_ENTRY_SIZE, LEAF_MAX_KEYS, PAGE_ID_SIZE, PAGE_SIZE};
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::page::Page;
use crate::storage::PageFile;

use super::codec;

/// A leaf page viewed as a sorted entry array.
///
/// # Layout
/// ```text
/// Offset            Size  Field
/// ------            ----  -----
/// 0                 4     key_count
/// 4 + 12*i          4     entry[i].key (i32)
/// 8 + 12*i          8     entry[i].rid (page_id u32, slot u32)
/// PAGE_SIZE - 4     4     next leaf PageId (INVALID at the end of the chain)
/// ```
///
/// Entries are kept sorted ascending by key with no duplicates. The node
/// only lives in memory between a page read and a page write.
pub struct LeafNode {
    page: Page,
    max_keys: usize,
}

impl LeafNode {
    const OFFSET_ENTRIES: usize = COUNT_SIZE;
    const OFFSET_NEXT: usize = PAGE_SIZE - PAGE_ID_SIZE;

    /// Create an empty leaf that splits once it holds `max_keys` entries.
    ///
    /// `max_keys` is clamped to what fits in a page.
    pub fn new(max_keys: usize) -> Self {
        let mut node = Self {
            page: Page::new(),
            max_keys: max_keys.min(LEAF_MAX_KEYS),
        };
        node.set_next_node_ptr(PageId::INVALID);
        node
    }

    /// Load the leaf stored at `page_id`.
    pub fn read(page_id: PageId, pf: &PageFile, max_keys: usize) -> Result<Self> {
        let mut node = Self {
            page: Page::new(),
            max_keys: max_keys.min(LEAF_MAX_KEYS),
        };
        pf.read(page_id, &mut node.page)?;
        Ok(node)
    }

    /// Store this leaf at `page_id`.
    pub fn write(&self, page_id: PageId, pf: &PageFile) -> Result<()> {
        pf.write(page_id, &self.page)
    }

    #[inline]
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    /// Number of entries in the node.
    pub fn key_count(&self) -> usize {
        codec::key_count(&self.page, LEAF_MAX_KEYS)
    }

    /// Index of the first entry whose key is `>= search_key`.
    ///
    /// Returns `None` if every key is smaller, in which case the key belongs
    /// at the end of the node.
    pub fn locate(&self, search_key: i32) -> Option<usize> {
        let count = self.key_count();
        let (mut lo, mut hi) = (0, count);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.key_at(mid) < search_key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        (lo < count).then_some(lo)
    }

    /// Insert an entry in key order.
    ///
    /// # Errors
    /// - `Error::NodeFull` if the node already holds `max_keys` entries
    /// - `Error::DuplicateKey` if `key` is already present
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        let count = self.key_count();
        if count >= self.max_keys {
            return Err(Error::NodeFull);
        }

        let eid = self.insert_position(key)?;
        self.page.shift(
            Self::entry_offset(eid),
            (count - eid) * LEAF_ENTRY_SIZE,
            Self::entry_offset(eid + 1),
        );
        self.put_entry(eid, key, rid);
        self.set_key_count(count + 1);
        Ok(())
    }

    /// Insert an entry into a full node and move the upper half to `sibling`.
    ///
    /// Of the `count + 1` entries (existing plus new, in key order) this node
    /// keeps the first `(count + 1) / 2` and `sibling` receives the rest.
    /// Returns the sibling's first key, which the parent must index.
    ///
    /// The next-leaf pointers are left alone; the caller links the sibling
    /// into the chain once it has a page id.
    ///
    /// # Errors
    /// Returns `Error::DuplicateKey` if `key` is already present. Neither
    /// node is modified in that case.
    pub fn insert_and_split(
        &mut self,
        key: i32,
        rid: RecordId,
        sibling: &mut LeafNode,
    ) -> Result<i32> {
        debug_assert_eq!(sibling.key_count(), 0, "split sibling must be empty");

        let count = self.key_count();
        let pos = self.insert_position(key)?;
        let split = (count + 1) / 2;

        for merged in split..=count {
            let (k, r) = self.merged_entry(merged, pos, (key, rid));
            sibling.put_entry(merged - split, k, r);
        }
        sibling.set_key_count(count + 1 - split);

        if pos < split {
            self.page.shift(
                Self::entry_offset(pos),
                (split - 1 - pos) * LEAF_ENTRY_SIZE,
                Self::entry_offset(pos + 1),
            );
            self.put_entry(pos, key, rid);
        }
        self.page.zero(
            Self::entry_offset(split),
            (count - split) * LEAF_ENTRY_SIZE,
        );
        self.set_key_count(split);

        Ok(sibling.key_at(0))
    }

    /// Read the entry at `eid`.
    ///
    /// # Errors
    /// Returns `Error::EntryOutOfRange` if `eid >= key_count()`.
    pub fn read_entry(&self, eid: usize) -> Result<(i32, RecordId)> {
        let count = self.key_count();
        if eid >= count {
            return Err(Error::EntryOutOfRange { eid, count });
        }
        Ok((self.key_at(eid), self.rid_at(eid)))
    }

    /// Page id of the next leaf in key order.
    #[inline]
    pub fn next_node_ptr(&self) -> PageId {
        PageId::new(self.page.u32_at(Self::OFFSET_NEXT))
    }

    #[inline]
    pub fn set_next_node_ptr(&mut self, page_id: PageId) {
        self.page.put_u32(Self::OFFSET_NEXT, page_id.0);
    }

    /// All keys in order.
    pub fn keys(&self) -> Vec<i32> {
        (0..self.key_count()).map(|eid| self.key_at(eid)).collect()
    }

    // ========================================================================
    // Internal: entry encoding
    // ========================================================================

    #[inline]
    fn entry_offset(eid: usize) -> usize {
        Self::OFFSET_ENTRIES + eid * LEAF_ENTRY_SIZE
    }

    fn set_key_count(&mut self, count: usize) {
        codec::set_key_count(&mut self.page, count);
    }

    #[inline]
    fn key_at(&self, eid: usize) -> i32 {
        self.page.i32_at(Self::entry_offset(eid))
    }

    #[inline]
    fn rid_at(&self, eid: usize) -> RecordId {
        let offset = Self::entry_offset(eid) + 4;
        RecordId::from_bytes(&self.page.as_slice()[offset..offset + RecordId::SIZE])
    }

    fn put_entry(&mut self, eid: usize, key: i32, rid: RecordId) {
        let offset = Self::entry_offset(eid);
        self.page.put_i32(offset, key);
        rid.write_to(&mut self.page.as_mut_slice()[offset + 4..offset + 4 + RecordId::SIZE]);
    }

    /// Slot `key` goes into, rejecting keys already present.
    fn insert_position(&self, key: i32) -> Result<usize> {
        match self.locate(key) {
            Some(eid) if self.key_at(eid) == key => Err(Error::DuplicateKey(key)),
            Some(eid) => Ok(eid),
            None => Ok(self.key_count()),
        }
    }

    /// Entry `merged` of the sequence this node would hold with `new`
    /// inserted at `pos`.
    fn merged_entry(&self, merged: usize, pos: usize, new: (i32, RecordId)) -> (i32, RecordId) {
        match merged.cmp(&pos) {
            std::cmp::Ordering::Less => (self.key_at(merged), self.rid_at(merged)),
            std::cmp::Ordering::Equal => new,
            std::cmp::Ordering::Greater => (self.key_at(merged - 1), self.rid_at(merged - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(key: i32) -> RecordId {
        RecordId::new(PageId::new(key.unsigned_abs()), key as u32 ^ 0x5A5A)
    }

    fn leaf_with(max_keys: usize, keys: &[i32]) -> LeafNode {
        let mut leaf = LeafNode::new(max_keys);
        for &k in keys {
            leaf.insert(k, rid(k)).unwrap();
        }
        leaf
    }

    #[test]
    fn test_new_leaf_is_empty() {
        let leaf = LeafNode::new(4);
        assert_eq!(leaf.key_count(), 0);
        assert_eq!(leaf.next_node_ptr(), PageId::INVALID);
        assert_eq!(leaf.locate(10), None);
    }

    #[test]
    fn test_max_keys_clamped_to_page() {
        assert_eq!(LeafNode::new(usize::MAX).max_keys(), LEAF_MAX_KEYS);
    }

    #[test]
    fn test_insert_keeps_order() {
        let leaf = leaf_with(8, &[5, 1, 9, 3, 7]);
        assert_eq!(leaf.keys(), vec![1, 3, 5, 7, 9]);
        assert_eq!(leaf.read_entry(2).unwrap(), (5, rid(5)));
    }

    #[test]
    fn test_zero_and_negative_keys() {
        let leaf = leaf_with(8, &[0, -4, 2]);
        assert_eq!(leaf.keys(), vec![-4, 0, 2]);
        assert_eq!(leaf.key_count(), 3);
        assert_eq!(leaf.read_entry(0).unwrap(), (-4, rid(-4)));
        assert_eq!(leaf.read_entry(1).unwrap(), (0, rid(0)));
    }

    #[test]
    fn test_locate_lower_bound() {
        let leaf = leaf_with(8, &[10, 20, 30]);
        assert_eq!(leaf.locate(5), Some(0));
        assert_eq!(leaf.locate(10), Some(0));
        assert_eq!(leaf.locate(11), Some(1));
        assert_eq!(leaf.locate(30), Some(2));
        assert_eq!(leaf.locate(31), None);
    }

    #[test]
    fn test_insert_full_node() {
        let mut leaf = leaf_with(3, &[1, 2, 3]);
        assert!(matches!(leaf.insert(4, rid(4)), Err(Error::NodeFull)));
        assert_eq!(leaf.keys(), vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut leaf = leaf_with(3, &[1, 2]);
        assert!(matches!(leaf.insert(2, rid(9)), Err(Error::DuplicateKey(2))));
        assert_eq!(leaf.read_entry(1).unwrap(), (2, rid(2)));
    }

    #[test]
    fn test_read_entry_out_of_range() {
        let leaf = leaf_with(3, &[1]);
        assert!(matches!(
            leaf.read_entry(1),
            Err(Error::EntryOutOfRange { eid: 1, count: 1 })
        ));
    }

    #[test]
    fn test_next_node_ptr_independent_of_entries() {
        let mut leaf = LeafNode::new(LEAF_MAX_KEYS);
        leaf.set_next_node_ptr(PageId::new(77));
        for k in 0..LEAF_MAX_KEYS as i32 {
            leaf.insert(k, rid(k)).unwrap();
        }
        assert_eq!(leaf.key_count(), LEAF_MAX_KEYS);
        assert_eq!(leaf.next_node_ptr(), PageId::new(77));
    }

    #[test]
    fn test_split_new_key_in_left_half() {
        let mut leaf = leaf_with(4, &[10, 20, 30, 40]);
        let mut sibling = LeafNode::new(4);

        let key = leaf.insert_and_split(15, rid(15), &mut sibling).unwrap();

        assert_eq!(leaf.keys(), vec![10, 15]);
        assert_eq!(sibling.keys(), vec![20, 30, 40]);
        assert_eq!(key, 20);
        assert_eq!(leaf.read_entry(1).unwrap(), (15, rid(15)));
        assert_eq!(sibling.read_entry(0).unwrap(), (20, rid(20)));
    }

    #[test]
    fn test_split_new_key_at_split_point() {
        let mut leaf = leaf_with(3, &[1, 3, 8]);
        let mut sibling = LeafNode::new(3);

        let key = leaf.insert_and_split(5, rid(5), &mut sibling).unwrap();

        assert_eq!(leaf.keys(), vec![1, 3]);
        assert_eq!(sibling.keys(), vec![5, 8]);
        assert_eq!(key, 5);
    }

    #[test]
    fn test_split_new_key_is_maximum() {
        let mut leaf = leaf_with(4, &[10, 20, 30, 40]);
        let mut sibling = LeafNode::new(4);

        let key = leaf.insert_and_split(50, rid(50), &mut sibling).unwrap();

        assert_eq!(leaf.keys(), vec![10, 20]);
        assert_eq!(sibling.keys(), vec![30, 40, 50]);
        assert_eq!(key, 30);
        assert_eq!(sibling.read_entry(2).unwrap(), (50, rid(50)));
    }

    #[test]
    fn test_split_new_key_is_minimum() {
        let mut leaf = leaf_with(3, &[2, 4, 6]);
        let mut sibling = LeafNode::new(3);

        let key = leaf.insert_and_split(1, rid(1), &mut sibling).unwrap();

        assert_eq!(leaf.keys(), vec![1, 2]);
        assert_eq!(sibling.keys(), vec![4, 6]);
        assert_eq!(key, 4);
    }

    #[test]
    fn test_split_zeroes_moved_slots() {
        let mut leaf = leaf_with(4, &[10, 20, 30, 40]);
        let mut sibling = LeafNode::new(4);
        leaf.insert_and_split(25, rid(25), &mut sibling).unwrap();

        let start = LeafNode::entry_offset(leaf.key_count());
        let end = LeafNode::entry_offset(4);
        assert!(leaf.page.as_slice()[start..end].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_split_rejects_duplicate() {
        let mut leaf = leaf_with(3, &[1, 2, 3]);
        let mut sibling = LeafNode::new(3);

        let result = leaf.insert_and_split(2, rid(2), &mut sibling);
        assert!(matches!(result, Err(Error::DuplicateKey(2))));
        assert_eq!(leaf.keys(), vec![1, 2, 3]);
        assert_eq!(sibling.key_count(), 0);
    }
}
