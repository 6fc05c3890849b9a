//! Index meta page.
//!
//! Page 0 of every index file holds a [`MetaPage`]: the root page id, tree
//! height and node fan-out, stamped with a magic number, a format version
//! and a CRC32 over the whole page.

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Tree metadata persisted in page 0.
///
/// # Layout (28 bytes, rest of the page zero)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     magic ("BPIX")
/// 4       2     version (little-endian)
/// 6       2     reserved
/// 8       4     checksum (CRC32, little-endian)
/// 12      4     root_pid (PageId, little-endian; u32::MAX if empty)
/// 16      4     tree_height (little-endian)
/// 20      4     max_leaf_keys (little-endian)
/// 24      4     max_internal_keys (little-endian)
/// ```
///
/// # Checksum
/// The checksum is computed over the entire page with the checksum field
/// itself set to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaPage {
    /// Root node of the tree, or `PageId::INVALID` for an empty tree.
    pub root_pid: PageId,
    /// 0 for an empty tree, 1 when the root is a leaf.
    pub tree_height: u32,
    /// Leaf fan-out the file was created with.
    pub max_leaf_keys: u32,
    /// Internal fan-out the file was created with.
    pub max_internal_keys: u32,
}

impl MetaPage {
    pub const MAGIC: [u8; 4] = *b"BPIX";
    pub const VERSION: u16 = 1;

    /// Size of the encoded fields in bytes.
    pub const SIZE: usize = 28;

    pub const OFFSET_MAGIC: usize = 0;
    pub const OFFSET_VERSION: usize = 4;
    pub const OFFSET_CHECKSUM: usize = 8;
    pub const OFFSET_ROOT: usize = 12;
    pub const OFFSET_HEIGHT: usize = 16;
    pub const OFFSET_MAX_LEAF: usize = 20;
    pub const OFFSET_MAX_INTERNAL: usize = 24;

    /// Metadata of a tree with no entries.
    pub fn empty(max_leaf_keys: u32, max_internal_keys: u32) -> Self {
        Self {
            root_pid: PageId::INVALID,
            tree_height: 0,
            max_leaf_keys,
            max_internal_keys,
        }
    }

    /// Encode into a fresh page with the checksum filled in.
    pub fn to_page(&self) -> Page {
        let mut page = Page::new();
        let data = page.as_mut_slice();

        data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4].copy_from_slice(&Self::MAGIC);
        data[Self::OFFSET_VERSION..Self::OFFSET_VERSION + 2]
            .copy_from_slice(&Self::VERSION.to_le_bytes());
        page.put_u32(Self::OFFSET_ROOT, self.root_pid.0);
        page.put_u32(Self::OFFSET_HEIGHT, self.tree_height);
        page.put_u32(Self::OFFSET_MAX_LEAF, self.max_leaf_keys);
        page.put_u32(Self::OFFSET_MAX_INTERNAL, self.max_internal_keys);

        let checksum = Self::compute_checksum(page.as_slice());
        page.put_u32(Self::OFFSET_CHECKSUM, checksum);
        page
    }

    /// Decode and validate page 0.
    ///
    /// # Errors
    /// Returns `Error::CorruptHeader` if the magic, version or checksum does
    /// not match, or if the root and height disagree about emptiness.
    pub fn from_page(page: &Page) -> Result<Self> {
        let data = page.as_slice();

        if data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4] != Self::MAGIC {
            return Err(Error::CorruptHeader("bad magic".to_string()));
        }

        let version =
            u16::from_le_bytes([data[Self::OFFSET_VERSION], data[Self::OFFSET_VERSION + 1]]);
        if version != Self::VERSION {
            return Err(Error::CorruptHeader(format!(
                "unsupported version {}",
                version
            )));
        }

        let stored = page.u32_at(Self::OFFSET_CHECKSUM);
        let computed = Self::compute_checksum(data);
        if stored != computed {
            return Err(Error::CorruptHeader(format!(
                "checksum mismatch (stored {:#010x}, computed {:#010x})",
                stored, computed
            )));
        }

        let meta = Self {
            root_pid: PageId::new(page.u32_at(Self::OFFSET_ROOT)),
            tree_height: page.u32_at(Self::OFFSET_HEIGHT),
            max_leaf_keys: page.u32_at(Self::OFFSET_MAX_LEAF),
            max_internal_keys: page.u32_at(Self::OFFSET_MAX_INTERNAL),
        };
        if meta.root_pid.is_valid() != (meta.tree_height > 0) {
            return Err(Error::CorruptHeader(format!(
                "root {} inconsistent with height {}",
                meta.root_pid, meta.tree_height
            )));
        }
        Ok(meta)
    }

    /// Compute the CRC32 of a page with the checksum field treated as zero.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();

        hasher.update(&page_data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_CHECKSUM + 4..]);

        hasher.finalize()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(root: u32, height: u32) -> MetaPage {
        MetaPage {
            root_pid: PageId::new(root),
            tree_height: height,
            max_leaf_keys: 340,
            max_internal_keys: 511,
        }
    }

    #[test]
    fn test_meta_page_empty() {
        let meta = MetaPage::empty(3, 4);
        assert_eq!(meta.root_pid, PageId::INVALID);
        assert_eq!(meta.tree_height, 0);
        assert_eq!(meta.max_leaf_keys, 3);
        assert_eq!(meta.max_internal_keys, 4);
    }

    #[test]
    fn test_meta_page_byte_layout() {
        let page = meta(0x04030201, 2).to_page();
        let data = page.as_slice();

        assert_eq!(&data[0..4], b"BPIX");
        assert_eq!(&data[4..6], &[1, 0]);
        assert_eq!(&data[12..16], &[1, 2, 3, 4]);
        assert_eq!(&data[16..20], &[2, 0, 0, 0]);
        assert_eq!(&data[20..24], &[0x54, 1, 0, 0]);
        assert_eq!(&data[24..28], &[0xFF, 1, 0, 0]);
        assert!(data[MetaPage::SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_meta_page_decodes_what_it_encodes() {
        let m = meta(17, 3);
        assert_eq!(MetaPage::from_page(&m.to_page()).unwrap(), m);

        let empty = MetaPage::empty(3, 3);
        assert_eq!(MetaPage::from_page(&empty.to_page()).unwrap(), empty);
    }

    #[test]
    fn test_meta_page_rejects_zeroed_page() {
        let result = MetaPage::from_page(&Page::new());
        assert!(matches!(result, Err(Error::CorruptHeader(_))));
    }

    #[test]
    fn test_meta_page_detects_corruption() {
        let mut page = meta(5, 1).to_page();
        page.as_mut_slice()[MetaPage::OFFSET_HEIGHT] = 9;

        let result = MetaPage::from_page(&page);
        assert!(matches!(result, Err(Error::CorruptHeader(_))));
    }

    #[test]
    fn test_meta_page_rejects_future_version() {
        let mut page = MetaPage::empty(3, 3).to_page();
        page.as_mut_slice()[MetaPage::OFFSET_VERSION] = 2;
        let checksum = MetaPage::compute_checksum(page.as_slice());
        page.put_u32(MetaPage::OFFSET_CHECKSUM, checksum);

        let result = MetaPage::from_page(&page);
        assert!(matches!(result, Err(Error::CorruptHeader(_))));
    }

    #[test]
    fn test_checksum_ignores_checksum_field() {
        let page = MetaPage::empty(3, 3).to_page();
        let checksum1 = MetaPage::compute_checksum(page.as_slice());

        let mut other = MetaPage::empty(3, 3).to_page();
        other.put_u32(MetaPage::OFFSET_CHECKSUM, 0xFFFF_FFFF);
        let checksum2 = MetaPage::compute_checksum(other.as_slice());

        assert_eq!(checksum1, checksum2);
    }
}
