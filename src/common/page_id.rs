//! Page identifier type.

use std::fmt;

/// Identifies a page in the index file.
///
/// Pages are numbered sequentially from 0 as the file grows and are never
/// freed. Page 0 always holds the index meta page, so a node is never found
/// there.
///
/// # Example
/// ```
/// use pageindex::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Invalid/sentinel page ID.
    ///
    /// Stands for "no root" in an empty index and "no next leaf" at the end
    /// of the leaf chain.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// The meta page.
    pub const META: PageId = PageId(0);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    #[inline]
    pub(crate) fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub(crate) fn from_le_bytes(bytes: [u8; 4]) -> Self {
        PageId(u32::from_le_bytes(bytes))
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}
