//! Index cursor.

use std::fmt;

use crate::common::PageId;

/// Position of one leaf entry: the leaf's page id and the entry index.
///
/// Returned by [`BTreeIndex::locate`](super::BTreeIndex::locate) and advanced
/// by [`BTreeIndex::read_forward`](super::BTreeIndex::read_forward). A cursor
/// whose `eid` equals the leaf's entry count is still valid; reading from it
/// continues at the next leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexCursor {
    pub pid: PageId,
    pub eid: usize,
}

impl IndexCursor {
    /// Past the last entry of the index (also what `locate` returns on an
    /// empty tree).
    pub const END: IndexCursor = IndexCursor {
        pid: PageId::INVALID,
        eid: 0,
    };

    #[inline]
    pub fn new(pid: PageId, eid: usize) -> Self {
        Self { pid, eid }
    }

    /// Whether the cursor has run off the end of the leaf chain.
    #[inline]
    pub fn is_end(&self) -> bool {
        !self.pid.is_valid()
    }
}

impl fmt::Display for IndexCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            write!(f, "Cursor(END)")
        } else {
            write!(f, "Cursor({}, {})", self.pid, self.eid)
        }
    }
}
