//! B+Tree index over `i32` keys.
//!
//! # Components
//! - [`LeafNode`] - sorted `(key, RecordId)` entries and a next-leaf pointer
//! - [`InternalNode`] - leftmost child plus sorted `(key, child)` separators
//! - [`BTreeIndex`] - root bookkeeping, insert with split propagation, search
//! - [`IndexCursor`] / [`IndexIter`] - forward scans along the leaf chain
//!
//! Nodes are transient views over a page read from the [`PageFile`]; the
//! only persistent state is the pages themselves plus the meta page.
//!
//! [`PageFile`]: crate::storage::PageFile

mod codec;
mod cursor;
mod internal;
mod iter;
mod leaf;
mod tree;

pub use cursor::IndexCursor;
pub use internal::InternalNode;
pub use iter::IndexIter;
pub use leaf::LeafNode;
pub use tree::BTreeIndex;
