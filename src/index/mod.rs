//! Index structures.
//!
//! - [`btree`] - Disk-backed B+Tree over integer keys

pub mod btree;

pub use btree::{BTreeIndex, IndexCursor, IndexIter};
