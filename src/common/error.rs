//! Error types for pageindex.

use std::path::PathBuf;

use thiserror::Error;

use crate::common::PageId;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pageindex.
///
/// Backing-store failures are fatal to the operation that hit them.
/// `NodeFull` never escapes an insert: the tree driver recovers from it by
/// splitting.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from page reads and writes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be opened or created.
    #[error("cannot open backing store {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Requested page is past the end of the file.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// A write was attempted on an index opened read-only.
    #[error("index is opened read-only")]
    ReadOnly,

    /// The meta page has the wrong magic, version or checksum.
    #[error("corrupt index header: {0}")]
    CorruptHeader(String),

    /// Rejected `IndexConfig`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The node has no free entry slot.
    #[error("node is full")]
    NodeFull,

    /// Entry index outside `[0, key_count)`.
    #[error("entry {eid} out of range (node holds {count})")]
    EntryOutOfRange { eid: usize, count: usize },

    /// The key is already present in the index.
    #[error("duplicate key {0}")]
    DuplicateKey(i32),

    /// The cursor points at a page that cannot be a leaf.
    #[error("invalid cursor: {0}")]
    InvalidCursor(PageId),

    /// The cursor has run past the last leaf entry.
    #[error("end of index")]
    EndOfIndex,
}
