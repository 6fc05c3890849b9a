//! pageindex - a disk-backed B+Tree index mapping integer keys to record
//! locators.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           pageindex                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │   BTreeIndex: insert / locate / read_forward / iter      │   │
//! │  │        LeafNode + InternalNode page views                │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │      PageFile + Page + MetaPage + IoStats                │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, RecordId, Error, config)
//! - [`storage`] - Page file I/O and page formats
//! - [`index`] - The B+Tree
//!
//! # Quick Start
//! ```no_run
//! use pageindex::{BTreeIndex, OpenMode, PageId, RecordId};
//!
//! let mut index = BTreeIndex::open("my_index.idx", OpenMode::ReadWrite).unwrap();
//! for key in [5, 3, 8] {
//!     index.insert(key, RecordId::new(PageId::new(1), key as u32)).unwrap();
//! }
//!
//! let keys: Vec<i32> = index.iter().unwrap().map(|e| e.unwrap().0).collect();
//! assert_eq!(keys, vec![3, 5, 8]);
//! index.close().unwrap();
//! ```

pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, IndexConfig, OpenMode, PageId, RecordId, Result};

pub use index::{BTreeIndex, IndexCursor, IndexIter};
pub use storage::page::{MetaPage, Page};
pub use storage::{IoStatsSnapshot, PageFile};
