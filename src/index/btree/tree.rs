//! B+Tree driver: root bookkeeping, insert with split propagation, and
//! search descent.

use std::path::Path;

use crate::common::{Error, IndexConfig, OpenMode, PageId, RecordId, Result};
use crate::storage::page::MetaPage;
use crate::storage::{IoStatsSnapshot, PageFile};

use super::{IndexCursor, IndexIter, InternalNode, LeafNode};

/// Outcome of inserting into one subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Promotion {
    /// The subtree absorbed the entry.
    None,
    /// The subtree root split; the parent must index `page_id` under `key`.
    Split { key: i32, page_id: PageId },
}

/// A disk-backed B+Tree mapping `i32` keys to [`RecordId`]s.
///
/// # File Layout
/// ```text
/// ┌─────────────┬─────────┬─────────┬─────────┐
/// │ Page 0      │ Page 1  │ Page 2  │  ...    │
/// │ MetaPage    │ node    │ node    │         │
/// └─────────────┴─────────┴─────────┴─────────┘
/// ```
///
/// Node pages carry no type tag: a page is a leaf exactly when it is
/// reached at depth `tree_height` (the root is depth 1). New pages are
/// always appended at [`PageFile::end_pid`] and never freed.
///
/// # Persistence
/// `root_pid` and `tree_height` live in memory while the index is open and
/// are written to page 0 by [`flush`](Self::flush) and
/// [`close`](Self::close). Node pages are written as each insert proceeds.
/// An insert that fails part-way is not rolled back.
///
/// # Example
/// ```no_run
/// use pageindex::{BTreeIndex, OpenMode, PageId, RecordId};
///
/// let mut index = BTreeIndex::open("movies.idx", OpenMode::ReadWrite).unwrap();
/// index.insert(42, RecordId::new(PageId::new(7), 3)).unwrap();
///
/// let (mut cursor, found) = index.locate(42).unwrap();
/// assert!(found);
/// let (key, rid) = index.read_forward(&mut cursor).unwrap();
/// assert_eq!((key, rid.slot), (42, 3));
/// index.close().unwrap();
/// ```
pub struct BTreeIndex {
    pf: PageFile,
    root_pid: PageId,
    tree_height: u32,
    config: IndexConfig,
}

impl BTreeIndex {
    /// Open an index file with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Self::open_with_config(path, mode, IndexConfig::default())
    }

    /// Open an index file.
    ///
    /// A new (empty) file gets a meta page recording an empty tree and the
    /// fan-out from `config`. An existing file keeps the fan-out it was
    /// created with; only `config.sync_on_write` applies to it.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if `config` fails validation
    /// - `Error::Open` if the backing file cannot be opened
    /// - `Error::CorruptHeader` if page 0 is not a valid meta page
    /// - I/O errors from reading or writing page 0
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        mode: OpenMode,
        config: IndexConfig,
    ) -> Result<Self> {
        config.validate()?;
        let pf = PageFile::open(path, mode, config.sync_on_write)?;

        let mut index = Self {
            pf,
            root_pid: PageId::INVALID,
            tree_height: 0,
            config,
        };

        if index.pf.end_pid() == PageId::META {
            if mode.is_writable() {
                index.write_meta()?;
            }
        } else {
            let meta = MetaPage::from_page(&index.pf.read_page(PageId::META)?)?;
            index.restore(meta)?;
        }

        tracing::debug!(
            path = %index.pf.path().display(),
            ?mode,
            root = %index.root_pid,
            height = index.tree_height,
            "opened index"
        );
        Ok(index)
    }

    /// Persist the tree metadata and release the file.
    ///
    /// The metadata write is attempted first; the file is closed even if it
    /// fails, and the first error is returned.
    pub fn close(self) -> Result<()> {
        let flushed = if self.pf.mode().is_writable() {
            self.write_meta()
        } else {
            Ok(())
        };

        tracing::debug!(
            root = %self.root_pid,
            height = self.tree_height,
            file_size = self.pf.file_size(),
            "closing index"
        );
        let closed = self.pf.close();
        flushed.and(closed)
    }

    /// Persist the tree metadata and sync without closing.
    ///
    /// # Errors
    /// Returns `Error::ReadOnly` on a read-only index.
    pub fn flush(&self) -> Result<()> {
        if !self.pf.mode().is_writable() {
            return Err(Error::ReadOnly);
        }
        self.write_meta()?;
        self.pf.sync()
    }

    /// Insert a `(key, rid)` pair.
    ///
    /// # Errors
    /// - `Error::ReadOnly` on a read-only index
    /// - `Error::DuplicateKey` if `key` is already indexed (nothing written)
    /// - page I/O errors, which may leave the tree partially updated
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        if !self.pf.mode().is_writable() {
            return Err(Error::ReadOnly);
        }

        if self.tree_height == 0 {
            let mut leaf = LeafNode::new(self.config.max_leaf_keys);
            leaf.insert(key, rid)?;

            let pid = self.pf.end_pid();
            leaf.write(pid, &self.pf)?;
            self.root_pid = pid;
            self.tree_height = 1;
            tracing::debug!(root = %pid, "created root leaf");
            return Ok(());
        }

        if let Promotion::Split {
            key: split_key,
            page_id,
        } = self.insert_helper(key, rid, self.root_pid, 1)?
        {
            let mut root = InternalNode::new(self.config.max_internal_keys);
            root.initialize_root(self.root_pid, split_key, page_id);

            let pid = self.pf.end_pid();
            root.write(pid, &self.pf)?;
            self.root_pid = pid;
            self.tree_height += 1;
            tracing::debug!(root = %pid, height = self.tree_height, "grew new root");
        }
        Ok(())
    }

    /// Insert into the subtree rooted at `pid`, which sits at `depth`.
    fn insert_helper(&self, key: i32, rid: RecordId, pid: PageId, depth: u32) -> Result<Promotion> {
        if depth == self.tree_height {
            let mut leaf = self.read_leaf(pid)?;
            return match leaf.insert(key, rid) {
                Ok(()) => {
                    leaf.write(pid, &self.pf)?;
                    Ok(Promotion::None)
                }
                Err(Error::NodeFull) => {
                    let mut sibling = LeafNode::new(self.config.max_leaf_keys);
                    let sibling_key = leaf.insert_and_split(key, rid, &mut sibling)?;

                    let sibling_pid = self.pf.end_pid();
                    sibling.set_next_node_ptr(leaf.next_node_ptr());
                    leaf.set_next_node_ptr(sibling_pid);
                    sibling.write(sibling_pid, &self.pf)?;
                    leaf.write(pid, &self.pf)?;

                    tracing::debug!(
                        leaf = %pid,
                        sibling = %sibling_pid,
                        sibling_key,
                        max_keys = leaf.max_keys(),
                        "split leaf"
                    );
                    Ok(Promotion::Split {
                        key: sibling_key,
                        page_id: sibling_pid,
                    })
                }
                Err(e) => Err(e),
            };
        }

        let mut node = self.read_internal(pid)?;
        let child = node.locate_child_ptr(key);

        let (child_key, child_pid) = match self.insert_helper(key, rid, child, depth + 1)? {
            Promotion::None => return Ok(Promotion::None),
            Promotion::Split { key, page_id } => (key, page_id),
        };

        match node.insert(child_key, child_pid) {
            Ok(()) => {
                node.write(pid, &self.pf)?;
                Ok(Promotion::None)
            }
            Err(Error::NodeFull) => {
                let mut sibling = InternalNode::new(self.config.max_internal_keys);
                let mid_key = node.insert_and_split(child_key, child_pid, &mut sibling);

                let sibling_pid = self.pf.end_pid();
                sibling.write(sibling_pid, &self.pf)?;
                node.write(pid, &self.pf)?;

                tracing::debug!(
                    node = %pid,
                    sibling = %sibling_pid,
                    mid_key,
                    depth,
                    max_keys = node.max_keys(),
                    "split internal node"
                );
                Ok(Promotion::Split {
                    key: mid_key,
                    page_id: sibling_pid,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Find the leaf position of `search_key`.
    ///
    /// Returns the cursor and whether the key is present. When it is not,
    /// the cursor sits at the first entry `>= search_key`, which may be one
    /// past the end of the leaf; [`read_forward`](Self::read_forward) then
    /// continues in the next leaf. On an empty tree the cursor is
    /// [`IndexCursor::END`].
    pub fn locate(&self, search_key: i32) -> Result<(IndexCursor, bool)> {
        if self.tree_height == 0 {
            return Ok((IndexCursor::END, false));
        }

        let mut pid = self.root_pid;
        for _ in 1..self.tree_height {
            pid = self.read_internal(pid)?.locate_child_ptr(search_key);
        }

        let leaf = self.read_leaf(pid)?;
        match leaf.locate(search_key) {
            Some(eid) => {
                let (key, _) = leaf.read_entry(eid)?;
                Ok((IndexCursor::new(pid, eid), key == search_key))
            }
            None => Ok((IndexCursor::new(pid, leaf.key_count()), false)),
        }
    }

    /// Read the entry under `cursor` and advance it.
    ///
    /// After the last entry of a leaf the cursor moves to entry 0 of the
    /// next leaf, or to [`IndexCursor::END`] after the last leaf.
    ///
    /// # Errors
    /// - `Error::EndOfIndex` if the cursor is past the last entry
    /// - `Error::InvalidCursor` if the cursor names page 0, a page past the
    ///   end of the file, or an entry beyond the leaf's end
    pub fn read_forward(&self, cursor: &mut IndexCursor) -> Result<(i32, RecordId)> {
        loop {
            if cursor.is_end() {
                return Err(Error::EndOfIndex);
            }
            if cursor.pid == PageId::META || cursor.pid >= self.pf.end_pid() {
                return Err(Error::InvalidCursor(cursor.pid));
            }

            let leaf = self.read_leaf(cursor.pid)?;
            let count = leaf.key_count();
            if cursor.eid > count {
                return Err(Error::InvalidCursor(cursor.pid));
            }
            if cursor.eid == count {
                *cursor = IndexCursor::new(leaf.next_node_ptr(), 0);
                continue;
            }

            let entry = leaf.read_entry(cursor.eid)?;
            cursor.eid += 1;
            if cursor.eid == count {
                *cursor = IndexCursor::new(leaf.next_node_ptr(), 0);
            }
            return Ok(entry);
        }
    }

    /// Look up the record for `key`.
    pub fn get(&self, key: i32) -> Result<Option<RecordId>> {
        let (mut cursor, found) = self.locate(key)?;
        if !found {
            return Ok(None);
        }
        let (_, rid) = self.read_forward(&mut cursor)?;
        Ok(Some(rid))
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> Result<IndexIter<'_>> {
        self.iter_from(i32::MIN)
    }

    /// Iterate over entries with keys `>= start`, in key order.
    pub fn iter_from(&self, start: i32) -> Result<IndexIter<'_>> {
        let (cursor, _) = self.locate(start)?;
        Ok(IndexIter::new(self, cursor))
    }

    /// Root page of the tree, `PageId::INVALID` when empty.
    #[inline]
    pub fn root_pid(&self) -> PageId {
        self.root_pid
    }

    /// Number of levels: 0 when empty, 1 when the root is a leaf.
    #[inline]
    pub fn tree_height(&self) -> u32 {
        self.tree_height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree_height == 0
    }

    /// Effective configuration (fan-out as stored in the file).
    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Page traffic since the index was opened.
    pub fn io_stats(&self) -> IoStatsSnapshot {
        self.pf.stats()
    }

    /// Next page id the index would allocate.
    pub fn end_pid(&self) -> PageId {
        self.pf.end_pid()
    }

    /// Load the leaf at `pid`.
    pub fn read_leaf(&self, pid: PageId) -> Result<LeafNode> {
        LeafNode::read(pid, &self.pf, self.config.max_leaf_keys)
    }

    /// Load the internal node at `pid`.
    pub fn read_internal(&self, pid: PageId) -> Result<InternalNode> {
        InternalNode::read(pid, &self.pf, self.config.max_internal_keys)
    }

    // ========================================================================
    // Internal: meta page
    // ========================================================================

    fn write_meta(&self) -> Result<()> {
        let meta = MetaPage {
            root_pid: self.root_pid,
            tree_height: self.tree_height,
            ..MetaPage::empty(
                self.config.max_leaf_keys as u32,
                self.config.max_internal_keys as u32,
            )
        };
        self.pf.write(PageId::META, &meta.to_page())
    }

    fn restore(&mut self, meta: MetaPage) -> Result<()> {
        let config = self
            .config
            .with_max_leaf_keys(meta.max_leaf_keys as usize)
            .with_max_internal_keys(meta.max_internal_keys as usize);
        config
            .validate()
            .map_err(|e| Error::CorruptHeader(e.to_string()))?;

        if meta.root_pid.is_valid()
            && (meta.root_pid == PageId::META || meta.root_pid >= self.pf.end_pid())
        {
            return Err(Error::CorruptHeader(format!(
                "root {} outside file of {} pages",
                meta.root_pid,
                self.pf.end_pid().0
            )));
        }

        if config != self.config {
            tracing::debug!(
                max_leaf_keys = config.max_leaf_keys,
                max_internal_keys = config.max_internal_keys,
                "using fan-out stored in index file"
            );
        }

        self.config = config;
        self.root_pid = meta.root_pid;
        self.tree_height = meta.tree_height;
        Ok(())
    }
}
