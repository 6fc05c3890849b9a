//! Forward iteration over the leaf chain.

use crate::common::{Error, RecordId, Result};

use super::{BTreeIndex, IndexCursor};

/// Iterator over `(key, RecordId)` entries in ascending key order.
///
/// Created by [`BTreeIndex::iter`] and [`BTreeIndex::iter_from`]. Each step
/// is one [`read_forward`](BTreeIndex::read_forward); an I/O error is
/// yielded once and ends the iteration.
pub struct IndexIter<'a> {
    index: &'a BTreeIndex,
    cursor: IndexCursor,
    done: bool,
}

impl<'a> IndexIter<'a> {
    pub(crate) fn new(index: &'a BTreeIndex, cursor: IndexCursor) -> Self {
        Self {
            index,
            cursor,
            done: false,
        }
    }

    /// Position of the next entry to be returned.
    pub fn cursor(&self) -> IndexCursor {
        self.cursor
    }
}

impl Iterator for IndexIter<'_> {
    type Item = Result<(i32, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.index.read_forward(&mut self.cursor) {
            Ok(entry) => Some(Ok(entry)),
            Err(Error::EndOfIndex) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
