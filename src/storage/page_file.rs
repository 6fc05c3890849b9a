//! Page File - low-level file I/O for index pages.
//!
//! The [`PageFile`] handles all direct file operations:
//! - Reading and writing whole pages by id
//! - Growing the file one page at a time
//! - Reporting the next page id to allocate

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, OpenMode, PageId, Result};
use crate::storage::page::Page;
use crate::storage::{IoStats, IoStatsSnapshot};

/// A file viewed as an append-only array of fixed-size pages.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`. Writing to
/// [`end_pid`](Self::end_pid) appends a page; ids are never reused.
///
/// # Thread Safety
/// The file handle and page count sit behind a `Mutex` so reads can go
/// through `&self`. The lock only keeps a seek paired with its read or
/// write; callers above this layer are single-writer.
pub struct PageFile {
    inner: Mutex<FileInner>,
    path: PathBuf,
    mode: OpenMode,
    sync_on_write: bool,
    stats: IoStats,
}

struct FileInner {
    file: File,
    /// Number of pages in the file.
    page_count: u32,
}

impl PageFile {
    /// Open a page file.
    ///
    /// Under [`OpenMode::ReadWrite`] the file is created if it does not
    /// exist. A trailing partial page (from a torn append) is ignored.
    ///
    /// # Errors
    /// Returns `Error::Open` if the file cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode, sync_on_write: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = match mode {
            OpenMode::ReadOnly => OpenOptions::new().read(true).open(&path),
            OpenMode::ReadWrite => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path),
        }
        .map_err(|source| Error::Open {
            path: path.clone(),
            source,
        })?;

        let file_size = file
            .metadata()
            .map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?
            .len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        tracing::trace!(path = %path.display(), ?mode, page_count, "opened page file");

        Ok(Self {
            inner: Mutex::new(FileInner { file, page_count }),
            path,
            mode,
            sync_on_write,
            stats: IoStats::new(),
        })
    }

    /// Read a page into `page`.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page doesn't exist.
    pub fn read(&self, page_id: PageId, page: &mut Page) -> Result<()> {
        let mut inner = self.inner.lock();
        if page_id.0 >= inner.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.read_exact(page.as_mut_slice())?;

        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(%page_id, "read page");
        Ok(())
    }

    /// Read a page into a fresh buffer.
    pub fn read_page(&self, page_id: PageId) -> Result<Page> {
        let mut page = Page::new();
        self.read(page_id, &mut page)?;
        Ok(page)
    }

    /// Write a page.
    ///
    /// `page_id` may be any existing page, or exactly [`end_pid`](Self::end_pid)
    /// to append a new one.
    ///
    /// # Errors
    /// - `Error::ReadOnly` if the file was opened read-only
    /// - `Error::PageNotFound` if `page_id` is past the end of the file
    pub fn write(&self, page_id: PageId, page: &Page) -> Result<()> {
        if !self.mode.is_writable() {
            return Err(Error::ReadOnly);
        }

        let mut inner = self.inner.lock();
        if !page_id.is_valid() || page_id.0 > inner.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(page.as_slice())?;
        if self.sync_on_write {
            inner.file.sync_all()?;
        }

        self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
        if page_id.0 == inner.page_count {
            inner.page_count += 1;
            self.stats.pages_appended.fetch_add(1, Ordering::Relaxed);
        }

        tracing::trace!(%page_id, "wrote page");
        Ok(())
    }

    /// Number of pages in the file, which is also the next id to allocate.
    #[inline]
    pub fn end_pid(&self) -> PageId {
        PageId::new(self.inner.lock().page_count)
    }

    /// Flush file contents to stable storage.
    pub fn sync(&self) -> Result<()> {
        if self.mode.is_writable() {
            self.inner.lock().file.sync_all()?;
        }
        Ok(())
    }

    /// Sync and release the file handle.
    pub fn close(self) -> Result<()> {
        self.sync()?;
        tracing::trace!(path = %self.path.display(), "closed page file");
        Ok(())
    }

    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.end_pid().0 as u64) * (PAGE_SIZE as u64)
    }

    /// Get I/O statistics.
    pub fn stats(&self) -> IoStatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn filled(byte: u8) -> Page {
        let mut page = Page::new();
        page.as_mut_slice()[0] = byte;
        page.as_mut_slice()[PAGE_SIZE - 1] = byte;
        page
    }

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let pf = PageFile::open(&path, OpenMode::ReadWrite, false).unwrap();
        assert_eq!(pf.end_pid(), PageId::new(0));
        assert_eq!(pf.file_size(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_open_read_only_nonexistent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.idx");

        let result = PageFile::open(&path, OpenMode::ReadOnly, false);
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[test]
    fn test_append_and_read() {
        let dir = tempdir().unwrap();
        let pf = PageFile::open(dir.path().join("test.idx"), OpenMode::ReadWrite, false).unwrap();

        pf.write(pf.end_pid(), &filled(0xAB)).unwrap();
        assert_eq!(pf.end_pid(), PageId::new(1));

        let page = pf.read_page(PageId::new(0)).unwrap();
        assert_eq!(page.as_slice()[0], 0xAB);
        assert_eq!(page.as_slice()[PAGE_SIZE - 1], 0xAB);
    }

    #[test]
    fn test_overwrite_in_place() {
        let dir = tempdir().unwrap();
        let pf = PageFile::open(dir.path().join("test.idx"), OpenMode::ReadWrite, true).unwrap();

        pf.write(PageId::new(0), &filled(1)).unwrap();
        pf.write(PageId::new(1), &filled(2)).unwrap();
        pf.write(PageId::new(0), &filled(3)).unwrap();

        assert_eq!(pf.end_pid(), PageId::new(2));
        assert_eq!(pf.read_page(PageId::new(0)).unwrap().as_slice()[0], 3);
        assert_eq!(pf.read_page(PageId::new(1)).unwrap().as_slice()[0], 2);
    }

    #[test]
    fn test_write_past_end_fails() {
        let dir = tempdir().unwrap();
        let pf = PageFile::open(dir.path().join("test.idx"), OpenMode::ReadWrite, false).unwrap();

        let result = pf.write(PageId::new(1), &Page::new());
        assert!(matches!(result, Err(Error::PageNotFound(1))));
        assert_eq!(pf.end_pid(), PageId::new(0));
    }

    #[test]
    fn test_read_invalid_page() {
        let dir = tempdir().unwrap();
        let pf = PageFile::open(dir.path().join("test.idx"), OpenMode::ReadWrite, false).unwrap();
        pf.write(PageId::new(0), &Page::new()).unwrap();

        let result = pf.read_page(PageId::new(1));
        assert!(matches!(result, Err(Error::PageNotFound(1))));
    }

    #[test]
    fn test_persistence_and_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        {
            let pf = PageFile::open(&path, OpenMode::ReadWrite, false).unwrap();
            pf.write(PageId::new(0), &filled(0x42)).unwrap();
            pf.close().unwrap();
        }

        let pf = PageFile::open(&path, OpenMode::ReadOnly, false).unwrap();
        assert_eq!(pf.end_pid(), PageId::new(1));
        assert_eq!(pf.read_page(PageId::new(0)).unwrap().as_slice()[0], 0x42);

        let result = pf.write(PageId::new(0), &Page::new());
        assert!(matches!(result, Err(Error::ReadOnly)));
    }

    #[test]
    fn test_stats_count_traffic() {
        let dir = tempdir().unwrap();
        let pf = PageFile::open(dir.path().join("test.idx"), OpenMode::ReadWrite, false).unwrap();

        pf.write(PageId::new(0), &Page::new()).unwrap();
        pf.write(PageId::new(0), &Page::new()).unwrap();
        pf.read_page(PageId::new(0)).unwrap();

        let stats = pf.stats();
        assert_eq!(stats.pages_written, 2);
        assert_eq!(stats.pages_appended, 1);
        assert_eq!(stats.pages_read, 1);
    }
}
