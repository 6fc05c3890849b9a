//! Page I/O statistics.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the page traffic of one [`PageFile`](super::PageFile).
///
/// All fields are atomic so they can be bumped through `&self`. `Relaxed`
/// ordering is enough: the counters are independent and only read for
/// reporting.
///
/// # Example
/// ```
/// use pageindex::storage::IoStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = IoStats::new();
/// stats.pages_read.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().pages_read, 1);
/// ```
#[derive(Debug)]
pub struct IoStats {
    /// Pages read from the file.
    pub pages_read: AtomicU64,

    /// Pages written in place or appended.
    pub pages_written: AtomicU64,

    /// Writes that extended the file by one page.
    pub pages_appended: AtomicU64,
}

impl IoStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            pages_read: AtomicU64::new(0),
            pages_written: AtomicU64::new(0),
            pages_appended: AtomicU64::new(0),
        }
    }

    /// Get a point-in-time copy of the counters.
    pub fn snapshot(&self) -> IoStatsSnapshot {
        IoStatsSnapshot {
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
            pages_appended: self.pages_appended.load(Ordering::Relaxed),
        }
    }
}

impl Default for IoStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of [`IoStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStatsSnapshot {
    pub pages_read: u64,
    pub pages_written: u64,
    pub pages_appended: u64,
}

impl IoStatsSnapshot {
    /// Counters accumulated since `earlier` was taken.
    pub fn since(&self, earlier: &IoStatsSnapshot) -> IoStatsSnapshot {
        IoStatsSnapshot {
            pages_read: self.pages_read - earlier.pages_read,
            pages_written: self.pages_written - earlier.pages_written,
            pages_appended: self.pages_appended - earlier.pages_appended,
        }
    }
}

impl fmt::Display for IoStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IoStats {{ read: {}, written: {}, appended: {} }}",
            self.pages_read, self.pages_written, self.pages_appended
        )
    }
}
