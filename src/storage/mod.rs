//! Storage layer - disk I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`PageFile`] - Page-granular file I/O
//! - [`IoStats`] - Page traffic counters
//! - [`page`] - Page buffer and meta page layout

mod io_stats;
pub mod page;
mod page_file;

pub use io_stats::{IoStats, IoStatsSnapshot};
pub use page_file::PageFile;
