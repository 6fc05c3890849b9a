//! Page types and layout.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container
//! - [`MetaPage`] - The index metadata stored in page 0

mod meta_page;
#[allow(clippy::module_inception)]
mod page;

pub use meta_page::MetaPage;
pub use page::Page;
