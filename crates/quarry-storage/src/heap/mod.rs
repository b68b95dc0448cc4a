//! Heap storage implementation.
//!
//! This module provides heap-based tuple storage with:
//! - PageLayout: page geometry derived from page size and tuple width
//! - HeapPage: slot-bitmap page codec for fixed-width tuples
//! - HeapFile: read-only paged file access
//! - HeapFileIterator: scan over a file through the page cache
//! - HeapFileEncoder: bulk loading of new heap files

mod file;
mod iter;
mod layout;
mod page;
mod writer;

pub use file::HeapFile;
pub use iter::{FileIterator, HeapFileIterator};
pub use layout::PageLayout;
pub use page::HeapPage;
pub use writer::HeapFileEncoder;
