//! Storage engine for Quarry.
//!
//! This crate provides:
//! - Field values, schemas and tuples
//! - Heap pages with a slot bitmap and fixed-width rows
//! - HeapFile for read-only paged file access, plus a bulk encoder
//! - The page cache seam scans read through
//! - The catalog of registered tables

mod cache;
mod catalog;
mod database;
mod field;
mod heap;
mod schema;
mod tuple;

pub use cache::{BufferedPageCache, PageCache};
pub use catalog::Catalog;
pub use database::Database;
pub use field::{CompareOp, Field};
pub use heap::{
    FileIterator, HeapFile, HeapFileEncoder, HeapFileIterator, HeapPage, PageLayout,
};
pub use schema::{Column, Schema};
pub use tuple::Tuple;
