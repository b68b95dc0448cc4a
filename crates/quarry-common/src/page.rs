//! Page and record addressing for Quarry storage.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

/// Default page payload capacity in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Stable identity of a table's backing file.
///
/// Derived from the file's canonical path, so every handle opened on the
/// same file agrees on the id. Used as the catalog key and as the table
/// component of every PageId.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub u64);

impl TableId {
    /// Computes the id for the file at `path`, resolving it to its canonical form first.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let canonical = path.as_ref().canonicalize()?;
        Ok(Self::from_canonical(&canonical))
    }

    /// Computes the id for an already canonical path.
    pub fn from_canonical(path: &Path) -> Self {
        TableId(xxh3_64(path.as_os_str().as_encoded_bytes()))
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one page of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId {
    pub table_id: TableId,
    /// Page number within the file (0-indexed).
    pub page_num: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_num: u32) -> Self {
        Self { table_id, page_num }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.page_num)
    }
}

/// Storage location of a tuple: the page it lives on and its slot within that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page_id, self.slot)
    }
}
