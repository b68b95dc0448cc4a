//! Error types for Quarry.

use crate::page::{PageId, RecordId};
use thiserror::Error;

/// Result type alias using QuarryError.
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Errors that can occur in Quarry operations.
#[derive(Debug, Error)]
pub enum QuarryError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Lookup errors
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Field index {index} out of range for schema with {len} fields")]
    FieldIndexOutOfRange { index: usize, len: usize },

    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Tuple not found: {0}")]
    TupleNotFound(RecordId),

    // Storage errors
    #[error("Page corrupted: {page_id}, reason: {reason}")]
    PageCorrupted { page_id: PageId, reason: String },

    #[error("Page full, unable to insert tuple into {0}")]
    PageFull(PageId),

    #[error("Buffer pool full, unable to allocate frame")]
    BufferPoolFull,

    // Type errors
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // Iterator protocol errors
    #[error("Iterator not open: {0} called before open")]
    NotOpen(&'static str),

    #[error("No more tuples")]
    NoSuchElement,

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}

impl QuarryError {
    /// Returns true for failures caused by a missing table, field or page.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QuarryError::TableNotFound(_)
                | QuarryError::FieldNotFound(_)
                | QuarryError::FieldIndexOutOfRange { .. }
                | QuarryError::PageNotFound(_)
                | QuarryError::TupleNotFound(_)
        )
    }
}
