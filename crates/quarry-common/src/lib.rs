//! Quarry common types, errors, and utilities.
//!
//! This crate provides shared definitions used across all Quarry components.

pub mod config;
pub mod error;
pub mod page;
pub mod txn;
pub mod types;

pub use config::{DEFAULT_POOL_PAGES, StorageConfig};
pub use error::{QuarryError, Result};
pub use page::{PAGE_SIZE, PageId, RecordId, TableId};
pub use txn::{Permissions, TransactionId};
pub use types::{STRING_LEN, Type};
