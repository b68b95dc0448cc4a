//! Configuration structures for Quarry.

use crate::error::{QuarryError, Result};
use crate::page::PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Default number of pages held by the page cache.
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Storage configuration for the database engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Payload capacity of one heap page in bytes, excluding the slot bitmap.
    pub page_size: usize,
    /// Page cache size in number of pages.
    pub buffer_pool_pages: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            buffer_pool_pages: DEFAULT_POOL_PAGES,
        }
    }
}

impl StorageConfig {
    /// Parses a JSON configuration document and validates it.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StorageConfig = serde_json::from_str(json)
            .map_err(|e| QuarryError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the storage layer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(invalid("page_size", self.page_size));
        }
        if self.page_size > u32::MAX as usize {
            return Err(invalid("page_size", self.page_size));
        }
        if self.buffer_pool_pages == 0 {
            return Err(invalid("buffer_pool_pages", self.buffer_pool_pages));
        }
        Ok(())
    }

    /// Returns the payload bytes cached by a full page cache.
    pub fn buffer_pool_size_bytes(&self) -> usize {
        self.buffer_pool_pages * self.page_size
    }
}

fn invalid(name: &str, value: usize) -> QuarryError {
    QuarryError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    }
}
