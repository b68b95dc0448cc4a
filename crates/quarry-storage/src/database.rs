//! Database handle tying the catalog and page cache together.

use crate::cache::{BufferedPageCache, PageCache};
use crate::catalog::Catalog;
use crate::heap::HeapFile;
use crate::schema::Schema;
use quarry_buffer::BufferPoolConfig;
use quarry_common::{Result, StorageConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared state every query needs: configuration, catalog and page cache.
pub struct Database {
    config: StorageConfig,
    catalog: Arc<Catalog>,
    pages: Arc<BufferedPageCache>,
}

impl Database {
    /// Validates `config` and creates an empty database.
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(Catalog::new());
        let pages = Arc::new(BufferedPageCache::new(
            Arc::clone(&catalog),
            BufferPoolConfig::from(&config),
        ));
        info!(
            page_size = config.page_size,
            buffer_pool_pages = config.buffer_pool_pages,
            "database initialized"
        );
        Ok(Self {
            config,
            catalog,
            pages,
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The page cache, typed for callers that only need page access.
    pub fn page_cache(&self) -> Arc<dyn PageCache> {
        self.pages.clone()
    }

    pub fn buffered_cache(&self) -> &Arc<BufferedPageCache> {
        &self.pages
    }

    /// Opens the heap file at `path` with the configured page size and registers it as `name`.
    ///
    /// Reopening a path replaces its catalog entry, and any pages cached
    /// from the previous registration are dropped.
    pub fn open_table(
        &self,
        path: impl AsRef<Path>,
        schema: Arc<Schema>,
        name: impl Into<String>,
    ) -> Result<Arc<HeapFile>> {
        let file = Arc::new(HeapFile::open(path, schema, self.config.page_size)?);
        let id = self.catalog.add_table(Arc::clone(&file), name);
        let stale = self.pages.discard_table(id);
        if stale > 0 {
            debug!(table_id = %id, pages = stale, "dropped cached pages of replaced table");
        }
        Ok(file)
    }
}

impl Default for Database {
    fn default() -> Self {
        let config = StorageConfig::default();
        let catalog = Arc::new(Catalog::new());
        let pages = Arc::new(BufferedPageCache::new(
            Arc::clone(&catalog),
            BufferPoolConfig::from(&config),
        ));
        Self {
            config,
            catalog,
            pages,
        }
    }
}
