//! Page acquisition on behalf of transactions.

use crate::catalog::Catalog;
use crate::heap::HeapPage;
use quarry_buffer::{BufferPool, BufferPoolConfig, BufferPoolStats};
use quarry_common::{PageId, Permissions, Result, TableId, TransactionId};
use std::sync::Arc;
use tracing::trace;

/// Source of pages for scans.
///
/// Every page a query reads is requested here, tagged with the transaction
/// and the access it needs, so caching and concurrency control have a
/// single place to hook in.
pub trait PageCache: Send + Sync {
    fn get_page(
        &self,
        tx: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> Result<Arc<HeapPage>>;
}

/// Page cache backed by a [`BufferPool`] of decoded heap pages.
///
/// Misses are resolved by looking the page's table up in the catalog and
/// reading the page from its heap file.
pub struct BufferedPageCache {
    pool: BufferPool<HeapPage>,
    catalog: Arc<Catalog>,
}

impl BufferedPageCache {
    pub fn new(catalog: Arc<Catalog>, config: BufferPoolConfig) -> Self {
        Self {
            pool: BufferPool::new(config),
            catalog,
        }
    }

    /// Drops a page from the cache so the next request rereads it from disk.
    pub fn discard_page(&self, page_id: PageId) -> bool {
        self.pool.discard_page(page_id)
    }

    /// Drops every cached page of one table, e.g. after its catalog entry was replaced.
    pub fn discard_table(&self, table_id: TableId) -> usize {
        self.pool.discard_table(table_id)
    }

    /// Drops every cached page.
    pub fn clear(&self) {
        self.pool.clear();
    }

    pub fn stats(&self) -> BufferPoolStats {
        self.pool.stats()
    }
}

impl PageCache for BufferedPageCache {
    fn get_page(
        &self,
        tx: TransactionId,
        page_id: PageId,
        perm: Permissions,
    ) -> Result<Arc<HeapPage>> {
        trace!(%tx, %page_id, %perm, "get_page");
        self.pool.get_or_load(page_id, || {
            let file = self.catalog.heap_file(page_id.table_id)?;
            file.read_page(page_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::heap::{HeapFile, HeapFileEncoder};
    use crate::schema::Schema;
    use crate::tuple::Tuple;
    use quarry_common::{QuarryError, Type};
    use tempfile::TempDir;

    fn setup(pool_pages: usize) -> (TempDir, Arc<Catalog>, BufferedPageCache, TableId) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.dat");
        let schema = Arc::new(Schema::named(&[(Type::Int, "v")]));
        // 8 / 4 = 2 tuples per page, 6 tuples over 3 pages.
        let tuples = (0..6).map(|i| Tuple::from_fields(Arc::clone(&schema), vec![Field::Int(i)]));
        HeapFileEncoder::write_tuples(&path, Arc::clone(&schema), 8, tuples).unwrap();

        let catalog = Arc::new(Catalog::new());
        let file = Arc::new(HeapFile::open(&path, schema, 8).unwrap());
        let id = catalog.add_table(file, "t");
        let cache = BufferedPageCache::new(
            Arc::clone(&catalog),
            BufferPoolConfig {
                num_frames: pool_pages,
            },
        );
        (dir, catalog, cache, id)
    }

    #[test]
    fn test_cache_loads_through_catalog() {
        let (_dir, _catalog, cache, id) = setup(4);
        let tx = TransactionId::new();

        let page = cache
            .get_page(tx, PageId::new(id, 1), Permissions::ReadOnly)
            .unwrap();
        let values: Vec<_> = page.iter().map(|t| t.get(0).cloned().unwrap()).collect();
        assert_eq!(values, vec![Field::Int(2), Field::Int(3)]);

        let again = cache
            .get_page(tx, PageId::new(id, 1), Permissions::ReadOnly)
            .unwrap();
        assert!(Arc::ptr_eq(&page, &again));
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_cache_unknown_table_and_page() {
        let (_dir, _catalog, cache, id) = setup(4);
        let tx = TransactionId::new();

        let err = cache
            .get_page(tx, PageId::new(TableId(0), 0), Permissions::ReadOnly)
            .unwrap_err();
        assert!(matches!(err, QuarryError::TableNotFound(_)));

        let err = cache
            .get_page(tx, PageId::new(id, 3), Permissions::ReadOnly)
            .unwrap_err();
        assert!(matches!(err, QuarryError::PageNotFound(_)));
    }

    #[test]
    fn test_cache_evicts_beyond_capacity() {
        let (_dir, _catalog, cache, id) = setup(2);
        let tx = TransactionId::new();
        for page_num in 0..3 {
            cache
                .get_page(tx, PageId::new(id, page_num), Permissions::ReadOnly)
                .unwrap();
        }
        let stats = cache.stats();
        assert_eq!(stats.used_frames, 2);
        assert_eq!(stats.misses, 3);

        assert!(cache.discard_page(PageId::new(id, 2)));
        cache.clear();
        assert_eq!(cache.stats().used_frames, 0);
    }
}
