//! Sequential table scan.

use crate::operator::OpIterator;
use quarry_common::{QuarryError, Result, TableId, TransactionId};
use quarry_storage::{Catalog, Database, FileIterator, HeapFileIterator, PageCache, Schema, Tuple};
use std::sync::Arc;
use tracing::debug;

/// Reads every tuple of one table, in page and slot order.
///
/// Output columns are named `alias.column`. A missing alias or column name
/// is written as `null`, so an unaliased scan of `qty` yields `null.qty`.
pub struct SeqScan {
    catalog: Arc<Catalog>,
    cache: Arc<dyn PageCache>,
    tx: TransactionId,
    table_id: TableId,
    alias: Option<String>,
    schema: Arc<Schema>,
    iter: Option<HeapFileIterator>,
}

impl SeqScan {
    /// Creates a scan over `table_id` using the database's catalog and page cache.
    pub fn new(db: &Database, tx: TransactionId, table_id: TableId, alias: Option<&str>) -> Result<Self> {
        Self::with_cache(Arc::clone(db.catalog()), db.page_cache(), tx, table_id, alias)
    }

    /// Creates a scan that reads pages through `cache`.
    ///
    /// Fails with `TableNotFound` if the table is not registered.
    pub fn with_cache(
        catalog: Arc<Catalog>,
        cache: Arc<dyn PageCache>,
        tx: TransactionId,
        table_id: TableId,
        alias: Option<&str>,
    ) -> Result<Self> {
        let table_schema = catalog.schema(table_id)?;
        let schema = Arc::new(table_schema.rename(|name| Some(qualified_name(alias, name))));
        Ok(Self {
            catalog,
            cache,
            tx,
            table_id,
            alias: alias.map(str::to_string),
            schema,
            iter: None,
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Registered name of the scanned table.
    pub fn table_name(&self) -> Result<String> {
        self.catalog.table_name(self.table_id)
    }

    fn iter_mut(&mut self, method: &'static str) -> Result<&mut HeapFileIterator> {
        self.iter.as_mut().ok_or(QuarryError::NotOpen(method))
    }
}

/// Builds `alias.name`, substituting `null` for whichever side is absent.
fn qualified_name(alias: Option<&str>, name: Option<&str>) -> String {
    format!("{}.{}", alias.unwrap_or("null"), name.unwrap_or("null"))
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> Result<()> {
        let file = self.catalog.heap_file(self.table_id)?;
        // The table may have been re-registered since this scan was built.
        if file.schema().as_ref() != self.schema.as_ref() {
            return Err(QuarryError::TypeMismatch {
                expected: self.schema.to_string(),
                actual: file.schema().to_string(),
            });
        }
        let mut iter = file.iter(self.tx, Arc::clone(&self.cache));
        iter.open()?;
        debug!(
            table_id = %self.table_id,
            alias = self.alias.as_deref().unwrap_or("null"),
            tx = %self.tx,
            "scan opened"
        );
        self.iter = Some(iter);
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        self.iter_mut("has_next")?.has_next()
    }

    fn next(&mut self) -> Result<Tuple> {
        self.iter_mut("next")?.next()
    }

    fn rewind(&mut self) -> Result<()> {
        self.iter_mut("rewind")?.rewind()
    }

    fn close(&mut self) {
        if let Some(mut iter) = self.iter.take() {
            iter.close();
            debug!(table_id = %self.table_id, "scan closed");
        }
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::drain;
    use quarry_common::Type;
    use quarry_storage::{Column, Field, HeapFileEncoder};
    use tempfile::TempDir;

    fn setup(schema: Schema, rows: &[i32]) -> (TempDir, Database, TableId) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.dat");
        let schema = Arc::new(schema);
        let tuples = rows.iter().map(|v| {
            let mut tuple = Tuple::new(Arc::clone(&schema));
            for i in 0..schema.num_fields() {
                tuple.set(i, Field::Int(*v));
            }
            tuple
        });
        HeapFileEncoder::write_tuples(&path, Arc::clone(&schema), 4096, tuples).unwrap();

        let db = Database::default();
        let file = db.open_table(&path, schema, "things").unwrap();
        (dir, db, file.id())
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name(Some("e"), Some("name")), "e.name");
        assert_eq!(qualified_name(None, Some("qty")), "null.qty");
        assert_eq!(qualified_name(Some("e"), None), "e.null");
        assert_eq!(qualified_name(None, None), "null.null");
    }

    #[test]
    fn test_scan_alias_schema() {
        let schema = Schema::new(vec![Column::new(Type::Int, "name"), Column::unnamed(Type::Int)]);
        let (_dir, db, id) = setup(schema, &[]);
        let tx = TransactionId::new();

        let scan = SeqScan::new(&db, tx, id, Some("e")).unwrap();
        assert_eq!(scan.schema().field_name(0).unwrap(), Some("e.name"));
        assert_eq!(scan.schema().field_name(1).unwrap(), Some("e.null"));
        assert_eq!(scan.table_name().unwrap(), "things");

        let bare = SeqScan::new(&db, tx, id, None).unwrap();
        assert_eq!(bare.schema().field_name(0).unwrap(), Some("null.name"));
        assert_eq!(bare.schema().field_name(1).unwrap(), Some("null.null"));
        assert_eq!(bare.schema().as_ref(), db.catalog().schema(id).unwrap().as_ref());
    }

    #[test]
    fn test_scan_reads_all_rows_and_rewinds() {
        let (_dir, db, id) = setup(Schema::named(&[(Type::Int, "v")]), &[4, 8, 15, 16, 23, 42]);
        let mut scan = SeqScan::new(&db, TransactionId::new(), id, Some("t")).unwrap();

        scan.open().unwrap();
        let values: Vec<i32> = drain(&mut scan)
            .unwrap()
            .iter()
            .filter_map(|t| t.get(0).and_then(Field::as_int))
            .collect();
        assert_eq!(values, vec![4, 8, 15, 16, 23, 42]);
        assert!(matches!(scan.next(), Err(QuarryError::NoSuchElement)));

        scan.rewind().unwrap();
        assert_eq!(drain(&mut scan).unwrap().len(), 6);
        scan.close();
        scan.close();
    }

    #[test]
    fn test_scan_unknown_table() {
        let db = Database::default();
        let err = SeqScan::new(&db, TransactionId::new(), TableId(7), None)
            .err()
            .unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_scan_protocol_before_open() {
        let (_dir, db, id) = setup(Schema::named(&[(Type::Int, "v")]), &[1]);
        let mut scan = SeqScan::new(&db, TransactionId::new(), id, None).unwrap();
        assert!(matches!(scan.has_next(), Err(QuarryError::NotOpen("has_next"))));
        assert!(matches!(scan.next(), Err(QuarryError::NotOpen("next"))));
        assert!(matches!(scan.rewind(), Err(QuarryError::NotOpen("rewind"))));
    }
}
