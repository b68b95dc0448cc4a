//! Registry of the tables known to the database.

use crate::heap::HeapFile;
use crate::schema::Schema;
use parking_lot::RwLock;
use quarry_common::{QuarryError, Result, TableId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

struct TableEntry {
    file: Arc<HeapFile>,
    name: String,
}

#[derive(Default)]
struct CatalogInner {
    tables: HashMap<TableId, TableEntry>,
    names: HashMap<String, TableId>,
}

/// Maps table ids to their heap file, schema and name, and names back to ids.
///
/// Registering a name that is already taken points the name at the new
/// table. Registering an id that is already present replaces its entry.
#[derive(Default)]
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `file` under `name`, keyed by the file's id.
    ///
    /// The table's schema is the one the file was opened with.
    pub fn add_table(&self, file: Arc<HeapFile>, name: impl Into<String>) -> TableId {
        let name = name.into();
        let id = file.id();
        let mut inner = self.inner.write();

        if let Some(previous) = inner.tables.get(&id) {
            if previous.name != name && inner.names.get(&previous.name) == Some(&id) {
                let stale = previous.name.clone();
                inner.names.remove(&stale);
            }
        }

        debug!(table_id = %id, name = %name, schema = %file.schema(), "registered table");
        inner.names.insert(name.clone(), id);
        inner.tables.insert(id, TableEntry { file, name });
        id
    }

    /// Looks up a table id by name.
    pub fn table_id(&self, name: &str) -> Result<TableId> {
        self.inner
            .read()
            .names
            .get(name)
            .copied()
            .ok_or_else(|| QuarryError::TableNotFound(name.to_string()))
    }

    pub fn schema(&self, id: TableId) -> Result<Arc<Schema>> {
        self.with_entry(id, |entry| Arc::clone(entry.file.schema()))
    }

    pub fn heap_file(&self, id: TableId) -> Result<Arc<HeapFile>> {
        self.with_entry(id, |entry| Arc::clone(&entry.file))
    }

    pub fn table_name(&self, id: TableId) -> Result<String> {
        self.with_entry(id, |entry| entry.name.clone())
    }

    fn with_entry<T>(&self, id: TableId, f: impl FnOnce(&TableEntry) -> T) -> Result<T> {
        self.inner
            .read()
            .tables
            .get(&id)
            .map(f)
            .ok_or_else(|| QuarryError::TableNotFound(id.to_string()))
    }

    /// Returns the ids of every registered table, in no particular order.
    pub fn table_ids(&self) -> Vec<TableId> {
        self.inner.read().tables.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every table.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.tables.clear();
        inner.names.clear();
    }
}
