//! Heap file: one table's pages laid end to end in a single file.
//!
//! The file has no header or footer. Page `n` starts at byte
//! `n * layout.stride()`, and a trailing page cut short by the end of the
//! file reads as if zero-filled.

use super::iter::HeapFileIterator;
use super::layout::PageLayout;
use super::page::HeapPage;
use crate::cache::PageCache;
use crate::schema::Schema;
use crate::tuple::Tuple;
use parking_lot::Mutex;
use quarry_common::{PageId, QuarryError, Result, TableId, TransactionId};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Read-only handle on a heap file.
pub struct HeapFile {
    id: TableId,
    path: PathBuf,
    schema: Arc<Schema>,
    layout: PageLayout,
    file: Mutex<File>,
}

impl HeapFile {
    /// Opens the heap file at `path`, whose rows follow `schema`.
    ///
    /// `page_size` is the payload capacity of each page, excluding the slot bitmap.
    pub fn open(path: impl AsRef<Path>, schema: Arc<Schema>, page_size: usize) -> Result<Self> {
        let path = path.as_ref().canonicalize()?;
        let file = File::open(&path)?;
        let id = TableId::from_canonical(&path);

        let layout = PageLayout::new(page_size, schema.byte_size());
        layout.validate()?;

        debug!(
            path = %path.display(),
            table_id = %id,
            tuples_per_page = layout.tuples_per_page(),
            header_bytes = layout.header_bytes(),
            "opened heap file"
        );

        Ok(Self {
            id,
            path,
            schema,
            layout,
            file: Mutex::new(file),
        })
    }

    /// Stable identity of this file, derived from its canonical path.
    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    /// Bytes each page occupies on disk, bitmap included.
    pub fn bytes_per_page(&self) -> usize {
        self.layout.stride()
    }

    /// Number of pages in the file, counting a trailing partial page.
    pub fn num_pages(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        self.layout.num_pages(len)
    }

    /// Reads and decodes one page straight from disk.
    ///
    /// Scans should go through a [`PageCache`] instead; this is the
    /// cache's miss path.
    pub fn read_page(&self, page_id: PageId) -> Result<HeapPage> {
        if page_id.table_id != self.id {
            return Err(QuarryError::PageNotFound(page_id));
        }

        let stride = self.layout.stride();
        let mut buf = vec![0u8; stride];
        let filled = {
            let mut file = self.file.lock();
            let num_pages = self.layout.num_pages(file.metadata()?.len())?;
            if page_id.page_num >= num_pages {
                return Err(QuarryError::PageNotFound(page_id));
            }

            file.seek(SeekFrom::Start(self.layout.page_offset(page_id.page_num)))?;
            let mut filled = 0;
            while filled < stride {
                match file.read(&mut buf[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            filled
        };

        trace!(%page_id, bytes = filled, "read heap page");
        HeapPage::decode(page_id, Arc::clone(&self.schema), self.layout, &buf)
    }

    /// Tuple insertion is not supported by heap files.
    pub fn insert_tuple(&self, _tx: TransactionId, _tuple: &Tuple) -> Result<Vec<PageId>> {
        Err(QuarryError::Unsupported(format!(
            "insert into heap file {}",
            self.path.display()
        )))
    }

    /// Tuple deletion is not supported by heap files.
    pub fn delete_tuple(&self, _tx: TransactionId, _tuple: &Tuple) -> Result<PageId> {
        Err(QuarryError::Unsupported(format!(
            "delete from heap file {}",
            self.path.display()
        )))
    }

    /// Writing pages back is not supported by heap files.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        Err(QuarryError::Unsupported(format!(
            "write of page {} to heap file {}",
            page.id(),
            self.path.display()
        )))
    }

    /// Returns an iterator over every tuple in the file.
    ///
    /// Pages are requested from `cache` read-only on behalf of `tx`.
    pub fn iter(self: &Arc<Self>, tx: TransactionId, cache: Arc<dyn PageCache>) -> HeapFileIterator {
        HeapFileIterator::new(Arc::clone(self), tx, cache)
    }
}

impl std::fmt::Debug for HeapFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapFile")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("schema", &self.schema.to_string())
            .field("layout", &self.layout)
            .finish()
    }
}
