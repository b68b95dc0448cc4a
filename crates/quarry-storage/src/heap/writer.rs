//! Bulk loader that writes tuples into a new heap file.
//!
//! Tuples are packed into an in-memory page in arrival order; each full
//! page is encoded and appended to the file. This is how tables come into
//! existence, since heap files themselves accept no inserts.

use super::layout::PageLayout;
use super::page::HeapPage;
use crate::schema::Schema;
use crate::tuple::Tuple;
use quarry_common::{PageId, Result, TableId};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Streams tuples into a freshly created heap file.
pub struct HeapFileEncoder {
    out: BufWriter<File>,
    table_id: TableId,
    schema: Arc<Schema>,
    layout: PageLayout,
    page: HeapPage,
    pages_written: u32,
    tuples_written: u64,
}

impl HeapFileEncoder {
    /// Creates (or truncates) the file at `path`.
    pub fn create(path: impl AsRef<Path>, schema: Arc<Schema>, page_size: usize) -> Result<Self> {
        let layout = PageLayout::new(page_size, schema.byte_size());
        layout.validate()?;

        let path = path.as_ref();
        let file = File::create(path)?;
        let table_id = TableId::from_path(path)?;

        let page = HeapPage::empty(PageId::new(table_id, 0), Arc::clone(&schema), layout);
        Ok(Self {
            out: BufWriter::new(file),
            table_id,
            schema,
            layout,
            page,
            pages_written: 0,
            tuples_written: 0,
        })
    }

    /// Writes `tuples` to a new file at `path` and returns the number of pages written.
    pub fn write_tuples<I>(
        path: impl AsRef<Path>,
        schema: Arc<Schema>,
        page_size: usize,
        tuples: I,
    ) -> Result<u32>
    where
        I: IntoIterator<Item = Tuple>,
    {
        let mut encoder = Self::create(path, schema, page_size)?;
        for tuple in tuples {
            encoder.append(tuple)?;
        }
        encoder.finish()
    }

    /// Adds a tuple to the current page, starting a new page when it is full.
    pub fn append(&mut self, tuple: Tuple) -> Result<()> {
        if self.page.num_empty_slots() == 0 {
            self.finish_page()?;
        }
        self.page.insert_tuple(tuple)?;
        self.tuples_written += 1;
        Ok(())
    }

    /// Writes out the current page, even if it holds no tuples, and starts the next one.
    pub fn finish_page(&mut self) -> Result<()> {
        let bytes = self.page.encode()?;
        self.out.write_all(&bytes)?;
        self.pages_written += 1;
        self.page = HeapPage::empty(
            PageId::new(self.table_id, self.pages_written),
            Arc::clone(&self.schema),
            self.layout,
        );
        Ok(())
    }

    pub fn pages_written(&self) -> u32 {
        self.pages_written
    }

    pub fn tuples_written(&self) -> u64 {
        self.tuples_written
    }

    /// Flushes the last non-empty page and syncs the file.
    ///
    /// Returns the total number of pages in the file.
    pub fn finish(mut self) -> Result<u32> {
        if self.page.num_tuples() > 0 {
            self.finish_page()?;
        }
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        debug!(
            table_id = %self.table_id,
            pages = self.pages_written,
            tuples = self.tuples_written,
            "heap file written"
        );
        Ok(self.pages_written)
    }
}
