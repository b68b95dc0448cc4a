//! Page-at-a-time tuple iteration over a heap file.

use super::file::HeapFile;
use super::page::HeapPage;
use crate::cache::PageCache;
use crate::tuple::Tuple;
use quarry_common::{PageId, Permissions, QuarryError, Result, TransactionId};
use std::sync::Arc;
use tracing::trace;

/// Cursor protocol shared by file-level tuple iterators.
///
/// `open` must be called before anything else; `close` releases any page
/// held and can be called at any time.
pub trait FileIterator {
    fn open(&mut self) -> Result<()>;

    fn has_next(&mut self) -> Result<bool>;

    /// Returns the next tuple, or `NoSuchElement` once the file is exhausted.
    fn next(&mut self) -> Result<Tuple>;

    /// Restarts from the first page.
    fn rewind(&mut self) -> Result<()>;

    fn close(&mut self);
}

/// Iterates over a heap file's tuples in page and slot order.
///
/// Pages are always obtained from the page cache read-only, never from the
/// file directly. The current page stays referenced, and therefore pinned
/// in the cache, until the iterator moves past it or is closed.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    tx: TransactionId,
    cache: Arc<dyn PageCache>,
    scan: Option<ScanState>,
}

struct ScanState {
    num_pages: u32,
    next_page: u32,
    cursor: Option<PageCursor>,
    lookahead: Option<Tuple>,
}

struct PageCursor {
    page: Arc<HeapPage>,
    slot: usize,
}

impl PageCursor {
    fn next_tuple(&mut self) -> Option<Tuple> {
        let slots = self.page.layout().tuples_per_page();
        while self.slot < slots {
            let slot = self.slot;
            self.slot += 1;
            if let Some(tuple) = self.page.tuple(slot) {
                return Some(tuple.clone());
            }
        }
        None
    }
}

impl HeapFileIterator {
    pub fn new(file: Arc<HeapFile>, tx: TransactionId, cache: Arc<dyn PageCache>) -> Self {
        Self {
            file,
            tx,
            cache,
            scan: None,
        }
    }

    pub fn file(&self) -> &Arc<HeapFile> {
        &self.file
    }

    /// Pulls the next live tuple into the lookahead slot, fetching pages as needed.
    fn advance(&self, scan: &mut ScanState) -> Result<()> {
        loop {
            if let Some(tuple) = scan.cursor.as_mut().and_then(PageCursor::next_tuple) {
                scan.lookahead = Some(tuple);
                return Ok(());
            }
            scan.cursor = None;
            if scan.next_page >= scan.num_pages {
                return Ok(());
            }

            let page_id = PageId::new(self.file.id(), scan.next_page);
            let page = self
                .cache
                .get_page(self.tx, page_id, Permissions::ReadOnly)?;
            trace!(%page_id, live = page.num_tuples(), "scanning page");
            scan.next_page += 1;
            scan.cursor = Some(PageCursor { page, slot: 0 });
        }
    }
}

impl FileIterator for HeapFileIterator {
    fn open(&mut self) -> Result<()> {
        let num_pages = self.file.num_pages()?;
        self.scan = Some(ScanState {
            num_pages,
            next_page: 0,
            cursor: None,
            lookahead: None,
        });
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        let mut scan = self.scan.take().ok_or(QuarryError::NotOpen("has_next"))?;
        let result = match scan.lookahead {
            Some(_) => Ok(()),
            None => self.advance(&mut scan),
        };
        let available = scan.lookahead.is_some();
        self.scan = Some(scan);
        result.map(|()| available)
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(QuarryError::NoSuchElement);
        }
        self.scan
            .as_mut()
            .and_then(|scan| scan.lookahead.take())
            .ok_or(QuarryError::NoSuchElement)
    }

    fn rewind(&mut self) -> Result<()> {
        if self.scan.is_none() {
            return Err(QuarryError::NotOpen("rewind"));
        }
        self.close();
        self.open()
    }

    fn close(&mut self) {
        self.scan = None;
    }
}
