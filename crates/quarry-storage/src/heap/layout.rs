//! Heap page geometry.
//!
//! Nothing here is stored on disk; every quantity follows from the page
//! payload capacity and the schema's tuple width.

use quarry_common::{QuarryError, Result};

/// Bits per word of the slot bitmap.
pub const BITMAP_WORD_BITS: usize = 32;

/// Bytes per word of the slot bitmap.
pub const BITMAP_WORD_BYTES: usize = 4;

/// Upper bound on slots per page; record ids address slots with a `u16`.
pub const MAX_SLOTS_PER_PAGE: usize = u16::MAX as usize + 1;

/// Derived layout of every page of one heap file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    page_size: usize,
    tuple_size: usize,
    tuples_per_page: usize,
    header_bytes: usize,
}

impl PageLayout {
    /// Computes the layout for pages of `page_size` payload bytes holding
    /// tuples `tuple_size` bytes wide.
    ///
    /// # Panics
    ///
    /// Panics if `tuple_size` is zero.
    pub fn new(page_size: usize, tuple_size: usize) -> Self {
        assert!(tuple_size > 0, "tuples must occupy at least one byte");
        let tuples_per_page = page_size / tuple_size;
        let header_bytes = tuples_per_page.div_ceil(BITMAP_WORD_BITS) * BITMAP_WORD_BYTES;
        Self {
            page_size,
            tuple_size,
            tuples_per_page,
            header_bytes,
        }
    }

    /// Checks that pages hold at least one tuple and no more slots than a
    /// record id can address.
    pub fn validate(&self) -> Result<()> {
        if self.tuples_per_page == 0 {
            return Err(QuarryError::InvalidParameter {
                name: "page_size".to_string(),
                value: format!("{} (tuples are {} bytes)", self.page_size, self.tuple_size),
            });
        }
        if self.tuples_per_page > MAX_SLOTS_PER_PAGE {
            return Err(QuarryError::InvalidParameter {
                name: "page_size".to_string(),
                value: format!(
                    "{} ({} slots per page, at most {MAX_SLOTS_PER_PAGE})",
                    self.page_size, self.tuples_per_page
                ),
            });
        }
        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    /// Number of tuple slots on each page.
    pub fn tuples_per_page(&self) -> usize {
        self.tuples_per_page
    }

    /// Size of the slot bitmap, a whole number of 4-byte words.
    pub fn header_bytes(&self) -> usize {
        self.header_bytes
    }

    /// Number of 32-bit words in the slot bitmap.
    pub fn header_words(&self) -> usize {
        self.header_bytes / BITMAP_WORD_BYTES
    }

    /// Bytes one page occupies in the file.
    pub fn stride(&self) -> usize {
        self.header_bytes + self.page_size
    }

    /// Byte offset of the given slot's row within a page.
    pub fn slot_offset(&self, slot: usize) -> usize {
        self.header_bytes + slot * self.tuple_size
    }

    /// Byte offset of the given page within the file.
    pub fn page_offset(&self, page_num: u32) -> u64 {
        page_num as u64 * self.stride() as u64
    }

    /// Number of pages in a file of `file_len` bytes, counting a trailing partial page.
    ///
    /// Fails if the file holds more pages than a `u32` page number can address.
    pub fn num_pages(&self, file_len: u64) -> Result<u32> {
        let pages = file_len.div_ceil(self.stride() as u64);
        u32::try_from(pages).map_err(|_| QuarryError::InvalidParameter {
            name: "file_len".to_string(),
            value: format!("{file_len} ({pages} pages exceed the page number range)"),
        })
    }
}
