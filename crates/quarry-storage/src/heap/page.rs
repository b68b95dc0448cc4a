//! Heap page codec using a slot bitmap and fixed-width rows.
//!
//! Page layout:
//! ```text
//! +----------------------------+
//! | Slot bitmap                |  header_bytes, big-endian u32 words,
//! | (1 bit per slot)           |  slot i = bit (i % 32) of word (i / 32)
//! +----------------------------+
//! | Row 0                      |  tuple_size bytes each, fields in
//! | Row 1                      |  schema order
//! | ...                        |
//! +----------------------------+
//! | Unused tail                |  page_size - tuples_per_page * tuple_size
//! +----------------------------+
//! ```

use super::layout::{BITMAP_WORD_BITS, PageLayout};
use crate::field::Field;
use crate::schema::Schema;
use crate::tuple::Tuple;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use quarry_common::{PageId, QuarryError, RecordId, Result, Type};
use std::borrow::Cow;
use std::sync::Arc;

/// A decoded heap page: the live tuples of one page, indexed by slot.
#[derive(Debug, Clone)]
pub struct HeapPage {
    page_id: PageId,
    schema: Arc<Schema>,
    layout: PageLayout,
    bitmap: Vec<u32>,
    slots: Vec<Option<Tuple>>,
}

impl HeapPage {
    /// Creates a page with every slot free.
    pub fn empty(page_id: PageId, schema: Arc<Schema>, layout: PageLayout) -> Self {
        Self {
            page_id,
            schema,
            bitmap: vec![0; layout.header_words()],
            slots: vec![None; layout.tuples_per_page()],
            layout,
        }
    }

    /// Decodes the raw bytes of one page.
    ///
    /// Input shorter than the page stride is treated as if padded with
    /// zeros, so a truncated trailing page decodes as partially or fully
    /// empty. Every decoded tuple carries its RecordId.
    pub fn decode(
        page_id: PageId,
        schema: Arc<Schema>,
        layout: PageLayout,
        data: &[u8],
    ) -> Result<Self> {
        let stride = layout.stride();
        let data: Cow<'_, [u8]> = if data.len() < stride {
            let mut padded = data.to_vec();
            padded.resize(stride, 0);
            Cow::Owned(padded)
        } else {
            Cow::Borrowed(&data[..stride])
        };

        let mut header = &data[..layout.header_bytes()];
        let bitmap: Vec<u32> = (0..layout.header_words()).map(|_| header.get_u32()).collect();

        let mut page = Self {
            page_id,
            schema,
            layout,
            bitmap,
            slots: vec![None; layout.tuples_per_page()],
        };

        for slot in 0..layout.tuples_per_page() {
            if !page.is_slot_used(slot) {
                continue;
            }
            let start = layout.slot_offset(slot);
            let mut row = &data[start..start + layout.tuple_size()];
            let tuple = page.decode_row(slot, &mut row).map_err(|e| QuarryError::PageCorrupted {
                page_id,
                reason: format!("slot {slot}: {e}"),
            })?;
            page.slots[slot] = Some(tuple);
        }

        Ok(page)
    }

    fn decode_row(&self, slot: usize, row: &mut &[u8]) -> Result<Tuple> {
        let fields = self
            .schema
            .iter()
            .map(|column| Field::parse(column.ty, &mut *row))
            .collect::<Result<Vec<_>>>()?;
        let mut tuple = Tuple::from_fields(Arc::clone(&self.schema), fields);
        tuple.set_record_id(Some(RecordId::new(self.page_id, slot as u16)));
        Ok(tuple)
    }

    /// Encodes the page into exactly `layout.stride()` bytes.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.layout.stride());
        for word in &self.bitmap {
            buf.put_u32(*word);
        }
        for slot in &self.slots {
            match slot {
                Some(tuple) => {
                    for (column, field) in self.schema.iter().zip(tuple.fields()) {
                        let field = field.ok_or_else(|| unset_field(column.ty))?;
                        field.serialize_into(column.ty, &mut buf)?;
                    }
                }
                None => buf.put_bytes(0, self.layout.tuple_size()),
            }
        }
        let used = self.layout.tuples_per_page() * self.layout.tuple_size();
        buf.put_bytes(0, self.layout.page_size() - used);
        Ok(buf.freeze())
    }

    pub fn id(&self) -> PageId {
        self.page_id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    /// Returns true if the slot's bitmap bit is set.
    pub fn is_slot_used(&self, slot: usize) -> bool {
        if slot >= self.layout.tuples_per_page() {
            return false;
        }
        let word = self.bitmap[slot / BITMAP_WORD_BITS];
        word & (1 << (slot % BITMAP_WORD_BITS)) != 0
    }

    fn mark_slot(&mut self, slot: usize, used: bool) {
        let mask = 1u32 << (slot % BITMAP_WORD_BITS);
        let word = &mut self.bitmap[slot / BITMAP_WORD_BITS];
        if used {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    pub fn num_tuples(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn num_empty_slots(&self) -> usize {
        self.layout.tuples_per_page() - self.num_tuples()
    }

    /// Returns the tuple stored in `slot`, if any.
    pub fn tuple(&self, slot: usize) -> Option<&Tuple> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Iterates over the live tuples in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Stores `tuple` in the first free slot and returns its new RecordId.
    ///
    /// Every field must be set and match its column's type.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> Result<RecordId> {
        if **tuple.schema() != *self.schema {
            return Err(QuarryError::TypeMismatch {
                expected: self.schema.to_string(),
                actual: tuple.schema().to_string(),
            });
        }
        for (column, field) in self.schema.iter().zip(tuple.fields()) {
            match field {
                Some(value) if value.matches(column.ty) => {}
                Some(value) => {
                    return Err(QuarryError::TypeMismatch {
                        expected: column.ty.to_string(),
                        actual: value.type_name().to_string(),
                    });
                }
                None => return Err(unset_field(column.ty)),
            }
        }

        let slot = (0..self.layout.tuples_per_page())
            .find(|s| !self.is_slot_used(*s))
            .ok_or(QuarryError::PageFull(self.page_id))?;
        let record_id = RecordId::new(self.page_id, slot as u16);
        tuple.set_record_id(Some(record_id));
        self.mark_slot(slot, true);
        self.slots[slot] = Some(tuple);
        Ok(record_id)
    }

    /// Frees the slot holding the tuple at `record_id`.
    pub fn delete_tuple(&mut self, record_id: RecordId) -> Result<()> {
        let slot = record_id.slot as usize;
        if record_id.page_id != self.page_id || !self.is_slot_used(slot) {
            return Err(QuarryError::TupleNotFound(record_id));
        }
        self.mark_slot(slot, false);
        self.slots[slot] = None;
        Ok(())
    }
}

fn unset_field(ty: Type) -> QuarryError {
    QuarryError::TypeMismatch {
        expected: ty.to_string(),
        actual: "null".to_string(),
    }
}
