//! Tuple representation.

use crate::field::Field;
use crate::schema::Schema;
use quarry_common::RecordId;
use std::fmt;
use std::sync::Arc;

/// A row of field values conforming to one schema.
///
/// Values are not checked against the schema's types when set; that is
/// the producer's responsibility. Tuples read from a heap file carry the
/// RecordId of the slot they came from, synthesized tuples carry none.
#[derive(Debug, Clone)]
pub struct Tuple {
    schema: Arc<Schema>,
    fields: Vec<Option<Field>>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple with every field unset.
    pub fn new(schema: Arc<Schema>) -> Self {
        let fields = vec![None; schema.num_fields()];
        Self {
            schema,
            fields,
            record_id: None,
        }
    }

    /// Creates a tuple holding `fields` in schema order.
    ///
    /// # Panics
    ///
    /// Panics if the number of fields differs from the schema's.
    pub fn from_fields(schema: Arc<Schema>, fields: Vec<Field>) -> Self {
        assert_eq!(
            fields.len(),
            schema.num_fields(),
            "tuple width must match its schema"
        );
        Self {
            schema,
            fields: fields.into_iter().map(Some).collect(),
            record_id: None,
        }
    }

    /// Concatenates the fields of `left` and `right` under `schema`.
    pub fn concat(left: &Tuple, right: &Tuple, schema: Arc<Schema>) -> Self {
        let mut fields = Vec::with_capacity(left.fields.len() + right.fields.len());
        fields.extend_from_slice(&left.fields);
        fields.extend_from_slice(&right.fields);
        debug_assert_eq!(fields.len(), schema.num_fields());
        Self {
            schema,
            fields,
            record_id: None,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the i-th field, or None if it was never set.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields[index].as_ref()
    }

    /// Sets the i-th field.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set(&mut self, index: usize, field: Field) {
        self.fields[index] = Some(field);
    }

    pub fn fields(&self) -> impl Iterator<Item = Option<&Field>> {
        self.fields.iter().map(Option::as_ref)
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }
}

/// Tab-separated values followed by a newline; unset fields print as `null`.
impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            match field {
                Some(value) => write!(f, "{value}")?,
                None => f.write_str("null")?,
            }
        }
        f.write_str("\n")
    }
}
