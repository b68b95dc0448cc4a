//! In-memory tuple source.

use crate::operator::Producer;
use quarry_common::Result;
use quarry_storage::{Schema, Tuple};
use std::sync::Arc;

/// Produces a fixed list of tuples, in order.
///
/// Holds aggregate results and feeds hand-built rows into operators.
pub struct TupleIterator {
    schema: Arc<Schema>,
    tuples: Vec<Tuple>,
    cursor: usize,
}

impl TupleIterator {
    pub fn new(schema: Arc<Schema>, tuples: Vec<Tuple>) -> Self {
        Self {
            schema,
            tuples,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl Producer for TupleIterator {
    fn open(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let tuple = self.tuples.get(self.cursor).cloned();
        if tuple.is_some() {
            self.cursor += 1;
        }
        Ok(tuple)
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.cursor = self.tuples.len();
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}
