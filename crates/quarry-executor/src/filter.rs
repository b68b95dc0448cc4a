//! Selection operator.

use crate::operator::{BoxedOperator, Producer};
use crate::predicate::Predicate;
use quarry_common::Result;
use quarry_storage::{Schema, Tuple};
use std::sync::Arc;

/// Passes through the child's tuples that satisfy a predicate.
pub struct Filter {
    predicate: Predicate,
    child: BoxedOperator,
    schema: Arc<Schema>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: BoxedOperator) -> Self {
        let schema = Arc::clone(child.schema());
        Self {
            predicate,
            child,
            schema,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl Producer for Filter {
    fn open(&mut self) -> Result<()> {
        self.child.open()
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            if self.predicate.filter(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn rewind(&mut self) -> Result<()> {
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}
