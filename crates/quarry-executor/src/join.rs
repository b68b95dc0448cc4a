//! Nested-loop join.

use crate::operator::{BoxedOperator, Producer};
use crate::predicate::JoinPredicate;
use quarry_common::Result;
use quarry_storage::{Schema, Tuple};
use std::sync::Arc;
use tracing::debug;

/// Joins every left tuple with every right tuple satisfying a predicate.
///
/// The right child is scanned once per left tuple and rewound in between.
/// Matches are emitted one at a time: after a match the right scan stays
/// where it is, so the next call continues with the following right tuple.
/// Output tuples hold all left fields followed by all right fields.
pub struct Join {
    predicate: JoinPredicate,
    left: BoxedOperator,
    right: BoxedOperator,
    schema: Arc<Schema>,
    current_left: Option<Tuple>,
}

impl Join {
    pub fn new(predicate: JoinPredicate, left: BoxedOperator, right: BoxedOperator) -> Self {
        let schema = Arc::new(Schema::combine(left.schema(), right.schema()));
        Self {
            predicate,
            left,
            right,
            schema,
            current_left: None,
        }
    }

    pub fn predicate(&self) -> &JoinPredicate {
        &self.predicate
    }

    /// Name of the left join column, if it has one.
    pub fn left_field_name(&self) -> Result<Option<&str>> {
        self.left.schema().field_name(self.predicate.left_field())
    }

    /// Name of the right join column, if it has one.
    pub fn right_field_name(&self) -> Result<Option<&str>> {
        self.right.schema().field_name(self.predicate.right_field())
    }
}

impl Producer for Join {
    fn open(&mut self) -> Result<()> {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
        debug!(predicate = %self.predicate, "join opened");
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.current_left.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.current_left = Some(self.left.next()?);
            }
            let Some(left) = self.current_left.as_ref() else {
                return Ok(None);
            };

            while self.right.has_next()? {
                let right = self.right.next()?;
                if self.predicate.filter(left, &right)? {
                    return Ok(Some(Tuple::concat(left, &right, Arc::clone(&self.schema))));
                }
            }

            self.right.rewind()?;
            self.current_left = None;
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.current_left = None;
        debug!(predicate = %self.predicate, "join closed");
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}
