//! Tuple predicates used by filters and joins.

use quarry_common::Result;
use quarry_storage::{CompareOp, Field, Tuple};
use std::fmt;

/// Compares one field of a tuple against a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: usize,
    op: CompareOp,
    operand: Field,
}

impl Predicate {
    pub fn new(field: usize, op: CompareOp, operand: Field) -> Self {
        Self { field, op, operand }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn operand(&self) -> &Field {
        &self.operand
    }

    /// Evaluates `tuple[field] op operand`.
    ///
    /// An unset field never matches. Comparing values of different types
    /// is a `TypeMismatch` error.
    ///
    /// # Panics
    ///
    /// Panics if the field index is out of range for `tuple`.
    pub fn filter(&self, tuple: &Tuple) -> Result<bool> {
        match tuple.get(self.field) {
            Some(value) => value.compare(self.op, &self.operand),
            None => Ok(false),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}

/// Compares a field of a left tuple against a field of a right tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPredicate {
    left: usize,
    op: CompareOp,
    right: usize,
}

impl JoinPredicate {
    pub fn new(left: usize, op: CompareOp, right: usize) -> Self {
        Self { left, op, right }
    }

    pub fn left_field(&self) -> usize {
        self.left
    }

    pub fn right_field(&self) -> usize {
        self.right
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Evaluates `left[left_field] op right[right_field]`; unset fields never match.
    pub fn filter(&self, left: &Tuple, right: &Tuple) -> Result<bool> {
        match (left.get(self.left), right.get(self.right)) {
            (Some(a), Some(b)) => a.compare(self.op, b),
            _ => Ok(false),
        }
    }
}

impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "left.f{} {} right.f{}", self.left, self.op, self.right)
    }
}
