//! The pull-based iterator protocol every query operator implements.
//!
//! Operators form a tree; the caller drives the root with
//! `open`, then alternates `has_next`/`next`, and finally `close`s it.
//! Most operators only describe how to produce their next row (a
//! [`Producer`]) and get the rest of the protocol from [`Operator`], which
//! keeps a one-row lookahead so `has_next` can be called repeatedly.

use quarry_common::{QuarryError, Result};
use quarry_storage::{Schema, Tuple};
use std::sync::Arc;

/// Lifecycle shared by all query operators.
pub trait OpIterator {
    /// Prepares the operator (and its children) for iteration.
    fn open(&mut self) -> Result<()>;

    /// Returns true if `next` will produce a tuple.
    fn has_next(&mut self) -> Result<bool>;

    /// Returns the next tuple, or `NoSuchElement` when there are none left.
    fn next(&mut self) -> Result<Tuple>;

    /// Restarts the output sequence from the beginning without reopening.
    fn rewind(&mut self) -> Result<()>;

    /// Releases resources. The operator must be opened again before reuse.
    fn close(&mut self);

    /// Schema of the tuples this operator produces.
    fn schema(&self) -> &Arc<Schema>;
}

/// A heap-allocated operator, the unit query trees are built from.
pub type BoxedOperator = Box<dyn OpIterator>;

/// Row-at-a-time source that [`Operator`] turns into a full [`OpIterator`].
pub trait Producer {
    fn open(&mut self) -> Result<()>;

    /// Computes the next output row, or None once the input is exhausted.
    ///
    /// Only called between `open` and `close`.
    fn fetch_next(&mut self) -> Result<Option<Tuple>>;

    fn rewind(&mut self) -> Result<()>;

    fn close(&mut self);

    fn schema(&self) -> &Arc<Schema>;

    fn into_operator(self) -> Operator<Self>
    where
        Self: Sized,
    {
        Operator::new(self)
    }
}

/// Implements the iterator protocol on top of a [`Producer`].
///
/// At most one row is buffered. `has_next` fills the buffer if it is empty,
/// `next` hands the buffered row out, and `rewind`/`close` discard it.
pub struct Operator<P> {
    producer: P,
    lookahead: Option<Tuple>,
    is_open: bool,
}

impl<P: Producer> Operator<P> {
    pub fn new(producer: P) -> Self {
        Self {
            producer,
            lookahead: None,
            is_open: false,
        }
    }

    pub fn producer(&self) -> &P {
        &self.producer
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn into_inner(self) -> P {
        self.producer
    }

    pub fn boxed(self) -> BoxedOperator
    where
        P: 'static,
    {
        Box::new(self)
    }
}

impl<P: Producer> OpIterator for Operator<P> {
    fn open(&mut self) -> Result<()> {
        self.lookahead = None;
        // A producer that fails partway may already hold open children.
        if let Err(e) = self.producer.open() {
            self.producer.close();
            self.is_open = false;
            return Err(e);
        }
        self.is_open = true;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        if !self.is_open {
            return Err(QuarryError::NotOpen("has_next"));
        }
        if self.lookahead.is_none() {
            self.lookahead = self.producer.fetch_next()?;
        }
        Ok(self.lookahead.is_some())
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.is_open {
            return Err(QuarryError::NotOpen("next"));
        }
        if !self.has_next()? {
            return Err(QuarryError::NoSuchElement);
        }
        self.lookahead.take().ok_or(QuarryError::NoSuchElement)
    }

    fn rewind(&mut self) -> Result<()> {
        if !self.is_open {
            return Err(QuarryError::NotOpen("rewind"));
        }
        self.lookahead = None;
        self.producer.rewind()
    }

    fn close(&mut self) {
        if self.is_open {
            self.producer.close();
        }
        self.lookahead = None;
        self.is_open = false;
    }

    fn schema(&self) -> &Arc<Schema> {
        self.producer.schema()
    }
}

/// Pulls every remaining tuple out of `op`.
pub fn drain(op: &mut dyn OpIterator) -> Result<Vec<Tuple>> {
    let mut out = Vec::new();
    while op.has_next()? {
        out.push(op.next()?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::Type;
    use quarry_storage::Field;

    /// Counts down from `start`, recording how often each hook ran.
    struct Countdown {
        schema: Arc<Schema>,
        start: i32,
        remaining: i32,
        fetches: usize,
        closes: usize,
        fail_open: bool,
    }

    impl Countdown {
        fn new(start: i32) -> Self {
            Self {
                schema: Arc::new(Schema::named(&[(Type::Int, "n")])),
                start,
                remaining: 0,
                fetches: 0,
                closes: 0,
                fail_open: false,
            }
        }
    }

    impl Producer for Countdown {
        fn open(&mut self) -> Result<()> {
            if self.fail_open {
                return Err(QuarryError::Unsupported("countdown".to_string()));
            }
            self.remaining = self.start;
            Ok(())
        }

        fn fetch_next(&mut self) -> Result<Option<Tuple>> {
            self.fetches += 1;
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(Tuple::from_fields(
                Arc::clone(&self.schema),
                vec![Field::Int(self.remaining)],
            )))
        }

        fn rewind(&mut self) -> Result<()> {
            self.open()
        }

        fn close(&mut self) {
            self.closes += 1;
        }

        fn schema(&self) -> &Arc<Schema> {
            &self.schema
        }
    }

    fn values(op: &mut dyn OpIterator) -> Vec<i32> {
        drain(op)
            .unwrap()
            .iter()
            .map(|t| t.get(0).and_then(Field::as_int).unwrap())
            .collect()
    }

    #[test]
    fn test_has_next_buffers_one_row() {
        let mut op = Countdown::new(2).into_operator();
        op.open().unwrap();
        for _ in 0..4 {
            assert!(op.has_next().unwrap());
        }
        assert_eq!(op.producer().fetches, 1);

        assert_eq!(op.next().unwrap().get(0), Some(&Field::Int(1)));
        assert_eq!(op.producer().fetches, 1);
        assert_eq!(op.next().unwrap().get(0), Some(&Field::Int(0)));
        assert!(!op.has_next().unwrap());
        assert!(matches!(op.next(), Err(QuarryError::NoSuchElement)));
    }

    #[test]
    fn test_next_without_has_next() {
        let mut op = Countdown::new(3).into_operator();
        op.open().unwrap();
        assert_eq!(op.next().unwrap().get(0), Some(&Field::Int(2)));
        assert_eq!(op.next().unwrap().get(0), Some(&Field::Int(1)));
    }

    #[test]
    fn test_rewind_discards_lookahead() {
        let mut op = Countdown::new(3).into_operator();
        op.open().unwrap();
        op.next().unwrap();
        assert!(op.has_next().unwrap());

        op.rewind().unwrap();
        assert_eq!(values(&mut op), vec![2, 1, 0]);
    }

    #[test]
    fn test_calls_before_open_fail() {
        let mut op = Countdown::new(1).into_operator();
        assert!(matches!(op.has_next(), Err(QuarryError::NotOpen("has_next"))));
        assert!(matches!(op.next(), Err(QuarryError::NotOpen("next"))));
        assert!(matches!(op.rewind(), Err(QuarryError::NotOpen("rewind"))));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut op = Countdown::new(5).into_operator();
        op.open().unwrap();
        op.has_next().unwrap();
        op.close();
        op.close();
        assert!(!op.is_open());
        assert_eq!(op.producer().closes, 1);
        assert!(op.has_next().is_err());

        op.open().unwrap();
        assert_eq!(values(&mut op).len(), 5);
    }

    #[test]
    fn test_failed_open_closes_producer() {
        let mut countdown = Countdown::new(2);
        countdown.fail_open = true;
        let mut op = countdown.into_operator();

        assert!(matches!(op.open(), Err(QuarryError::Unsupported(_))));
        assert!(!op.is_open());
        assert_eq!(op.producer().closes, 1);
        assert!(matches!(op.has_next(), Err(QuarryError::NotOpen("has_next"))));

        op.close();
        assert_eq!(op.producer().closes, 1);
    }

    #[test]
    fn test_boxed_operator_schema() {
        let op: BoxedOperator = Countdown::new(0).into_operator().boxed();
        assert_eq!(op.schema().field_name(0).unwrap(), Some("n"));
    }
}
