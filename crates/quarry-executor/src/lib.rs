//! Query execution for Quarry.
//!
//! Operators follow the Volcano model: each one pulls tuples from its
//! children through [`OpIterator`] and produces tuples of its own. Provided:
//! - [`SeqScan`] over a heap file
//! - [`Filter`] by a single-column [`Predicate`]
//! - Nested-loop [`Join`] on a [`JoinPredicate`]
//! - Blocking hash [`Aggregate`]

mod aggregate;
mod filter;
mod join;
mod operator;
mod predicate;
mod seq_scan;
mod tuple_iter;

pub use aggregate::{Aggregate, AggregateOp, Aggregator, GroupKey, IntAggregator, StringAggregator};
pub use filter::Filter;
pub use join::Join;
pub use operator::{BoxedOperator, OpIterator, Operator, Producer, drain};
pub use predicate::{JoinPredicate, Predicate};
pub use seq_scan::SeqScan;
pub use tuple_iter::TupleIterator;
