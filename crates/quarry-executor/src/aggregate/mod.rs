//! Blocking hash aggregation.
//!
//! [`Aggregate`] drains its child on open, folding every tuple into an
//! [`Aggregator`] chosen by the type of the aggregated column, then serves
//! one row per group from memory:
//!
//! - [`IntAggregator`] supports MIN, MAX, SUM, AVG and COUNT
//! - [`StringAggregator`] supports COUNT only
//!
//! Groups come out in no particular order.

mod int;
mod string;

pub use int::IntAggregator;
pub use string::StringAggregator;

use crate::operator::{BoxedOperator, OpIterator, Producer};
use crate::tuple_iter::TupleIterator;
use quarry_common::{QuarryError, Result, Type};
use quarry_storage::{Column, Field, Schema, Tuple};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl AggregateOp {
    pub const ALL: [AggregateOp; 5] = [
        AggregateOp::Min,
        AggregateOp::Max,
        AggregateOp::Sum,
        AggregateOp::Avg,
        AggregateOp::Count,
    ];

    /// Lowercase name used in output column names.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key a tuple is grouped under.
///
/// Ungrouped aggregation puts every tuple in the single `NoGroup` group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    NoGroup,
    Key(Field),
}

impl GroupKey {
    /// Extracts the group of `tuple`, reading `group_field` if grouping.
    pub fn of(tuple: &Tuple, group_field: Option<usize>) -> Result<GroupKey> {
        match group_field {
            None => Ok(GroupKey::NoGroup),
            Some(index) => tuple
                .get(index)
                .cloned()
                .map(GroupKey::Key)
                .ok_or_else(|| unset_field(tuple, index)),
        }
    }

    /// Builds an output row: the key (if any) followed by `value`.
    pub fn into_row(self, schema: &Arc<Schema>, value: i32) -> Tuple {
        let fields = match self {
            GroupKey::NoGroup => vec![Field::Int(value)],
            GroupKey::Key(key) => vec![key, Field::Int(value)],
        };
        Tuple::from_fields(Arc::clone(schema), fields)
    }
}

/// Error for a tuple that is missing a value the aggregation needs.
fn unset_field(tuple: &Tuple, index: usize) -> QuarryError {
    let expected = tuple
        .schema()
        .field_type(index)
        .map(|ty| ty.to_string())
        .unwrap_or_else(|_| "a value".to_string());
    QuarryError::TypeMismatch {
        expected,
        actual: "null".to_string(),
    }
}

/// Accumulates tuples into per-group results.
pub trait Aggregator: Send {
    /// Folds one input tuple into its group.
    fn merge(&mut self, tuple: &Tuple) -> Result<()>;

    /// Returns one row per group, shaped by the aggregator's output schema.
    ///
    /// Without grouping exactly one row is returned, holding 0 if nothing
    /// was merged. With grouping only groups that saw a tuple appear.
    fn results(&self) -> Vec<Tuple>;

    /// Number of tuples merged so far.
    fn merged(&self) -> u64;
}

/// Groups the child's tuples and computes one aggregate per group.
///
/// Output is a single `op(column)` INT column, preceded by the group column
/// when grouping.
pub struct Aggregate {
    child: BoxedOperator,
    agg_field: usize,
    agg_type: Type,
    group_field: Option<usize>,
    op: AggregateOp,
    schema: Arc<Schema>,
    results: Option<TupleIterator>,
}

impl Aggregate {
    /// Aggregates column `agg_field` of `child` with `op`, grouping by
    /// `group_field` when given.
    ///
    /// Fails if a column index is out of range, or with `Unsupported` if
    /// `op` cannot be applied to the aggregated column's type.
    pub fn new(
        child: BoxedOperator,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self> {
        let child_schema = Arc::clone(child.schema());
        let agg_type = child_schema.field_type(agg_field)?;
        let agg_name = format!(
            "{}({})",
            op.name(),
            child_schema.field_name(agg_field)?.unwrap_or("null")
        );

        let mut columns = Vec::with_capacity(2);
        if let Some(group) = group_field {
            columns.push(Column {
                ty: child_schema.field_type(group)?,
                name: child_schema.field_name(group)?.map(str::to_string),
            });
        }
        columns.push(Column::new(Type::Int, agg_name));

        let aggregate = Self {
            child,
            agg_field,
            agg_type,
            group_field,
            op,
            schema: Arc::new(Schema::new(columns)),
            results: None,
        };
        aggregate.new_aggregator()?;
        Ok(aggregate)
    }

    fn new_aggregator(&self) -> Result<Box<dyn Aggregator>> {
        let schema = Arc::clone(&self.schema);
        Ok(match self.agg_type {
            Type::Int => Box::new(IntAggregator::new(
                self.group_field,
                self.agg_field,
                self.op,
                schema,
            )),
            Type::String(_) => Box::new(StringAggregator::new(
                self.group_field,
                self.agg_field,
                self.op,
                schema,
            )?),
        })
    }

    pub fn op(&self) -> AggregateOp {
        self.op
    }

    pub fn aggregate_field(&self) -> usize {
        self.agg_field
    }

    pub fn group_field(&self) -> Option<usize> {
        self.group_field
    }

    /// Name of the aggregated input column.
    pub fn aggregate_field_name(&self) -> Option<&str> {
        self.child.schema().field_name(self.agg_field).ok().flatten()
    }

    /// Name of the grouping input column, or None when not grouping.
    pub fn group_field_name(&self) -> Option<&str> {
        let group = self.group_field?;
        self.child.schema().field_name(group).ok().flatten()
    }
}

impl Producer for Aggregate {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        let mut aggregator = self.new_aggregator()?;
        while self.child.has_next()? {
            aggregator.merge(&self.child.next()?)?;
        }

        let rows = aggregator.results();
        debug!(
            op = %self.op,
            merged = aggregator.merged(),
            groups = rows.len(),
            "aggregate drained child"
        );
        let mut results = TupleIterator::new(Arc::clone(&self.schema), rows);
        results.open()?;
        self.results = Some(results);
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        match self.results.as_mut() {
            Some(results) => results.fetch_next(),
            None => Ok(None),
        }
    }

    fn rewind(&mut self) -> Result<()> {
        match self.results.as_mut() {
            Some(results) => results.rewind(),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        self.results = None;
        self.child.close();
        debug!(op = %self.op, "aggregate closed");
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::drain;

    fn source(rows: &[(i32, &str, i32)]) -> BoxedOperator {
        let schema = Arc::new(Schema::named(&[
            (Type::Int, "id"),
            (Type::string(), "name"),
            (Type::Int, "qty"),
        ]));
        let tuples = rows
            .iter()
            .map(|(id, name, qty)| {
                Tuple::from_fields(
                    Arc::clone(&schema),
                    vec![Field::Int(*id), Field::from(*name), Field::Int(*qty)],
                )
            })
            .collect();
        TupleIterator::new(schema, tuples).into_operator().boxed()
    }

    fn sorted_rows(op: &mut dyn OpIterator) -> Vec<String> {
        let mut rows: Vec<String> = drain(op).unwrap().iter().map(|t| t.to_string()).collect();
        rows.sort();
        rows
    }

    const ROWS: &[(i32, &str, i32)] = &[(1, "a", 10), (1, "b", 20), (2, "a", 5)];

    #[test]
    fn test_op_names() {
        let names: Vec<_> = AggregateOp::ALL.iter().map(|op| op.to_string()).collect();
        assert_eq!(names, vec!["min", "max", "sum", "avg", "count"]);
    }

    #[test]
    fn test_output_schema() {
        let grouped = Aggregate::new(source(ROWS), 2, Some(0), AggregateOp::Sum).unwrap();
        assert_eq!(grouped.schema().to_string(), "INT_TYPE(id), INT_TYPE(sum(qty))");
        assert_eq!(grouped.group_field_name(), Some("id"));
        assert_eq!(grouped.aggregate_field_name(), Some("qty"));

        let by_name = Aggregate::new(source(ROWS), 0, Some(1), AggregateOp::Max).unwrap();
        assert_eq!(by_name.schema().field_type(0).unwrap(), Type::string());

        let ungrouped = Aggregate::new(source(ROWS), 1, None, AggregateOp::Count).unwrap();
        assert_eq!(ungrouped.schema().to_string(), "INT_TYPE(count(name))");
        assert_eq!(ungrouped.group_field_name(), None);
    }

    #[test]
    fn test_invalid_construction() {
        let err = Aggregate::new(source(ROWS), 1, None, AggregateOp::Sum).err().unwrap();
        assert!(matches!(err, QuarryError::Unsupported(_)));

        let err = Aggregate::new(source(ROWS), 9, None, AggregateOp::Count).err().unwrap();
        assert!(err.is_not_found());

        let err = Aggregate::new(source(ROWS), 0, Some(3), AggregateOp::Count).err().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_grouped_sum() {
        let mut op = Aggregate::new(source(ROWS), 2, Some(0), AggregateOp::Sum)
            .unwrap()
            .into_operator();
        op.open().unwrap();
        assert_eq!(sorted_rows(&mut op), vec!["1\t30\n", "2\t5\n"]);
    }

    #[test]
    fn test_ungrouped_ops() {
        let expected = [
            (AggregateOp::Min, 5),
            (AggregateOp::Max, 20),
            (AggregateOp::Sum, 35),
            (AggregateOp::Avg, 11),
            (AggregateOp::Count, 3),
        ];
        for (agg_op, value) in expected {
            let mut op = Aggregate::new(source(ROWS), 2, None, agg_op).unwrap().into_operator();
            op.open().unwrap();
            let rows = drain(&mut op).unwrap();
            assert_eq!(rows.len(), 1, "{agg_op}");
            assert_eq!(rows[0].get(0), Some(&Field::Int(value)), "{agg_op}");
        }
    }

    #[test]
    fn test_string_count_grouped_by_string() {
        let mut op = Aggregate::new(source(ROWS), 1, Some(1), AggregateOp::Count)
            .unwrap()
            .into_operator();
        op.open().unwrap();
        assert_eq!(sorted_rows(&mut op), vec!["a\t2\n", "b\t1\n"]);
    }

    #[test]
    fn test_empty_input() {
        let mut ungrouped = Aggregate::new(source(&[]), 2, None, AggregateOp::Max)
            .unwrap()
            .into_operator();
        ungrouped.open().unwrap();
        assert_eq!(sorted_rows(&mut ungrouped), vec!["0\n"]);

        let mut grouped = Aggregate::new(source(&[]), 2, Some(0), AggregateOp::Count)
            .unwrap()
            .into_operator();
        grouped.open().unwrap();
        assert!(!grouped.has_next().unwrap());
    }

    #[test]
    fn test_rewind_does_not_redrain() {
        let mut op = Aggregate::new(source(ROWS), 2, Some(0), AggregateOp::Count)
            .unwrap()
            .into_operator();
        op.open().unwrap();
        let first = sorted_rows(&mut op);
        op.rewind().unwrap();
        assert_eq!(sorted_rows(&mut op), first);

        op.close();
        assert!(op.has_next().is_err());
        op.open().unwrap();
        assert_eq!(sorted_rows(&mut op), first);
    }

    #[test]
    fn test_group_key() {
        let schema = Arc::new(Schema::unnamed(&[Type::Int, Type::Int]));
        let mut tuple = Tuple::new(Arc::clone(&schema));
        tuple.set(1, Field::Int(4));

        assert_eq!(GroupKey::of(&tuple, None).unwrap(), GroupKey::NoGroup);
        assert_eq!(GroupKey::of(&tuple, Some(1)).unwrap(), GroupKey::Key(Field::Int(4)));
        assert!(matches!(
            GroupKey::of(&tuple, Some(0)),
            Err(QuarryError::TypeMismatch { .. })
        ));

        let out = Arc::new(Schema::unnamed(&[Type::Int]));
        assert_eq!(GroupKey::NoGroup.into_row(&out, 9).to_string(), "9\n");
    }
}
