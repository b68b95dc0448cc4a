use super::{AggregateOp, Aggregator, GroupKey};
use quarry_common::{QuarryError, Result};
use quarry_storage::{Schema, Tuple};
use std::collections::HashMap;
use std::sync::Arc;

/// Aggregates a STRING column. Only COUNT is supported.
pub struct StringAggregator {
    group_field: Option<usize>,
    schema: Arc<Schema>,
    counts: HashMap<GroupKey, i32>,
    merged: u64,
}

impl StringAggregator {
    /// Fails with `Unsupported` for any op other than COUNT.
    pub fn new(
        group_field: Option<usize>,
        agg_field: usize,
        op: AggregateOp,
        schema: Arc<Schema>,
    ) -> Result<Self> {
        if op != AggregateOp::Count {
            return Err(QuarryError::Unsupported(format!(
                "{op} over string column {agg_field}, only count is supported"
            )));
        }
        Ok(Self {
            group_field,
            schema,
            counts: HashMap::new(),
            merged: 0,
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge(&mut self, tuple: &Tuple) -> Result<()> {
        let key = GroupKey::of(tuple, self.group_field)?;
        let count = self.counts.entry(key).or_insert(0);
        *count = count.wrapping_add(1);
        self.merged += 1;
        Ok(())
    }

    fn results(&self) -> Vec<Tuple> {
        if self.group_field.is_none() && self.counts.is_empty() {
            return vec![GroupKey::NoGroup.into_row(&self.schema, 0)];
        }
        self.counts
            .iter()
            .map(|(key, count)| key.clone().into_row(&self.schema, *count))
            .collect()
    }

    fn merged(&self) -> u64 {
        self.merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::Type;
    use quarry_storage::Field;

    #[test]
    fn test_only_count_is_supported() {
        let schema = Arc::new(Schema::unnamed(&[Type::Int]));
        for op in AggregateOp::ALL {
            let result = StringAggregator::new(None, 0, op, Arc::clone(&schema));
            assert_eq!(result.is_ok(), op == AggregateOp::Count, "{op}");
        }
    }

    #[test]
    fn test_count_ungrouped() {
        let input = Arc::new(Schema::unnamed(&[Type::string()]));
        let mut agg =
            StringAggregator::new(None, 0, AggregateOp::Count, Arc::new(Schema::unnamed(&[Type::Int])))
                .unwrap();
        assert_eq!(agg.results()[0].get(0), Some(&Field::Int(0)));

        for name in ["x", "y", "x"] {
            agg.merge(&Tuple::from_fields(Arc::clone(&input), vec![Field::from(name)]))
                .unwrap();
        }
        let rows = agg.results();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&Field::Int(3)));
        assert_eq!(agg.merged(), 3);
    }

    #[test]
    fn test_count_grouped_by_int() {
        let input = Arc::new(Schema::unnamed(&[Type::Int, Type::string()]));
        let output = Arc::new(Schema::unnamed(&[Type::Int, Type::Int]));
        let mut agg = StringAggregator::new(Some(0), 1, AggregateOp::Count, output).unwrap();
        for (g, s) in [(1, "a"), (2, "b"), (1, "c")] {
            agg.merge(&Tuple::from_fields(
                Arc::clone(&input),
                vec![Field::Int(g), Field::from(s)],
            ))
            .unwrap();
        }
        let mut rows: Vec<String> = agg.results().iter().map(|t| t.to_string()).collect();
        rows.sort();
        assert_eq!(rows, vec!["1\t2\n", "2\t1\n"]);
    }
}
