use super::{AggregateOp, Aggregator, GroupKey, unset_field};
use quarry_common::{QuarryError, Result};
use quarry_storage::{Schema, Tuple};
use std::collections::HashMap;
use std::sync::Arc;

/// Running statistics for one group. Arithmetic wraps at 32 bits.
#[derive(Debug, Clone, Copy)]
struct IntState {
    count: i32,
    sum: i32,
    min: i32,
    max: i32,
}

impl IntState {
    fn new() -> Self {
        Self {
            count: 0,
            sum: 0,
            min: i32::MAX,
            max: i32::MIN,
        }
    }

    fn add(&mut self, value: i32) {
        self.count = self.count.wrapping_add(1);
        self.sum = self.sum.wrapping_add(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn value(&self, op: AggregateOp) -> i32 {
        if self.count == 0 {
            return 0;
        }
        match op {
            AggregateOp::Count => self.count,
            AggregateOp::Sum => self.sum,
            AggregateOp::Avg => self.sum.wrapping_div(self.count),
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
        }
    }
}

/// Aggregates an INT column with any [`AggregateOp`].
pub struct IntAggregator {
    group_field: Option<usize>,
    agg_field: usize,
    op: AggregateOp,
    schema: Arc<Schema>,
    groups: HashMap<GroupKey, IntState>,
    merged: u64,
}

impl IntAggregator {
    /// `schema` is the output schema: the group column (when grouping)
    /// followed by one INT column.
    pub fn new(
        group_field: Option<usize>,
        agg_field: usize,
        op: AggregateOp,
        schema: Arc<Schema>,
    ) -> Self {
        Self {
            group_field,
            agg_field,
            op,
            schema,
            groups: HashMap::new(),
            merged: 0,
        }
    }
}

impl Aggregator for IntAggregator {
    fn merge(&mut self, tuple: &Tuple) -> Result<()> {
        let value = match tuple.get(self.agg_field) {
            Some(field) => field.as_int().ok_or_else(|| QuarryError::TypeMismatch {
                expected: "INT_TYPE".to_string(),
                actual: field.type_name().to_string(),
            })?,
            None => return Err(unset_field(tuple, self.agg_field)),
        };
        let key = GroupKey::of(tuple, self.group_field)?;
        self.groups.entry(key).or_insert_with(IntState::new).add(value);
        self.merged += 1;
        Ok(())
    }

    fn results(&self) -> Vec<Tuple> {
        if self.group_field.is_none() && self.groups.is_empty() {
            return vec![GroupKey::NoGroup.into_row(&self.schema, 0)];
        }
        self.groups
            .iter()
            .map(|(key, state)| key.clone().into_row(&self.schema, state.value(self.op)))
            .collect()
    }

    fn merged(&self) -> u64 {
        self.merged
    }
}
