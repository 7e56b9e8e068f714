//! FILENAME: core/grid-engine/src/aggregate.rs
//! PURPOSE: Reduction of a bucket's cell values to one aggregate value.
//! CONTEXT: Shared by the grouping and pivot stages. Non-numeric values are
//! excluded from numeric reductions, never treated as zero.

use std::sync::Arc;

use crate::definition::{AggFunc, AggregationType, CustomAggregator};
use crate::value::Value;

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Running state for every built-in aggregation.
#[derive(Debug, Clone, Default)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one cell value. Every value counts; only numeric-coercible values
    /// feed sum, min, max and average.
    pub fn add(&mut self, value: &Value) {
        self.count += 1;
        if let Some(n) = value.as_number().filter(|n| !n.is_nan()) {
            self.count_numbers += 1;
            self.sum += n;
            self.min = Some(self.min.map_or(n, |m| m.min(n)));
            self.max = Some(self.max.map_or(n, |m| m.max(n)));
        }
    }

    pub fn merge(&mut self, other: &AggregateAccumulator) {
        self.sum += other.sum;
        self.count += other.count;
        self.count_numbers += other.count_numbers;
        if let Some(other_min) = other.min {
            self.min = Some(self.min.map_or(other_min, |m| m.min(other_min)));
        }
        if let Some(other_max) = other.max {
            self.max = Some(self.max.map_or(other_max, |m| m.max(other_max)));
        }
    }

    /// Computes the final aggregate value.
    pub fn compute(&self, aggregation: AggregationType) -> Value {
        match aggregation {
            AggregationType::Sum => Value::Number(self.sum),
            AggregationType::Count => Value::Number(self.count as f64),
            AggregationType::Min => Value::from(self.min),
            AggregationType::Max => Value::from(self.max),
            AggregationType::Avg => {
                if self.count_numbers > 0 {
                    Value::Number(self.sum / self.count_numbers as f64)
                } else {
                    Value::Null
                }
            }
        }
    }
}

impl<'a> FromIterator<&'a Value> for AggregateAccumulator {
    fn from_iter<I: IntoIterator<Item = &'a Value>>(iter: I) -> Self {
        let mut acc = AggregateAccumulator::new();
        for value in iter {
            acc.add(value);
        }
        acc
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Resolves an aggregation to a callable reduction.
pub fn resolve_agg_func(agg_func: &AggFunc) -> CustomAggregator {
    match agg_func {
        AggFunc::Builtin(agg) => {
            let agg = *agg;
            Arc::new(move |values: &[Value]| values.iter().collect::<AggregateAccumulator>().compute(agg))
        }
        AggFunc::Custom(reduce) => Arc::clone(reduce),
    }
}

/// Reduces `values` with `agg_func`.
///
/// `sum` is 0 when nothing is numeric, `min`/`max`/`avg` are null, and
/// `count` is the number of values whatever their type. A custom reduction
/// receives the values unfiltered.
pub fn aggregate_values(agg_func: &AggFunc, values: &[Value]) -> Value {
    match agg_func {
        AggFunc::Builtin(agg) => values.iter().collect::<AggregateAccumulator>().compute(*agg),
        AggFunc::Custom(reduce) => reduce(values),
    }
}
