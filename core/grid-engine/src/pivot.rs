//! FILENAME: core/grid-engine/src/pivot.rs
//! PURPOSE: Cross-tabulation of rows by the distinct values of one column.
//! CONTEXT: Each distinct pivot value becomes one output row, and every
//! (pivot value, value column) pair becomes a generated column whose cells
//! hold that bucket's aggregate. Row-group columns of the pivot model are not
//! applied here.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::aggregate::aggregate_values;
use crate::column::{column_index, get_cell_value, ColumnDef};
use crate::definition::{FilterType, PivotModel};
use crate::group::ExpansionState;
use crate::row::Row;
use crate::value::{GroupKey, Value};

/// Field carrying the pivot value on every pivoted row.
pub const PIVOT_KEY_FIELD: &str = "__pivotKey";

/// Header suffix for the missing-value bucket.
pub const BLANK_LABEL: &str = "(blank)";

/// Width of every generated column.
pub const PIVOT_COLUMN_WIDTH: u32 = 140;

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// One output row: the pivot value plus one aggregate per generated column.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub pivot_key: GroupKey,
    /// Aggregates keyed by generated field id (`pv:<pivot value>:<col id>`).
    pub values: BTreeMap<String, Value>,
}

impl PivotRow {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    fn key_value(&self) -> Value {
        match &self.pivot_key {
            GroupKey::Null => Value::Null,
            GroupKey::Value(s) => Value::Text(s.clone()),
        }
    }
}

impl Row for PivotRow {
    fn field(&self, name: &str) -> Option<Value> {
        if name == PIVOT_KEY_FIELD {
            return Some(self.key_value());
        }
        self.values.get(name).cloned()
    }
}

impl Serialize for PivotRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(PIVOT_KEY_FIELD, &self.key_value())?;
        for (field, value) in &self.values {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// A pivoted view: the rows together with the columns that render them.
#[derive(Debug, Clone)]
pub struct PivotTable {
    pub rows: Vec<PivotRow>,
    pub dynamic_cols: Vec<ColumnDef<PivotRow>>,
    /// Always empty; pivoted rows carry no group markers.
    pub paths: Vec<String>,
}

/// Result of the pivot stage.
#[derive(Debug, Clone)]
pub enum PivotOutcome<R> {
    /// Pivoting was inactive or the pivot column is unknown; the input rows
    /// come back unchanged.
    Passthrough(Vec<R>),
    Pivoted(PivotTable),
}

impl<R> PivotOutcome<R> {
    pub fn is_pivoted(&self) -> bool {
        matches!(self, PivotOutcome::Pivoted(_))
    }

    pub fn as_table(&self) -> Option<&PivotTable> {
        match self {
            PivotOutcome::Pivoted(table) => Some(table),
            PivotOutcome::Passthrough(_) => None,
        }
    }
}

/// Field id of the generated column for one pivot value and value column.
pub fn pivot_field_id(pivot_key: &GroupKey, col_id: &str) -> String {
    format!("pv:{}:{}", pivot_key.label(), col_id)
}

// ============================================================================
// PIVOT STAGE
// ============================================================================

/// Pivots `rows` on `pivot.pivot_col`.
///
/// Buckets keep the order in which their pivot value is first seen. The
/// expansion state is accepted alongside the grouping stage's but pivoted
/// output has no groups to expand.
pub fn pivot_rows<R: Row + Clone>(
    rows: &[R],
    cols: &[ColumnDef<R>],
    pivot: &PivotModel,
    _expanded: Option<&dyn ExpansionState>,
) -> PivotOutcome<R> {
    let pivot_col_id = match &pivot.pivot_col {
        Some(id) if pivot.is_active() => id,
        _ => return PivotOutcome::Passthrough(rows.to_vec()),
    };

    let index = column_index(cols);
    let Some(&pivot_col) = index.get(pivot_col_id.as_str()) else {
        log::debug!(target: "PIVOT", "pivot column '{}' not found, passing rows through", pivot_col_id);
        return PivotOutcome::Passthrough(rows.to_vec());
    };

    // Bucket by pivot value, first-seen order.
    let mut bucket_index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut buckets: Vec<(GroupKey, Vec<&R>)> = Vec::new();
    for row in rows {
        let key = GroupKey::from_value(&pivot_col.value_of(row));
        match bucket_index.get(&key) {
            Some(&i) => buckets[i].1.push(row),
            None => {
                bucket_index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![row]));
            }
        }
    }

    let value_cols: Vec<_> = pivot
        .value_cols
        .iter()
        .map(|item| (item, index.get(item.col_id.as_str()).copied()))
        .collect();

    let mut dynamic_cols = Vec::with_capacity(buckets.len() * value_cols.len());
    for (key, _) in &buckets {
        let suffix = if key.is_null() { BLANK_LABEL } else { key.label() };
        for (item, base) in &value_cols {
            let base_label = base
                .and_then(|col| col.header_name.as_deref())
                .filter(|header| !header.is_empty())
                .unwrap_or(&item.col_id);
            dynamic_cols.push(
                ColumnDef::new(pivot_field_id(key, &item.col_id))
                    .with_header(format!("{} {}", base_label, suffix))
                    .sortable(false)
                    .with_filter(FilterType::Number)
                    .with_width(PIVOT_COLUMN_WIDTH),
            );
        }
    }

    let out_rows: Vec<PivotRow> = buckets
        .into_iter()
        .map(|(key, bucket)| {
            let mut values = BTreeMap::new();
            for (item, col) in &value_cols {
                let cells: Vec<Value> = bucket.iter().map(|row| get_cell_value(*col, Some(*row))).collect();
                values.insert(pivot_field_id(&key, &item.col_id), aggregate_values(&item.agg_func, &cells));
            }
            PivotRow { pivot_key: key, values }
        })
        .collect();

    log::debug!(
        target: "PIVOT",
        "pivoted {} rows on '{}' into {} buckets, {} generated columns",
        rows.len(),
        pivot_col_id,
        out_rows.len(),
        dynamic_cols.len()
    );

    PivotOutcome::Pivoted(PivotTable {
        rows: out_rows,
        dynamic_cols,
        paths: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AggModelItem, AggregationType};
    use crate::row::record;

    type Rec = BTreeMap<String, Value>;

    fn create_test_rows() -> Vec<Rec> {
        vec![
            record([("make", Value::from("VW")), ("year", Value::from(2021)), ("price", Value::from(80))]),
            record([("make", Value::from("Ford")), ("year", Value::from(2020)), ("price", Value::from(100))]),
            record([("make", Value::from("Ford")), ("year", Value::from(2021)), ("price", Value::from(50))]),
            record([("make", Value::Null), ("year", Value::from(2020)), ("price", Value::from(10))]),
        ]
    }

    fn create_test_cols() -> Vec<ColumnDef<Rec>> {
        vec![
            ColumnDef::new("make").with_header("Make"),
            ColumnDef::new("year"),
            ColumnDef::new("price").with_header("Price"),
        ]
    }

    fn create_test_pivot() -> PivotModel {
        PivotModel::new(
            "make",
            vec![
                AggModelItem::new("price", AggregationType::Sum),
                AggModelItem::new("year", AggregationType::Count),
            ],
        )
    }

    fn table(outcome: &PivotOutcome<Rec>) -> &PivotTable {
        outcome.as_table().expect("expected a pivoted table")
    }

    #[test]
    fn test_inactive_pivot_passes_through() {
        let rows = create_test_rows();
        let mut pivot = create_test_pivot();
        pivot.enabled = false;
        match pivot_rows(&rows, &create_test_cols(), &pivot, None) {
            PivotOutcome::Passthrough(out) => assert_eq!(out, rows),
            PivotOutcome::Pivoted(_) => panic!("disabled pivot must not pivot"),
        }

        let no_values = PivotModel::new("make", Vec::new());
        assert!(!pivot_rows(&rows, &create_test_cols(), &no_values, None).is_pivoted());
    }

    #[test]
    fn test_unknown_pivot_column_passes_through() {
        let pivot = PivotModel::new("colour", vec![AggModelItem::new("price", AggregationType::Sum)]);
        assert!(!pivot_rows(&create_test_rows(), &create_test_cols(), &pivot, None).is_pivoted());
    }

    #[test]
    fn test_buckets_follow_first_seen_order() {
        let outcome = pivot_rows(&create_test_rows(), &create_test_cols(), &create_test_pivot(), None);
        let keys: Vec<&GroupKey> = table(&outcome).rows.iter().map(|r| &r.pivot_key).collect();
        assert_eq!(
            keys,
            vec![&GroupKey::Value("VW".into()), &GroupKey::Value("Ford".into()), &GroupKey::Null]
        );
    }

    #[test]
    fn test_dynamic_columns() {
        let outcome = pivot_rows(&create_test_rows(), &create_test_cols(), &create_test_pivot(), None);
        let t = table(&outcome);

        // 3 distinct pivot values x 2 value columns.
        assert_eq!(t.dynamic_cols.len(), 6);
        assert!(t.paths.is_empty());

        let first = &t.dynamic_cols[0];
        assert_eq!(first.col_id(), "pv:VW:price");
        assert_eq!(first.header_label(), "Price VW");
        assert!(!first.is_sortable());
        assert_eq!(first.width, Some(PIVOT_COLUMN_WIDTH));
        assert_eq!(first.filter.as_ref().and_then(|f| f.kind()), Some(FilterType::Number));

        assert_eq!(t.dynamic_cols[1].header_label(), "year VW");
        assert_eq!(t.dynamic_cols[4].col_id(), "pv:__null__:price");
        assert_eq!(t.dynamic_cols[4].header_label(), "Price (blank)");
    }

    #[test]
    fn test_row_aggregates() {
        let outcome = pivot_rows(&create_test_rows(), &create_test_cols(), &create_test_pivot(), None);
        let ford = &table(&outcome).rows[1];
        assert_eq!(ford.get("pv:Ford:price"), Some(&Value::Number(150.0)));
        assert_eq!(ford.get("pv:Ford:year"), Some(&Value::Number(2.0)));
        assert_eq!(ford.field(PIVOT_KEY_FIELD), Some(Value::from("Ford")));

        let blank = &table(&outcome).rows[2];
        assert_eq!(blank.field(PIVOT_KEY_FIELD), Some(Value::Null));
        assert_eq!(blank.get("pv:__null__:price"), Some(&Value::Number(10.0)));
    }

    #[test]
    fn test_generated_columns_read_pivot_rows() {
        let outcome = pivot_rows(&create_test_rows(), &create_test_cols(), &create_test_pivot(), None);
        let t = table(&outcome);
        let vw_price = &t.dynamic_cols[0];
        assert_eq!(vw_price.value_of(&t.rows[0]), Value::Number(80.0));
        // Other buckets have no value under this column.
        assert_eq!(vw_price.value_of(&t.rows[1]), Value::Null);
    }

    #[test]
    fn test_pivot_row_json() {
        let outcome = pivot_rows(&create_test_rows(), &create_test_cols(), &create_test_pivot(), None);
        let json = serde_json::to_value(&table(&outcome).rows[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"__pivotKey": "VW", "pv:VW:price": 80.0, "pv:VW:year": 1.0})
        );
    }
}
