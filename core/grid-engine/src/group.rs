//! FILENAME: core/grid-engine/src/group.rs
//! PURPOSE: Multi-level grouping with aggregation, flattened to view rows.
//! CONTEXT: Rows are bucketed one level per group column into a tree, each
//! node is aggregated over the rows of its subtree, and the tree is walked
//! depth-first into a flat sequence of group markers and data rows. Whether a
//! node's contents are emitted is decided by the caller's expansion state.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::hash::BuildHasher;

use serde::{Serialize, Serializer};

use crate::aggregate::aggregate_values;
use crate::column::{column_index, get_cell_value, ColumnDef};
use crate::definition::{AggModelItem, GroupModelItem};
use crate::row::Row;
use crate::value::{GroupKey, Value};

/// Separator between the bucket labels of a group path.
pub const PATH_SEPARATOR: char = '|';

// ============================================================================
// EXPANSION STATE
// ============================================================================

/// Answers whether the group at `path` shows its contents.
pub trait ExpansionState {
    fn is_expanded(&self, path: &str) -> bool;
}

impl<S: BuildHasher> ExpansionState for HashSet<String, S> {
    fn is_expanded(&self, path: &str) -> bool {
        self.contains(path)
    }
}

impl ExpansionState for BTreeSet<String> {
    fn is_expanded(&self, path: &str) -> bool {
        self.contains(path)
    }
}

// ============================================================================
// VIEW ROWS
// ============================================================================

/// A synthetic row heading one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupViewRow {
    /// The group column's value as found on the first row of the bucket;
    /// null for the missing-value bucket.
    pub key: Value,
    pub col_id: String,
    /// Depth, 0 for the outermost level.
    pub level: usize,
    pub path: String,
    /// Number of data rows in the whole subtree.
    pub count: usize,
    /// Aggregate per aggregation column id.
    pub agg: BTreeMap<String, Value>,
}

/// One row of a grouped view: a group marker or an original data row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowView<R> {
    Group(GroupViewRow),
    Data(R),
}

impl<R> RowView<R> {
    pub fn is_group(&self) -> bool {
        matches!(self, RowView::Group(_))
    }

    pub fn as_group(&self) -> Option<&GroupViewRow> {
        match self {
            RowView::Group(g) => Some(g),
            RowView::Data(_) => None,
        }
    }

    pub fn as_data(&self) -> Option<&R> {
        match self {
            RowView::Data(r) => Some(r),
            RowView::Group(_) => None,
        }
    }

    pub fn into_data(self) -> Option<R> {
        match self {
            RowView::Data(r) => Some(r),
            RowView::Group(_) => None,
        }
    }
}

#[derive(Serialize)]
struct GroupMarker<'a> {
    #[serde(rename = "__group")]
    group: bool,
    #[serde(flatten)]
    row: &'a GroupViewRow,
}

/// Group markers serialize with a `"__group": true` field next to their own
/// fields; data rows serialize as themselves.
impl<R: Serialize> Serialize for RowView<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowView::Group(row) => GroupMarker { group: true, row }.serialize(serializer),
            RowView::Data(row) => row.serialize(serializer),
        }
    }
}

/// Output of the grouping stage.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRows<R> {
    pub flat: Vec<RowView<R>>,
    /// Path of every emitted group marker, in emission order.
    pub paths: Vec<String>,
}

// ============================================================================
// GROUP TREE
// ============================================================================

struct GroupNode<'a, R> {
    marker: GroupViewRow,
    children: Vec<GroupNode<'a, R>>,
    /// Data rows, populated on the innermost level only.
    leaves: Vec<&'a R>,
}

struct TreeBuilder<'c, R> {
    levels: Vec<&'c ColumnDef<R>>,
    aggs: Vec<(&'c AggModelItem, Option<&'c ColumnDef<R>>)>,
}

impl<'c, R: Row> TreeBuilder<'c, R> {
    /// Recursively builds one level of the tree.
    fn build_level<'a>(&self, rows: Vec<&'a R>, level: usize, parent_path: &str) -> Vec<GroupNode<'a, R>> {
        let Some(&col) = self.levels.get(level) else {
            return Vec::new();
        };

        let mut buckets: BTreeMap<GroupKey, (Value, Vec<&'a R>)> = BTreeMap::new();
        for row in rows {
            let value = col.value_of(row);
            let key = GroupKey::from_value(&value);
            buckets.entry(key).or_insert_with(|| (value, Vec::new())).1.push(row);
        }

        let is_innermost = level + 1 == self.levels.len();
        buckets
            .into_iter()
            .map(|(key, (first_value, bucket_rows))| {
                let path = if parent_path.is_empty() {
                    key.label().to_string()
                } else {
                    format!("{}{}{}", parent_path, PATH_SEPARATOR, key.label())
                };

                let marker = GroupViewRow {
                    key: if key.is_null() { Value::Null } else { first_value },
                    col_id: col.col_id().to_string(),
                    level,
                    count: bucket_rows.len(),
                    agg: self.aggregate(&bucket_rows),
                    path,
                };

                if is_innermost {
                    GroupNode {
                        marker,
                        children: Vec::new(),
                        leaves: bucket_rows,
                    }
                } else {
                    let children = self.build_level(bucket_rows, level + 1, &marker.path);
                    GroupNode {
                        marker,
                        children,
                        leaves: Vec::new(),
                    }
                }
            })
            .collect()
    }

    /// Aggregates over every data row of a subtree. A repeated column id
    /// keeps the last entry's result.
    fn aggregate(&self, rows: &[&R]) -> BTreeMap<String, Value> {
        let mut agg = BTreeMap::new();
        for (item, col) in &self.aggs {
            let values: Vec<Value> = rows.iter().map(|row| get_cell_value(*col, Some(*row))).collect();
            agg.insert(item.col_id.clone(), aggregate_values(&item.agg_func, &values));
        }
        agg
    }
}

/// Depth-first walk. Every visited node emits its marker and records its
/// path; only expanded nodes descend.
fn flatten_nodes<R: Clone>(
    nodes: Vec<GroupNode<'_, R>>,
    expanded: Option<&dyn ExpansionState>,
    out: &mut GroupedRows<R>,
) {
    for node in nodes {
        let is_expanded = expanded.map_or(true, |state| state.is_expanded(&node.marker.path));
        out.paths.push(node.marker.path.clone());
        out.flat.push(RowView::Group(node.marker));

        if !is_expanded {
            continue;
        }
        if node.children.is_empty() {
            out.flat.extend(node.leaves.into_iter().cloned().map(RowView::Data));
        } else {
            flatten_nodes(node.children, expanded, out);
        }
    }
}

// ============================================================================
// GROUPING STAGE
// ============================================================================

/// Groups `rows` by each level of `group_model`, aggregates per `agg_model`
/// and flattens the tree.
///
/// `expanded` of `None` treats every group as expanded. Group levels naming
/// an unknown column are dropped; with no usable level the rows pass through
/// unchanged and no paths are reported.
pub fn group_and_flatten_rows<R: Row + Clone>(
    rows: &[R],
    cols: &[ColumnDef<R>],
    group_model: &[GroupModelItem],
    agg_model: &[AggModelItem],
    expanded: Option<&dyn ExpansionState>,
) -> GroupedRows<R> {
    let index = column_index(cols);
    let levels: Vec<&ColumnDef<R>> = group_model
        .iter()
        .filter_map(|item| {
            let col = index.get(item.col_id.as_str()).copied();
            if col.is_none() {
                log::trace!(target: "GROUP", "dropping group level on unknown column '{}'", item.col_id);
            }
            col
        })
        .collect();

    if levels.is_empty() {
        return GroupedRows {
            flat: rows.iter().cloned().map(RowView::Data).collect(),
            paths: Vec::new(),
        };
    }

    let builder = TreeBuilder {
        levels,
        aggs: agg_model
            .iter()
            .map(|item| (item, index.get(item.col_id.as_str()).copied()))
            .collect(),
    };
    let tree = builder.build_level(rows.iter().collect(), 0, "");
    log::debug!(
        target: "GROUP",
        "grouped {} rows into {} top-level groups over {} levels",
        rows.len(),
        tree.len(),
        builder.levels.len()
    );

    let mut out = GroupedRows {
        flat: Vec::with_capacity(rows.len() + tree.len()),
        paths: Vec::new(),
    };
    flatten_nodes(tree, expanded, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AggregationType;
    use crate::row::record;

    type Rec = BTreeMap<String, Value>;

    fn create_test_rows() -> Vec<Rec> {
        vec![
            record([("make", Value::from("Ford")), ("year", Value::from(2020)), ("price", Value::from(100))]),
            record([("make", Value::from("Ford")), ("year", Value::from(2021)), ("price", Value::from(50))]),
            record([("make", Value::from("VW")), ("year", Value::from(2020)), ("price", Value::from(80))]),
        ]
    }

    fn create_test_cols() -> Vec<ColumnDef<Rec>> {
        vec![ColumnDef::new("make"), ColumnDef::new("year"), ColumnDef::new("price")]
    }

    fn sum_price() -> Vec<AggModelItem> {
        vec![AggModelItem::new("price", AggregationType::Sum)]
    }

    fn group(view: &RowView<Rec>) -> &GroupViewRow {
        view.as_group().expect("expected a group marker")
    }

    #[test]
    fn test_empty_group_model_passes_through() {
        let rows = create_test_rows();
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &[], &sum_price(), None);
        assert!(out.paths.is_empty());
        assert_eq!(out.flat.len(), 3);
        assert!(out.flat.iter().all(|v| !v.is_group()));
    }

    #[test]
    fn test_single_level_fully_expanded() {
        let rows = create_test_rows();
        let model = [GroupModelItem::new("make")];
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &model, &sum_price(), None);

        assert_eq!(out.flat.len(), 5);
        let ford = group(&out.flat[0]);
        assert_eq!(ford.key, Value::from("Ford"));
        assert_eq!(ford.count, 2);
        assert_eq!(ford.agg["price"], Value::Number(150.0));
        assert_eq!(out.flat[1].as_data(), Some(&rows[0]));
        assert_eq!(out.flat[2].as_data(), Some(&rows[1]));

        let vw = group(&out.flat[3]);
        assert_eq!(vw.path, "VW");
        assert_eq!(vw.count, 1);
        assert_eq!(vw.agg["price"], Value::Number(80.0));
        assert_eq!(out.flat[4].as_data(), Some(&rows[2]));

        assert_eq!(out.paths, vec!["Ford", "VW"]);
    }

    #[test]
    fn test_collapsed_group_hides_leaves() {
        let rows = create_test_rows();
        let expanded: HashSet<String> = ["VW".to_string()].into_iter().collect();
        let model = [GroupModelItem::new("make")];
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &model, &sum_price(), Some(&expanded));

        assert_eq!(out.flat.len(), 3);
        assert!(out.flat[0].is_group());
        assert!(out.flat[1].is_group());
        assert_eq!(out.flat[2].as_data(), Some(&rows[2]));
        assert_eq!(out.paths, vec!["Ford", "VW"]);
    }

    #[test]
    fn test_counts_add_up_to_row_count() {
        let rows = create_test_rows();
        let empty: BTreeSet<String> = BTreeSet::new();
        let model = [GroupModelItem::new("year")];
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &model, &[], Some(&empty));
        let total: usize = out.flat.iter().filter_map(|v| v.as_group()).map(|g| g.count).sum();
        assert_eq!(total, rows.len());
    }

    #[test]
    fn test_two_levels_build_joined_paths() {
        let rows = create_test_rows();
        let model = [GroupModelItem::new("make"), GroupModelItem::new("year")];
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &model, &sum_price(), None);

        assert_eq!(out.paths, vec!["Ford", "Ford|2020", "Ford|2021", "VW", "VW|2020"]);
        let ford = group(&out.flat[0]);
        assert_eq!(ford.count, 2);
        assert_eq!(ford.agg["price"], Value::Number(150.0));

        let ford_2021 = group(&out.flat[3]);
        assert_eq!(ford_2021.level, 1);
        assert_eq!(ford_2021.col_id, "year");
        assert_eq!(ford_2021.key, Value::Number(2021.0));
        assert_eq!(ford_2021.agg["price"], Value::Number(50.0));
    }

    #[test]
    fn test_collapsed_parent_hides_descendant_paths() {
        let rows = create_test_rows();
        let expanded: BTreeSet<String> = ["VW".to_string(), "VW|2020".to_string()].into_iter().collect();
        let model = [GroupModelItem::new("make"), GroupModelItem::new("year")];
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &model, &[], Some(&expanded));

        assert_eq!(out.paths, vec!["Ford", "VW", "VW|2020"]);
        assert_eq!(out.flat.len(), 4);
        assert_eq!(out.flat[3].as_data(), Some(&rows[2]));
    }

    #[test]
    fn test_keys_sort_as_strings() {
        let rows = vec![
            record([("n", Value::from(9))]),
            record([("n", Value::from(10))]),
            record([("n", Value::from(100))]),
        ];
        let cols = vec![ColumnDef::<Rec>::new("n")];
        let out = group_and_flatten_rows(&rows, &cols, &[GroupModelItem::new("n")], &[], None);
        assert_eq!(out.paths, vec!["10", "100", "9"]);
    }

    #[test]
    fn test_null_bucket_is_distinct_from_sentinel_text() {
        let rows = vec![
            record([("make", Value::Null)]),
            record([("make", Value::from("__null__"))]),
            record([("other", Value::from(1))]),
        ];
        let cols = vec![ColumnDef::<Rec>::new("make")];
        let out = group_and_flatten_rows(&rows, &cols, &[GroupModelItem::new("make")], &[], None);

        let markers: Vec<&GroupViewRow> = out.flat.iter().filter_map(|v| v.as_group()).collect();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].key, Value::Null);
        assert_eq!(markers[0].count, 2);
        assert_eq!(markers[1].key, Value::from("__null__"));
        assert_eq!(out.paths, vec!["__null__", "__null__"]);
    }

    #[test]
    fn test_unknown_group_column_is_dropped() {
        let rows = create_test_rows();
        let model = [GroupModelItem::new("nope"), GroupModelItem::new("make")];
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &model, &[], None);
        assert_eq!(out.paths, vec!["Ford", "VW"]);

        let only_unknown = [GroupModelItem::new("nope")];
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &only_unknown, &[], None);
        assert!(out.paths.is_empty());
        assert_eq!(out.flat.len(), 3);
    }

    #[test]
    fn test_duplicate_agg_column_keeps_last() {
        let rows = create_test_rows();
        let aggs = vec![
            AggModelItem::new("price", AggregationType::Sum),
            AggModelItem::new("price", AggregationType::Max),
        ];
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &[GroupModelItem::new("make")], &aggs, None);
        assert_eq!(group(&out.flat[0]).agg["price"], Value::Number(100.0));
    }

    #[test]
    fn test_group_marker_json_shape() {
        let rows = create_test_rows();
        let out = group_and_flatten_rows(&rows, &create_test_cols(), &[GroupModelItem::new("make")], &sum_price(), None);
        let json = serde_json::to_value(&out.flat[3]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "__group": true,
                "key": "VW",
                "colId": "make",
                "level": 0,
                "path": "VW",
                "count": 1,
                "agg": {"price": 80.0}
            })
        );
    }
}
