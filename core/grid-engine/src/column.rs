//! FILENAME: core/grid-engine/src/column.rs
//! PURPOSE: Column definitions, default merging and cell value resolution.
//! CONTEXT: Every model (sort, filter, group, aggregation, pivot) refers to a
//! column by its id. A column reads its value either straight from a row
//! field or through a caller-supplied getter.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::definition::{AggFunc, FilterType, TextMatchMode};
use crate::row::Row;
use crate::value::Value;

// ============================================================================
// CALLBACK TYPES
// ============================================================================

/// Computes a cell value from a row.
pub type ValueGetter<R> = Arc<dyn Fn(&R) -> Value + Send + Sync>;

/// Transforms a raw value for display and export.
pub type ValueFormatter<R> = Arc<dyn Fn(&Value, &R) -> Value + Send + Sync>;

/// Custom sort comparator: `(a, b, row_a, row_b)`.
pub type RowComparator<R> = Arc<dyn Fn(&Value, &Value, &R, &R) -> Ordering + Send + Sync>;

/// Custom filter predicate: `(cell_value, row)`. Returning `false` rejects
/// the row.
pub type FilterPredicate<R> = Arc<dyn Fn(&Value, &R) -> bool + Send + Sync>;

/// Replacement for the built-in filter comparator:
/// `(cell_value, value, value_to, filter_type, match_mode)`.
pub type FilterComparator =
    Arc<dyn Fn(&Value, &Value, &Value, FilterType, Option<TextMatchMode>) -> bool + Send + Sync>;

// ============================================================================
// VALUE SOURCE
// ============================================================================

/// Where a column's values come from.
pub enum ValueSource<R> {
    /// Read the row field with this name. The name is also the column id.
    Field(String),
    /// Compute the value; `col_id` identifies the column in models.
    Getter {
        col_id: String,
        getter: ValueGetter<R>,
    },
}

impl<R> ValueSource<R> {
    pub fn col_id(&self) -> &str {
        match self {
            ValueSource::Field(field) => field,
            ValueSource::Getter { col_id, .. } => col_id,
        }
    }
}

impl<R> Clone for ValueSource<R> {
    fn clone(&self) -> Self {
        match self {
            ValueSource::Field(field) => ValueSource::Field(field.clone()),
            ValueSource::Getter { col_id, getter } => ValueSource::Getter {
                col_id: col_id.clone(),
                getter: Arc::clone(getter),
            },
        }
    }
}

impl<R> fmt::Debug for ValueSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Field(field) => f.debug_tuple("Field").field(field).finish(),
            ValueSource::Getter { col_id, .. } => {
                f.debug_struct("Getter").field("col_id", col_id).finish_non_exhaustive()
            }
        }
    }
}

/// A column's filter: a semantic kind for the built-in comparator, or a
/// predicate that replaces it entirely.
pub enum ColumnFilter<R> {
    Kind(FilterType),
    Predicate(FilterPredicate<R>),
}

impl<R> ColumnFilter<R> {
    pub fn kind(&self) -> Option<FilterType> {
        match self {
            ColumnFilter::Kind(kind) => Some(*kind),
            ColumnFilter::Predicate(_) => None,
        }
    }
}

impl<R> Clone for ColumnFilter<R> {
    fn clone(&self) -> Self {
        match self {
            ColumnFilter::Kind(kind) => ColumnFilter::Kind(*kind),
            ColumnFilter::Predicate(p) => ColumnFilter::Predicate(Arc::clone(p)),
        }
    }
}

impl<R> fmt::Debug for ColumnFilter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnFilter::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            ColumnFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

// ============================================================================
// COLUMN DEFINITION
// ============================================================================

/// Describes one column.
///
/// Everything except the value source is optional so that a per-grid
/// [`ColumnDefaults`] can fill in what a column leaves unset.
pub struct ColumnDef<R> {
    pub source: ValueSource<R>,
    pub header_name: Option<String>,
    pub width: Option<u32>,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
    pub sortable: Option<bool>,
    pub filter: Option<ColumnFilter<R>>,
    pub filter_comparator: Option<FilterComparator>,
    pub filter_match_mode: Option<TextMatchMode>,
    pub agg_func: Option<AggFunc>,
    pub value_formatter: Option<ValueFormatter<R>>,
    pub comparator: Option<RowComparator<R>>,
}

impl<R> ColumnDef<R> {
    /// A column reading the row field `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self::from_source(ValueSource::Field(field.into()))
    }

    /// A computed column.
    pub fn computed<F>(col_id: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&R) -> Value + Send + Sync + 'static,
    {
        Self::from_source(ValueSource::Getter {
            col_id: col_id.into(),
            getter: Arc::new(getter),
        })
    }

    fn from_source(source: ValueSource<R>) -> Self {
        ColumnDef {
            source,
            header_name: None,
            width: None,
            min_width: None,
            max_width: None,
            sortable: None,
            filter: None,
            filter_comparator: None,
            filter_match_mode: None,
            agg_func: None,
            value_formatter: None,
            comparator: None,
        }
    }

    /// The id models use to refer to this column.
    pub fn col_id(&self) -> &str {
        self.source.col_id()
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable.unwrap_or(false)
    }

    /// Header text: the header name when set, else the column id.
    pub fn header_label(&self) -> &str {
        self.header_name.as_deref().unwrap_or_else(|| self.col_id())
    }

    /// Resolves this column's value in `row`: the getter when present, else
    /// the named field, `Null` when the row has no such field.
    pub fn value_of(&self, row: &R) -> Value
    where
        R: Row,
    {
        match &self.source {
            ValueSource::Getter { getter, .. } => getter(row),
            ValueSource::Field(field) => row.field(field).unwrap_or(Value::Null),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header_name = Some(header.into());
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_width_bounds(mut self, min_width: Option<u32>, max_width: Option<u32>) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    pub fn with_filter(mut self, kind: FilterType) -> Self {
        self.filter = Some(ColumnFilter::Kind(kind));
        self
    }

    pub fn with_filter_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value, &R) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(ColumnFilter::Predicate(Arc::new(predicate)));
        self
    }

    pub fn with_filter_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&Value, &Value, &Value, FilterType, Option<TextMatchMode>) -> bool + Send + Sync + 'static,
    {
        self.filter_comparator = Some(Arc::new(comparator));
        self
    }

    pub fn with_match_mode(mut self, mode: TextMatchMode) -> Self {
        self.filter_match_mode = Some(mode);
        self
    }

    pub fn with_agg(mut self, agg: impl Into<AggFunc>) -> Self {
        self.agg_func = Some(agg.into());
        self
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Value, &R) -> Value + Send + Sync + 'static,
    {
        self.value_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&Value, &Value, &R, &R) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Arc::new(comparator));
        self
    }
}

impl<R> Clone for ColumnDef<R> {
    fn clone(&self) -> Self {
        ColumnDef {
            source: self.source.clone(),
            header_name: self.header_name.clone(),
            width: self.width,
            min_width: self.min_width,
            max_width: self.max_width,
            sortable: self.sortable,
            filter: self.filter.clone(),
            filter_comparator: self.filter_comparator.clone(),
            filter_match_mode: self.filter_match_mode,
            agg_func: self.agg_func.clone(),
            value_formatter: self.value_formatter.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnDef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("source", &self.source)
            .field("header_name", &self.header_name)
            .field("width", &self.width)
            .field("sortable", &self.sortable)
            .field("filter", &self.filter)
            .field("filter_match_mode", &self.filter_match_mode)
            .field("agg_func", &self.agg_func)
            .field("has_formatter", &self.value_formatter.is_some())
            .field("has_comparator", &self.comparator.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// DEFAULTS & MERGING
// ============================================================================

/// Per-grid default column configuration. Any property a column leaves
/// unset is taken from here.
pub struct ColumnDefaults<R> {
    pub header_name: Option<String>,
    pub width: Option<u32>,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
    pub sortable: Option<bool>,
    pub filter: Option<ColumnFilter<R>>,
    pub filter_comparator: Option<FilterComparator>,
    pub filter_match_mode: Option<TextMatchMode>,
    pub agg_func: Option<AggFunc>,
    pub value_formatter: Option<ValueFormatter<R>>,
    pub comparator: Option<RowComparator<R>>,
}

impl<R> Default for ColumnDefaults<R> {
    fn default() -> Self {
        ColumnDefaults {
            header_name: None,
            width: None,
            min_width: None,
            max_width: None,
            sortable: None,
            filter: None,
            filter_comparator: None,
            filter_match_mode: None,
            agg_func: None,
            value_formatter: None,
            comparator: None,
        }
    }
}

impl<R> Clone for ColumnDefaults<R> {
    fn clone(&self) -> Self {
        ColumnDefaults {
            header_name: self.header_name.clone(),
            width: self.width,
            min_width: self.min_width,
            max_width: self.max_width,
            sortable: self.sortable,
            filter: self.filter.clone(),
            filter_comparator: self.filter_comparator.clone(),
            filter_match_mode: self.filter_match_mode,
            agg_func: self.agg_func.clone(),
            value_formatter: self.value_formatter.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnDefaults<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDefaults")
            .field("width", &self.width)
            .field("sortable", &self.sortable)
            .field("filter", &self.filter)
            .field("filter_match_mode", &self.filter_match_mode)
            .field("agg_func", &self.agg_func)
            .finish_non_exhaustive()
    }
}

/// Shallow merge: `defaults` first, then every property `col` sets itself.
pub fn merge_col_def<R>(col: &ColumnDef<R>, defaults: Option<&ColumnDefaults<R>>) -> ColumnDef<R> {
    let Some(d) = defaults else {
        return col.clone();
    };

    ColumnDef {
        source: col.source.clone(),
        header_name: col.header_name.clone().or_else(|| d.header_name.clone()),
        width: col.width.or(d.width),
        min_width: col.min_width.or(d.min_width),
        max_width: col.max_width.or(d.max_width),
        sortable: col.sortable.or(d.sortable),
        filter: col.filter.clone().or_else(|| d.filter.clone()),
        filter_comparator: col.filter_comparator.clone().or_else(|| d.filter_comparator.clone()),
        filter_match_mode: col.filter_match_mode.or(d.filter_match_mode),
        agg_func: col.agg_func.clone().or_else(|| d.agg_func.clone()),
        value_formatter: col.value_formatter.clone().or_else(|| d.value_formatter.clone()),
        comparator: col.comparator.clone().or_else(|| d.comparator.clone()),
    }
}

/// Resolves a cell value. A missing column or a missing row yields `Null`.
///
/// Getters take a row reference, so a computed column with no row is not
/// invoked and also yields `Null`.
pub fn get_cell_value<R: Row>(col: Option<&ColumnDef<R>>, row: Option<&R>) -> Value {
    match (col, row) {
        (Some(col), Some(row)) => col.value_of(row),
        _ => Value::Null,
    }
}

/// Index of columns by id. A later column with the same id replaces an
/// earlier one.
pub(crate) fn column_index<R>(cols: &[ColumnDef<R>]) -> FxHashMap<&str, &ColumnDef<R>> {
    let mut map = FxHashMap::default();
    map.reserve(cols.len());
    for col in cols {
        map.insert(col.col_id(), col);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AggregationType;
    use crate::row::record;
    use std::collections::BTreeMap;

    type Rec = BTreeMap<String, Value>;

    #[test]
    fn test_merge_prefers_column_properties() {
        let defaults = ColumnDefaults::<Rec> {
            width: Some(160),
            sortable: Some(true),
            filter_match_mode: Some(TextMatchMode::StartsWith),
            ..Default::default()
        };
        let col = ColumnDef::<Rec>::new("price").sortable(false).with_width(90);

        let merged = merge_col_def(&col, Some(&defaults));
        assert_eq!(merged.width, Some(90));
        assert_eq!(merged.sortable, Some(false));
        assert_eq!(merged.filter_match_mode, Some(TextMatchMode::StartsWith));
        assert_eq!(merged.col_id(), "price");
    }

    #[test]
    fn test_merge_fills_unset_properties() {
        let defaults = ColumnDefaults::<Rec> {
            sortable: Some(true),
            agg_func: Some(AggregationType::Sum.into()),
            ..Default::default()
        };
        let merged = merge_col_def(&ColumnDef::<Rec>::new("make"), Some(&defaults));
        assert!(merged.is_sortable());
        assert_eq!(merged.agg_func.and_then(|a| a.builtin()), Some(AggregationType::Sum));

        let untouched = merge_col_def(&ColumnDef::<Rec>::new("make"), None);
        assert!(!untouched.is_sortable());
    }

    #[test]
    fn test_cell_value_resolution() {
        let row = record([("make", Value::from("Ford")), ("price", Value::from(100))]);
        let field = ColumnDef::<Rec>::new("make");
        let computed = ColumnDef::<Rec>::computed("double", |r: &Rec| {
            Value::from(r.field("price").and_then(|v| v.as_number()).map(|n| n * 2.0))
        });

        assert_eq!(get_cell_value(Some(&field), Some(&row)), Value::from("Ford"));
        assert_eq!(get_cell_value(Some(&computed), Some(&row)), Value::Number(200.0));
        assert_eq!(get_cell_value(Some(&ColumnDef::new("missing")), Some(&row)), Value::Null);
        assert_eq!(get_cell_value(None, Some(&row)), Value::Null);
        assert_eq!(get_cell_value(Some(&field), None), Value::Null);
        assert_eq!(get_cell_value(Some(&computed), None), Value::Null);
    }

    #[test]
    fn test_header_label_falls_back_to_id() {
        let plain = ColumnDef::<Rec>::new("price");
        assert_eq!(plain.header_label(), "price");
        assert_eq!(plain.with_header("Price").header_label(), "Price");
    }

    #[test]
    fn test_column_index_last_wins() {
        let cols = vec![
            ColumnDef::<Rec>::new("a").with_header("first"),
            ColumnDef::<Rec>::new("a").with_header("second"),
        ];
        let index = column_index(&cols);
        assert_eq!(index.len(), 1);
        assert_eq!(index["a"].header_label(), "second");
    }
}
