//! FILENAME: core/grid-engine/src/definition.rs
//! View Models - The serializable description of the current view.
//!
//! This module contains the types that DESCRIBE how a row set should be
//! presented: sort keys, filters, grouping levels, aggregations and pivoting.
//! These structures are designed to be:
//! - Serializable (the host sends them as JSON with camelCase names)
//! - Owned by the caller and recreated on every interaction
//! - Immutable snapshots of user intent

use std::fmt;
use std::sync::Arc;

use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};

use crate::value::Value;

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One sort key. The position in the model decides precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortModelItem {
    pub col_id: String,
    pub sort: SortDirection,
}

impl SortModelItem {
    pub fn new(col_id: impl Into<String>, sort: SortDirection) -> Self {
        SortModelItem {
            col_id: col_id.into(),
            sort,
        }
    }

    pub fn asc(col_id: impl Into<String>) -> Self {
        Self::new(col_id, SortDirection::Asc)
    }

    pub fn desc(col_id: impl Into<String>) -> Self {
        Self::new(col_id, SortDirection::Desc)
    }
}

// ============================================================================
// FILTERING
// ============================================================================

/// Semantic comparator family used by the built-in filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Text,
    Number,
    Date,
}

/// How a text filter matches the cell's string form (case-insensitive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextMatchMode {
    #[default]
    Contains,
    StartsWith,
    Equals,
}

/// A filter on one column.
///
/// For `number` and `date` filters `value` is the lower bound and `value_to`
/// the upper bound, both inclusive and both optional (`Null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterModelItem {
    pub col_id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<FilterType>,

    #[serde(default)]
    pub value: Value,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value_to: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<TextMatchMode>,
}

impl FilterModelItem {
    pub fn new(col_id: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterModelItem {
            col_id: col_id.into(),
            filter_type: None,
            value: value.into(),
            value_to: Value::Null,
            match_mode: None,
        }
    }

    /// A text filter with an explicit match mode.
    pub fn text(col_id: impl Into<String>, value: impl Into<String>, mode: TextMatchMode) -> Self {
        FilterModelItem {
            filter_type: Some(FilterType::Text),
            match_mode: Some(mode),
            ..Self::new(col_id, Value::Text(value.into()))
        }
    }

    /// An inclusive numeric range; either bound may be open.
    pub fn number_range(col_id: impl Into<String>, from: Option<f64>, to: Option<f64>) -> Self {
        FilterModelItem {
            filter_type: Some(FilterType::Number),
            value_to: Value::from(to),
            ..Self::new(col_id, Value::from(from))
        }
    }

    /// An inclusive date range; bounds are anything the date coercion accepts.
    pub fn date_range(col_id: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        FilterModelItem {
            filter_type: Some(FilterType::Date),
            value_to: to.into(),
            ..Self::new(col_id, from)
        }
    }

    pub fn with_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = Some(filter_type);
        self
    }

    pub fn with_match_mode(mut self, mode: TextMatchMode) -> Self {
        self.match_mode = Some(mode);
        self
    }
}

// ============================================================================
// GROUPING
// ============================================================================

/// One grouping level. The first item is the outermost level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupModelItem {
    pub col_id: String,
}

impl GroupModelItem {
    pub fn new(col_id: impl Into<String>) -> Self {
        GroupModelItem {
            col_id: col_id.into(),
        }
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Built-in aggregation catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    Sum,
    Min,
    Max,
    Avg,
    #[default]
    Count,
}

impl AggregationType {
    /// Resolves a catalog name. Anything unrecognised counts rows.
    pub fn from_name(name: &str) -> Self {
        match name {
            "sum" => AggregationType::Sum,
            "min" => AggregationType::Min,
            "max" => AggregationType::Max,
            "avg" => AggregationType::Avg,
            _ => AggregationType::Count,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
            AggregationType::Avg => "avg",
            AggregationType::Count => "count",
        }
    }
}

/// A caller-supplied reduction over the cell values of a bucket.
pub type CustomAggregator = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// An aggregation: either from the catalog or a custom reduction.
///
/// Serializes as the catalog name. A custom reduction cannot be serialized;
/// attempting to is an error.
#[derive(Clone)]
pub enum AggFunc {
    Builtin(AggregationType),
    Custom(CustomAggregator),
}

impl AggFunc {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        AggFunc::Custom(Arc::new(f))
    }

    pub fn builtin(&self) -> Option<AggregationType> {
        match self {
            AggFunc::Builtin(agg) => Some(*agg),
            AggFunc::Custom(_) => None,
        }
    }
}

impl From<AggregationType> for AggFunc {
    fn from(agg: AggregationType) -> Self {
        AggFunc::Builtin(agg)
    }
}

impl fmt::Debug for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggFunc::Builtin(agg) => f.debug_tuple("Builtin").field(agg).finish(),
            AggFunc::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Serialize for AggFunc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AggFunc::Builtin(agg) => serializer.serialize_str(agg.name()),
            AggFunc::Custom(_) => Err(S::Error::custom(
                "custom aggregation functions cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for AggFunc {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(AggFunc::Builtin(AggregationType::from_name(&name)))
    }
}

/// The aggregation to compute for one value-bearing column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggModelItem {
    pub col_id: String,
    pub agg_func: AggFunc,
}

impl AggModelItem {
    pub fn new(col_id: impl Into<String>, agg_func: impl Into<AggFunc>) -> Self {
        AggModelItem {
            col_id: col_id.into(),
            agg_func: agg_func.into(),
        }
    }
}

// ============================================================================
// PIVOTING
// ============================================================================

/// Pivot configuration. Row-group columns are carried for the host but the
/// pivot stage only cross-tabulates by `pivot_col`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotModel {
    #[serde(default)]
    pub row_group_cols: Vec<GroupModelItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot_col: Option<String>,

    #[serde(default)]
    pub value_cols: Vec<AggModelItem>,

    #[serde(default)]
    pub enabled: bool,
}

impl PivotModel {
    pub fn new(pivot_col: impl Into<String>, value_cols: Vec<AggModelItem>) -> Self {
        PivotModel {
            row_group_cols: Vec::new(),
            pivot_col: Some(pivot_col.into()),
            value_cols,
            enabled: true,
        }
    }

    /// Enabled, with a pivot column and at least one value column.
    pub fn is_active(&self) -> bool {
        self.enabled && self.pivot_col.is_some() && !self.value_cols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_item_wire_names() {
        let json = r#"{"colId":"price","type":"number","value":10,"valueTo":20}"#;
        let item: FilterModelItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.col_id, "price");
        assert_eq!(item.filter_type, Some(FilterType::Number));
        assert_eq!(item.value, Value::Number(10.0));
        assert_eq!(item.value_to, Value::Number(20.0));
        assert_eq!(item.match_mode, None);

        let text: FilterModelItem =
            serde_json::from_str(r#"{"colId":"make","value":"fo","matchMode":"startsWith"}"#).unwrap();
        assert_eq!(text.match_mode, Some(TextMatchMode::StartsWith));
        assert_eq!(text.value_to, Value::Null);
    }

    #[test]
    fn test_agg_func_names() {
        let item: AggModelItem = serde_json::from_str(r#"{"colId":"price","aggFunc":"avg"}"#).unwrap();
        assert_eq!(item.agg_func.builtin(), Some(AggregationType::Avg));

        let unknown: AggModelItem = serde_json::from_str(r#"{"colId":"price","aggFunc":"median"}"#).unwrap();
        assert_eq!(unknown.agg_func.builtin(), Some(AggregationType::Count));

        let out = serde_json::to_string(&AggModelItem::new("price", AggregationType::Sum)).unwrap();
        assert_eq!(out, r#"{"colId":"price","aggFunc":"sum"}"#);
    }

    #[test]
    fn test_custom_agg_func_does_not_serialize() {
        let item = AggModelItem::new("price", AggFunc::custom(|values| Value::from(values.len())));
        assert!(serde_json::to_string(&item).is_err());
    }

    #[test]
    fn test_enum_defaults() {
        assert_eq!(SortDirection::default(), SortDirection::Asc);
        assert_eq!(TextMatchMode::default(), TextMatchMode::Contains);
        assert_eq!(AggregationType::default(), AggregationType::Count);
    }

    #[test]
    fn test_pivot_model_activation() {
        let mut pivot = PivotModel::new("year", vec![AggModelItem::new("price", AggregationType::Sum)]);
        assert!(pivot.is_active());

        pivot.enabled = false;
        assert!(!pivot.is_active());

        let empty = PivotModel::default();
        assert!(!empty.is_active());

        let parsed: PivotModel = serde_json::from_str(r#"{"enabled":true,"pivotCol":"year"}"#).unwrap();
        assert!(!parsed.is_active());
    }
}
