//! FILENAME: core/grid-engine/src/filter.rs
//! PURPOSE: Per-column row filtering.
//! CONTEXT: Every active filter entry must pass (logical AND). A column can
//! replace the built-in comparison with its own predicate or comparator.

use crate::column::{column_index, ColumnDef, ColumnFilter};
use crate::definition::{FilterModelItem, FilterType, TextMatchMode};
use crate::row::Row;
use crate::value::Value;

// ============================================================================
// BUILT-IN COMPARATOR
// ============================================================================

/// The built-in filter comparison.
///
/// - `Number`: passes when both bounds are null; otherwise the cell must
///   coerce to a number inside the inclusive `[value, value_to]` range, where
///   a bound that does not coerce is open.
/// - `Date`: the same range check on epoch milliseconds; passes when both
///   bounds are falsy.
/// - `Text`: passes on a blank filter value; otherwise a case-insensitive
///   `contains` (default), `startsWith` or `equals` on the string forms.
pub fn default_filter_comparator(
    cell: &Value,
    value: &Value,
    value_to: &Value,
    filter_type: FilterType,
    match_mode: Option<TextMatchMode>,
) -> bool {
    match filter_type {
        FilterType::Number => {
            if value.is_null() && value_to.is_null() {
                return true;
            }
            in_range(cell.as_number(), value.as_number(), value_to.as_number())
        }
        FilterType::Date => {
            if value.is_falsy() && value_to.is_falsy() {
                return true;
            }
            in_range(
                cell.as_timestamp_millis(),
                value.as_timestamp_millis(),
                value_to.as_timestamp_millis(),
            )
        }
        FilterType::Text => {
            if value.is_blank() {
                return true;
            }
            let haystack = cell.to_lowercase_string();
            let needle = value.to_lowercase_string();
            match match_mode.unwrap_or_default() {
                TextMatchMode::StartsWith => haystack.starts_with(&needle),
                TextMatchMode::Equals => haystack == needle,
                TextMatchMode::Contains => haystack.contains(&needle),
            }
        }
    }
}

fn in_range(cell: Option<f64>, from: Option<f64>, to: Option<f64>) -> bool {
    let Some(n) = cell else {
        return false;
    };
    if from.is_some_and(|from| n < from) {
        return false;
    }
    if to.is_some_and(|to| n > to) {
        return false;
    }
    true
}

// ============================================================================
// FILTER STAGE
// ============================================================================

/// Checks one row against one filter entry.
fn entry_passes<R: Row>(col: &ColumnDef<R>, entry: &FilterModelItem, row: &R) -> bool {
    let cell = col.value_of(row);

    if let Some(ColumnFilter::Predicate(predicate)) = &col.filter {
        return predicate(&cell, row);
    }

    let filter_type = entry.filter_type.unwrap_or(if cell.is_number() {
        FilterType::Number
    } else {
        FilterType::Text
    });
    let match_mode = entry.match_mode.or(col.filter_match_mode);

    match &col.filter_comparator {
        Some(cmp) => cmp(&cell, &entry.value, &entry.value_to, filter_type, match_mode),
        None => default_filter_comparator(&cell, &entry.value, &entry.value_to, filter_type, match_mode),
    }
}

/// Returns the rows that satisfy every entry of `filter_model`, in their
/// original order. Entries naming an unknown column are skipped.
pub fn filter_rows<R: Row + Clone>(
    rows: &[R],
    cols: &[ColumnDef<R>],
    filter_model: &[FilterModelItem],
) -> Vec<R> {
    if rows.is_empty() {
        return Vec::new();
    }
    if filter_model.is_empty() {
        return rows.to_vec();
    }

    let index = column_index(cols);
    let active: Vec<(&ColumnDef<R>, &FilterModelItem)> = filter_model
        .iter()
        .filter_map(|entry| match index.get(entry.col_id.as_str()) {
            Some(&col) => Some((col, entry)),
            None => {
                log::trace!(target: "FILTER", "skipping filter on unknown column '{}'", entry.col_id);
                None
            }
        })
        .collect();

    rows.iter()
        .filter(|row| active.iter().all(|(col, entry)| entry_passes(col, entry, row)))
        .cloned()
        .collect()
}
