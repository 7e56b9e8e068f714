//! FILENAME: core/grid-engine/src/sort.rs
//! PURPOSE: Multi-key row sorting.
//! CONTEXT: Applies an ordered list of (column, direction) keys with a
//! cascading comparator. Keys on unknown or non-sortable columns are dropped.

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::column::{column_index, ColumnDef};
use crate::definition::{SortDirection, SortModelItem};
use crate::row::Row;
use crate::value::Value;

/// A resolved sort key.
struct SortKey<'a, R> {
    col: &'a ColumnDef<R>,
    direction: SortDirection,
}

impl<R: Row> SortKey<'_, R> {
    fn compare(&self, a: &R, b: &R) -> Ordering {
        let va = self.col.value_of(a);
        let vb = self.col.value_of(b);
        let ord = match &self.col.comparator {
            Some(cmp) => cmp(&va, &vb, a, b),
            None => default_compare(&va, &vb),
        };
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// The fallback comparator: null before anything else, numbers numerically,
/// everything else by string form.
pub fn default_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(na), Value::Number(nb)) => na.partial_cmp(nb).unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Returns the rows ordered by `sort_model`. The input is never reordered in
/// place; rows that tie on every key keep their relative order.
pub fn sort_rows<R: Row + Clone>(
    rows: &[R],
    cols: &[ColumnDef<R>],
    sort_model: &[SortModelItem],
) -> Vec<R> {
    if rows.is_empty() {
        return Vec::new();
    }
    if sort_model.is_empty() {
        return rows.to_vec();
    }

    let index = column_index(cols);
    let keys: SmallVec<[SortKey<'_, R>; 4]> = sort_model
        .iter()
        .filter_map(|item| match index.get(item.col_id.as_str()) {
            Some(&col) if col.is_sortable() => Some(SortKey {
                col,
                direction: item.sort,
            }),
            _ => {
                log::trace!(target: "SORT", "dropping sort key on '{}'", item.col_id);
                None
            }
        })
        .collect();

    if keys.is_empty() {
        return rows.to_vec();
    }

    let mut sorted: Vec<&R> = rows.iter().collect();
    merge_sort_by(&mut sorted, &|a: &&R, b: &&R| {
        keys.iter()
            .map(|key| key.compare(a, b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    sorted.into_iter().cloned().collect()
}

/// Stable top-down merge sort.
///
/// The comparator is never checked for consistency: mixed number and text
/// keys, `NaN` or a caller comparator that is not a total order produce some
/// permutation of the input, never a panic.
fn merge_sort_by<T, F>(items: &mut [T], compare: &F)
where
    T: Copy,
    F: Fn(&T, &T) -> Ordering,
{
    let len = items.len();
    if len <= 1 {
        return;
    }
    let mid = len / 2;
    merge_sort_by(&mut items[..mid], compare);
    merge_sort_by(&mut items[mid..], compare);

    let mut merged = Vec::with_capacity(len);
    let (left, right) = items.split_at(mid);
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        // Right wins only when strictly smaller, so ties keep input order.
        if compare(&right[j], &left[i]) == Ordering::Less {
            merged.push(right[j]);
            j += 1;
        } else {
            merged.push(left[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    items.copy_from_slice(&merged);
}
