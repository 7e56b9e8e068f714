//! FILENAME: core/grid-engine/src/lib.rs
//! Tabular view engine.
//!
//! Turns a set of caller-owned rows plus a set of view models into the rows a
//! grid displays. Every stage is a pure function over borrowed input and
//! returns fresh output; the caller runs
//! `filter -> sort -> (pivot | group | pass-through)` whenever anything
//! changes.
//!
//! Layers:
//! - `value` / `row`: Cell values and field access on caller rows
//! - `definition`: Serializable view models (what the view IS)
//! - `column`: Column definitions, default merging, value resolution
//! - `sort` / `filter`: Row selection and ordering
//! - `aggregate`: Reductions shared by grouping and pivoting
//! - `group`: Group tree, aggregation and flattening (WHAT we display)
//! - `pivot`: Cross-tab with generated columns
//! - `csv`: Text export

pub mod value;
pub mod row;
pub mod definition;
pub mod column;
pub mod sort;
pub mod filter;
pub mod aggregate;
pub mod group;
pub mod pivot;
pub mod csv;

pub use value::{GroupKey, Value, NULL_KEY_LABEL};
pub use row::{record, Row};
pub use definition::*;
pub use column::{
    get_cell_value, merge_col_def, ColumnDef, ColumnDefaults, ColumnFilter, FilterComparator,
    FilterPredicate, RowComparator, ValueFormatter, ValueGetter, ValueSource,
};
pub use sort::{default_compare, sort_rows};
pub use filter::{default_filter_comparator, filter_rows};
pub use aggregate::{aggregate_values, resolve_agg_func, AggregateAccumulator};
pub use group::{group_and_flatten_rows, ExpansionState, GroupViewRow, GroupedRows, RowView, PATH_SEPARATOR};
pub use pivot::{
    pivot_field_id, pivot_rows, PivotOutcome, PivotRow, PivotTable, BLANK_LABEL, PIVOT_COLUMN_WIDTH,
    PIVOT_KEY_FIELD,
};
pub use csv::{escape_csv, to_csv};
