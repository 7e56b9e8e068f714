//! FILENAME: core/grid-api/src/api.rs
//! PURPOSE: Stateful grid facade over the view engine.
//! CONTEXT: `GridApi` owns one grid's rows, columns, view models and group
//! expansion state. Every mutation re-runs the whole pipeline synchronously
//! (merge columns, filter, sort, then pivot or group or pass-through), so
//! `view()` always reflects the current state.

use rustc_hash::{FxHashMap, FxHashSet};

use grid_engine::{
    filter_rows, group_and_flatten_rows, merge_col_def, pivot_rows, sort_rows, to_csv, AggModelItem,
    AggregationType, ColumnDef, ExpansionState, FilterModelItem, GroupModelItem, GroupViewRow,
    PivotModel, PivotOutcome, PivotTable, Row, RowView, SortDirection, SortModelItem, TextMatchMode,
    Value,
};

use crate::error::{GridError, GridResult};
use crate::options::{CsvExport, GridModels, GridOptions, CSV_MIME_TYPE};
use crate::{log_debug, log_info, log_trace, log_warn};

// ============================================================================
// VIEW
// ============================================================================

/// The rows a grid currently displays.
#[derive(Debug, Clone)]
pub enum GridView<R> {
    /// Data rows, interleaved with group markers when grouping is active.
    Rows(Vec<RowView<R>>),
    /// A pivot cross-tab; it brings its own columns.
    Pivot(PivotTable),
}

impl<R> GridView<R> {
    pub fn is_pivot(&self) -> bool {
        matches!(self, GridView::Pivot(_))
    }

    pub fn rows(&self) -> Option<&[RowView<R>]> {
        match self {
            GridView::Rows(rows) => Some(rows),
            GridView::Pivot(_) => None,
        }
    }

    pub fn pivot(&self) -> Option<&PivotTable> {
        match self {
            GridView::Pivot(table) => Some(table),
            GridView::Rows(_) => None,
        }
    }

    /// Number of displayed rows, group markers included.
    pub fn len(&self) -> usize {
        match self {
            GridView::Rows(rows) => rows.len(),
            GridView::Pivot(table) => table.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// EXPANSION TRACKING
// ============================================================================

/// Group expansion state across recomputations.
///
/// A path the grid has never emitted counts as expanded and is remembered as
/// expanded once emitted. A path the caller collapses stays collapsed until
/// it is expanded again or the state is cleared.
#[derive(Debug, Default)]
struct ExpansionTracker {
    expanded: FxHashSet<String>,
    seen: FxHashSet<String>,
}

impl ExpansionTracker {
    fn clear(&mut self) {
        self.expanded.clear();
        self.seen.clear();
    }

    fn record(&mut self, paths: &[String]) {
        for path in paths {
            if self.seen.insert(path.clone()) {
                self.expanded.insert(path.clone());
            }
        }
    }

    /// Flips the effective state, so an unseen (expanded) path collapses.
    fn toggle(&mut self, path: &str) {
        let was_expanded = self.is_expanded(path);
        self.seen.insert(path.to_string());
        if was_expanded {
            self.expanded.remove(path);
        } else {
            self.expanded.insert(path.to_string());
        }
    }

    /// Makes exactly `paths` expanded among every path seen so far.
    fn replace<I: IntoIterator<Item = String>>(&mut self, paths: I) {
        self.expanded = paths.into_iter().collect();
        self.seen.extend(self.expanded.iter().cloned());
    }

    fn sorted(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.expanded.iter().cloned().collect();
        paths.sort();
        paths
    }
}

impl ExpansionState for ExpansionTracker {
    fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path) || !self.seen.contains(path)
    }
}

// ============================================================================
// GRID API
// ============================================================================

/// One grid: its data, configuration, view models and computed view.
pub struct GridApi<R> {
    options: GridOptions<R>,
    column_defs: Vec<ColumnDef<R>>,
    merged_cols: Vec<ColumnDef<R>>,
    row_data: Vec<R>,
    sort_model: Vec<SortModelItem>,
    filter_model: Vec<FilterModelItem>,
    group_model: Vec<GroupModelItem>,
    pivot_model: PivotModel,
    expansion: ExpansionTracker,
    /// Text match mode chosen per column, reused by later filter edits.
    filter_modes: FxHashMap<String, TextMatchMode>,
    view: GridView<R>,
}

impl<R: Row + Clone> Default for GridApi<R> {
    fn default() -> Self {
        Self::new(GridOptions::default())
    }
}

impl<R: Row + Clone> GridApi<R> {
    pub fn new(options: GridOptions<R>) -> Self {
        GridApi {
            options,
            column_defs: Vec::new(),
            merged_cols: Vec::new(),
            row_data: Vec::new(),
            sort_model: Vec::new(),
            filter_model: Vec::new(),
            group_model: Vec::new(),
            pivot_model: PivotModel::default(),
            expansion: ExpansionTracker::default(),
            filter_modes: FxHashMap::default(),
            view: GridView::Rows(Vec::new()),
        }
    }

    /// A grid over `rows` and `cols` with default options.
    pub fn with_data(cols: Vec<ColumnDef<R>>, rows: Vec<R>) -> Self {
        let mut api = Self::default();
        api.column_defs = cols;
        api.row_data = rows;
        api.recompute();
        api
    }

    // ------------------------------------------------------------------------
    // Setters and getters
    // ------------------------------------------------------------------------

    pub fn options(&self) -> &GridOptions<R> {
        &self.options
    }

    pub fn set_options(&mut self, options: GridOptions<R>) {
        self.options = options;
        self.recompute();
    }

    pub fn set_row_data(&mut self, rows: Vec<R>) {
        self.row_data = rows;
        self.recompute();
    }

    pub fn row_data(&self) -> &[R] {
        &self.row_data
    }

    pub fn set_column_defs(&mut self, cols: Vec<ColumnDef<R>>) {
        self.column_defs = cols;
        self.recompute();
    }

    /// The column definitions as supplied, before defaults are merged in.
    pub fn column_defs(&self) -> &[ColumnDef<R>] {
        &self.column_defs
    }

    pub fn set_sort_model(&mut self, model: Vec<SortModelItem>) {
        self.sort_model = model;
        self.recompute();
    }

    pub fn sort_model(&self) -> &[SortModelItem] {
        &self.sort_model
    }

    pub fn set_filter_model(&mut self, model: Vec<FilterModelItem>) {
        self.filter_model = model;
        self.recompute();
    }

    pub fn filter_model(&self) -> &[FilterModelItem] {
        &self.filter_model
    }

    pub fn set_group_model(&mut self, model: Vec<GroupModelItem>) {
        self.group_model = model;
        self.recompute();
    }

    pub fn group_model(&self) -> &[GroupModelItem] {
        &self.group_model
    }

    /// Expands exactly `paths` among the groups seen so far. Groups that
    /// first appear later still start expanded.
    pub fn set_expanded_groups<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expansion.replace(paths.into_iter().map(Into::into));
        self.recompute();
    }

    /// Expanded group paths, sorted.
    pub fn expanded_groups(&self) -> Vec<String> {
        self.expansion.sorted()
    }

    pub fn set_pivot_model(&mut self, model: PivotModel) {
        self.pivot_model = model;
        self.recompute();
    }

    pub fn pivot_model(&self) -> &PivotModel {
        &self.pivot_model
    }

    // ------------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------------

    pub fn view(&self) -> &GridView<R> {
        &self.view
    }

    /// Column definitions with the grid defaults merged in. A pivoted view
    /// renders with its own generated columns instead.
    pub fn columns(&self) -> &[ColumnDef<R>] {
        &self.merged_cols
    }

    /// Displayed data rows, group markers excluded. Empty while pivoted.
    pub fn leaf_rows(&self) -> Vec<&R> {
        match &self.view {
            GridView::Rows(rows) => rows.iter().filter_map(RowView::as_data).collect(),
            GridView::Pivot(_) => Vec::new(),
        }
    }

    /// Renders the current view as CSV: the displayed data rows under the
    /// merged columns, or the pivot rows under their generated columns.
    pub fn export_csv(&self, filename: Option<&str>) -> CsvExport {
        let filename = filename
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.options.export_file_name)
            .to_string();

        let content = match &self.view {
            GridView::Pivot(table) => to_csv(&table.rows, &table.dynamic_cols),
            GridView::Rows(_) => {
                let leaves: Vec<R> = self.leaf_rows().into_iter().cloned().collect();
                to_csv(&leaves, &self.merged_cols)
            }
        };

        log_info!("EXPORT", "export_csv file={} bytes={}", filename, content.len());
        CsvExport {
            filename,
            mime: CSV_MIME_TYPE.to_string(),
            content,
        }
    }

    // ------------------------------------------------------------------------
    // Sorting
    // ------------------------------------------------------------------------

    /// Header-click sorting: unsorted, then ascending, then descending, then
    /// unsorted again. Without `multi` (or the grid's `multi_sort` option)
    /// the clicked column becomes the only sort key. Non-sortable columns
    /// ignore the click.
    pub fn toggle_sort(&mut self, col_id: &str, multi: bool) -> GridResult<()> {
        if !self.require_column(col_id)?.is_sortable() {
            log_debug!("SORT", "ignoring sort click on non-sortable column '{}'", col_id);
            return Ok(());
        }

        let multi = multi || self.options.multi_sort;
        let current = self.sort_model.iter().position(|item| item.col_id == col_id);
        let next_direction = match current.map(|i| self.sort_model[i].sort) {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        };

        let mut next = if multi { self.sort_model.clone() } else { Vec::new() };
        let slot = if multi { current } else { None };
        match (slot, next_direction) {
            (Some(i), Some(sort)) => next[i].sort = sort,
            (Some(i), None) => {
                next.remove(i);
            }
            (None, Some(sort)) => next.push(SortModelItem::new(col_id, sort)),
            (None, None) => {}
        }

        self.sort_model = next;
        self.recompute();
        Ok(())
    }

    pub fn sort_asc(&mut self, col_id: &str) -> GridResult<()> {
        self.sort_first(col_id, SortDirection::Asc)
    }

    pub fn sort_desc(&mut self, col_id: &str) -> GridResult<()> {
        self.sort_first(col_id, SortDirection::Desc)
    }

    /// Moves the column to the front of the sort model with `sort`.
    fn sort_first(&mut self, col_id: &str, sort: SortDirection) -> GridResult<()> {
        self.require_column(col_id)?;
        self.sort_model.retain(|item| item.col_id != col_id);
        self.sort_model.insert(0, SortModelItem::new(col_id, sort));
        self.recompute();
        Ok(())
    }

    pub fn clear_sort(&mut self, col_id: &str) -> GridResult<()> {
        self.require_column(col_id)?;
        self.sort_model.retain(|item| item.col_id != col_id);
        self.recompute();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------------

    /// Replaces the column's filter with `[value, value_to]`. Both blank
    /// removes it. The filter type follows the column's filter kind and the
    /// match mode is the one last chosen for the column, else the column's
    /// own, else `contains`.
    pub fn set_column_filter(
        &mut self,
        col_id: &str,
        value: impl Into<Value>,
        value_to: impl Into<Value>,
    ) -> GridResult<()> {
        let col = self.require_column(col_id)?;
        let filter_type = col.filter.as_ref().and_then(|f| f.kind());
        let match_mode = self
            .filter_modes
            .get(col_id)
            .copied()
            .or(col.filter_match_mode)
            .unwrap_or_default();

        let value = value.into();
        let value_to = value_to.into();
        self.filter_model.retain(|item| item.col_id != col_id);
        if !(value.is_blank() && value_to.is_blank()) {
            self.filter_model.push(FilterModelItem {
                col_id: col_id.to_string(),
                filter_type,
                value,
                value_to,
                match_mode: Some(match_mode),
            });
        }

        self.recompute();
        Ok(())
    }

    /// Remembers `mode` for the column and reapplies its current filter.
    pub fn set_text_match_mode(&mut self, col_id: &str, mode: TextMatchMode) -> GridResult<()> {
        self.require_column(col_id)?;
        self.filter_modes.insert(col_id.to_string(), mode);

        let (value, value_to) = self
            .filter_model
            .iter()
            .find(|item| item.col_id == col_id)
            .map(|item| (item.value.clone(), item.value_to.clone()))
            .unwrap_or_default();
        self.set_column_filter(col_id, value, value_to)
    }

    pub fn clear_filter_for(&mut self, col_id: &str) -> GridResult<()> {
        self.require_column(col_id)?;
        self.filter_model.retain(|item| item.col_id != col_id);
        self.recompute();
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.filter_model.clear();
        self.recompute();
    }

    // ------------------------------------------------------------------------
    // Grouping
    // ------------------------------------------------------------------------

    /// Adds the column as the innermost grouping level, or removes it if it
    /// already groups.
    pub fn toggle_group(&mut self, col_id: &str) -> GridResult<()> {
        self.require_column(col_id)?;
        match self.group_model.iter().position(|item| item.col_id == col_id) {
            Some(i) => {
                self.group_model.remove(i);
            }
            None => self.group_model.push(GroupModelItem::new(col_id)),
        }
        if self.group_model.is_empty() {
            self.expansion.clear();
        }
        self.recompute();
        Ok(())
    }

    pub fn clear_groups(&mut self) {
        self.group_model.clear();
        self.expansion.clear();
        self.recompute();
    }

    pub fn is_grouped(&self, col_id: &str) -> bool {
        self.group_model.iter().any(|item| item.col_id == col_id)
    }

    /// Flips one group between expanded and collapsed.
    pub fn toggle_group_expanded(&mut self, path: &str) {
        self.expansion.toggle(path);
        log_trace!("GROUP", "toggled '{}' expanded={}", path, self.expansion.is_expanded(path));
        self.recompute();
    }

    pub fn is_group_expanded(&self, path: &str) -> bool {
        self.expansion.is_expanded(path)
    }

    /// The group's aggregate for a column, or empty text when the column is
    /// not aggregated.
    pub fn group_agg(&self, group: &GroupViewRow, col_id: &str) -> Value {
        group
            .agg
            .get(col_id)
            .cloned()
            .unwrap_or_else(|| Value::Text(String::new()))
    }

    /// One aggregation per merged column: the column's own function, else
    /// `sum` when the first row holds a number in it, else `count`.
    pub fn build_agg_model(&self) -> Vec<AggModelItem> {
        let sample = self.row_data.first();
        self.merged_cols
            .iter()
            .map(|col| {
                let agg_func = col.agg_func.clone().unwrap_or_else(|| {
                    let agg = match sample {
                        Some(row) if col.value_of(row).is_number() => AggregationType::Sum,
                        _ => AggregationType::Count,
                    };
                    agg.into()
                });
                AggModelItem {
                    col_id: col.col_id().to_string(),
                    agg_func,
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Pivoting
    // ------------------------------------------------------------------------

    /// Adds the column as a pivot value column (with its own aggregation, or
    /// `sum`), or removes it if present.
    pub fn toggle_value_col(&mut self, col_id: &str) -> GridResult<()> {
        let agg_func = self
            .require_column(col_id)?
            .agg_func
            .clone()
            .unwrap_or_else(|| AggregationType::Sum.into());

        let value_cols = &mut self.pivot_model.value_cols;
        match value_cols.iter().position(|item| item.col_id == col_id) {
            Some(i) => {
                value_cols.remove(i);
            }
            None => value_cols.push(AggModelItem::new(col_id, agg_func)),
        }
        self.recompute();
        Ok(())
    }

    pub fn set_pivot_enabled(&mut self, enabled: bool) {
        self.pivot_model.enabled = enabled;
        self.recompute();
    }

    /// Sets the pivot column; `None` or an empty id clears it.
    pub fn set_pivot_col(&mut self, col_id: Option<&str>) -> GridResult<()> {
        let col_id = col_id.filter(|id| !id.is_empty());
        if let Some(id) = col_id {
            self.require_column(id)?;
        }
        self.pivot_model.pivot_col = col_id.map(str::to_string);
        self.recompute();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Model snapshots
    // ------------------------------------------------------------------------

    pub fn models(&self) -> GridModels {
        GridModels {
            sort_model: self.sort_model.clone(),
            filter_model: self.filter_model.clone(),
            group_model: self.group_model.clone(),
            pivot_model: self.pivot_model.clone(),
            expanded_groups: self.expansion.sorted(),
        }
    }

    pub fn set_models(&mut self, models: GridModels) {
        self.sort_model = models.sort_model;
        self.filter_model = models.filter_model;
        self.group_model = models.group_model;
        self.pivot_model = models.pivot_model;
        self.expansion.replace(models.expanded_groups);
        self.recompute();
    }

    /// Serializes every view model. Fails when a value column uses a custom
    /// aggregation function.
    pub fn models_json(&self) -> GridResult<String> {
        Ok(serde_json::to_string(&self.models())?)
    }

    pub fn load_models_json(&mut self, json: &str) -> GridResult<()> {
        let models: GridModels = serde_json::from_str(json)?;
        log_info!(
            "GRID",
            "loaded models sort={} filter={} group={} pivot={}",
            models.sort_model.len(),
            models.filter_model.len(),
            models.group_model.len(),
            models.pivot_model.is_active()
        );
        self.set_models(models);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    fn require_column(&self, col_id: &str) -> GridResult<&ColumnDef<R>> {
        self.merged_cols
            .iter()
            .rev()
            .find(|col| col.col_id() == col_id)
            .ok_or_else(|| {
                log_warn!("GRID", "unknown column '{}'", col_id);
                GridError::UnknownColumn(col_id.to_string())
            })
    }

    fn recompute(&mut self) {
        let defaults = self.options.default_col_def.as_ref();
        self.merged_cols = self
            .column_defs
            .iter()
            .map(|col| merge_col_def(col, defaults))
            .collect();

        let filtered = filter_rows(&self.row_data, &self.merged_cols, &self.filter_model);
        let mut rows = sort_rows(&filtered, &self.merged_cols, &self.sort_model);

        if self.pivot_model.is_active() {
            match pivot_rows(&rows, &self.merged_cols, &self.pivot_model, None) {
                PivotOutcome::Pivoted(table) => {
                    self.expansion.clear();
                    log_debug!(
                        "GRID",
                        "recompute: pivot rows={} cols={}",
                        table.rows.len(),
                        table.dynamic_cols.len()
                    );
                    self.view = GridView::Pivot(table);
                    return;
                }
                PivotOutcome::Passthrough(passed) => rows = passed,
            }
        }

        if !self.group_model.is_empty() {
            let agg_model = self.build_agg_model();
            let grouped = group_and_flatten_rows(
                &rows,
                &self.merged_cols,
                &self.group_model,
                &agg_model,
                Some(&self.expansion),
            );
            self.expansion.record(&grouped.paths);
            log_debug!(
                "GRID",
                "recompute: grouped rows={} view={} groups={}",
                rows.len(),
                grouped.flat.len(),
                grouped.paths.len()
            );
            self.view = GridView::Rows(grouped.flat);
        } else {
            self.expansion.clear();
            log_debug!("GRID", "recompute: rows={} of {}", rows.len(), self.row_data.len());
            self.view = GridView::Rows(rows.into_iter().map(RowView::Data).collect());
        }
    }
}
