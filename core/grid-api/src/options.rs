//! FILENAME: core/grid-api/src/options.rs
//! Grid configuration and the serializable model snapshot.

use std::fmt;

use grid_engine::{ColumnDefaults, FilterModelItem, GroupModelItem, PivotModel, SortModelItem};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EXPORT_FILE_NAME: &str = "grid-export.csv";

pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8;";

// ============================================================================
// OPTIONS
// ============================================================================

/// Grid-wide settings.
pub struct GridOptions<R> {
    /// Fills in every property a column definition leaves unset.
    pub default_col_def: Option<ColumnDefaults<R>>,
    /// Header clicks add to the sort model instead of replacing it.
    pub multi_sort: bool,
    /// File name used when an export does not name one.
    pub export_file_name: String,
}

impl<R> GridOptions<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_col_def(mut self, defaults: ColumnDefaults<R>) -> Self {
        self.default_col_def = Some(defaults);
        self
    }

    pub fn with_multi_sort(mut self, multi_sort: bool) -> Self {
        self.multi_sort = multi_sort;
        self
    }

    pub fn with_export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = name.into();
        self
    }
}

impl<R> Default for GridOptions<R> {
    fn default() -> Self {
        GridOptions {
            default_col_def: None,
            multi_sort: false,
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl<R> Clone for GridOptions<R> {
    fn clone(&self) -> Self {
        GridOptions {
            default_col_def: self.default_col_def.clone(),
            multi_sort: self.multi_sort,
            export_file_name: self.export_file_name.clone(),
        }
    }
}

impl<R> fmt::Debug for GridOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridOptions")
            .field("default_col_def", &self.default_col_def)
            .field("multi_sort", &self.multi_sort)
            .field("export_file_name", &self.export_file_name)
            .finish()
    }
}

// ============================================================================
// MODEL SNAPSHOT
// ============================================================================

/// Every view model of a grid in one document, for saving and restoring a
/// view. Missing fields load as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridModels {
    #[serde(default)]
    pub sort_model: Vec<SortModelItem>,

    #[serde(default)]
    pub filter_model: Vec<FilterModelItem>,

    #[serde(default)]
    pub group_model: Vec<GroupModelItem>,

    #[serde(default)]
    pub pivot_model: PivotModel,

    #[serde(default)]
    pub expanded_groups: Vec<String>,
}

// ============================================================================
// EXPORT
// ============================================================================

/// A rendered CSV export, ready for the host to save or download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub mime: String,
    pub content: String,
}
