//! FILENAME: core/grid-api/src/lib.rs
//! Grid facade over `grid-engine`.
//!
//! Holds the state of one grid (rows, columns, view models, expansion) and
//! recomputes its view after every change. The engine stays pure; all
//! mutable state lives here in `GridApi`.
//!
//! Layers:
//! - `options`: Grid configuration, model snapshots, export payloads
//! - `api`: The stateful facade and its recompute pipeline
//! - `error`: Facade errors
//! - `logging`: Category-tagged logging macros

pub mod logging;
pub mod error;
pub mod options;
pub mod api;

pub use api::{GridApi, GridView};
pub use error::{GridError, GridResult};
pub use options::{CsvExport, GridModels, GridOptions, CSV_MIME_TYPE, DEFAULT_EXPORT_FILE_NAME};

pub use grid_engine;
