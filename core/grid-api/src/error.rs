//! FILENAME: core/grid-api/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GridResult<T> = Result<T, GridError>;
