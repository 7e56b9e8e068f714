//! FILENAME: core/grid-api/src/logging.rs
// PURPOSE: Category-tagged logging macros.

// ============================================================================
// CATEGORY LOGGING
// ============================================================================
//
// Every line is tagged with a category ("GRID", "SORT", "FILTER", "GROUP",
// "PIVOT", "EXPORT") which becomes the `log` target, so a host can route or
// silence one area with its logger's target filters. The engine crate logs
// under the same categories.

#[doc(hidden)]
pub use log as __log;

#[macro_export]
macro_rules! log_trace {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::__log::trace!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::__log::debug!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::__log::info!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::__log::warn!(target: $cat, $($arg)*)
    };
}
