use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

/// Errors raised by the dataset loader and the reporting engine.
///
/// Loader plumbing wraps these in `anyhow::Error`; callers use
/// `downcast_ref::<DashboardError>()` to tell fatal startup failures apart
/// from I/O noise.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DashboardError {
    #[error("required file(s) not found: {}", join_paths(.paths))]
    MissingFile { paths: Vec<PathBuf> },

    #[error("'{column}' column not found in {table}")]
    MissingColumn { column: String, table: String },

    #[error("column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl DashboardError {
    pub fn missing_column(column: &str, table: &str) -> Self {
        DashboardError::MissingColumn {
            column: column.to_string(),
            table: table.to_string(),
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
