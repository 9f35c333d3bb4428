//! Custom error types for the data-mining pipeline.
//!
//! One `thiserror` hierarchy covers the whole pipeline. Plan-validation
//! errors (`UnknownTable`, `UnknownColumn`, `TypeMismatch`) carry enough
//! context (table, column, operator) to fix a query plan without re-running
//! it. Runtime data issues (nulls, zero denominators) are never errors;
//! they propagate as null values instead.

use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A raw dataset source could not be read (missing file, network
    /// failure, permission).
    #[error("Source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Two distinct source columns normalize to the same lowercase name.
    #[error("Column name collision in table '{table}': '{name}'")]
    NameCollision { table: String, name: String },

    /// A cleaned table was requested from the store but no artifact exists.
    #[error("Table '{0}' not found in store")]
    NotFound(String),

    /// A query plan references a table absent from the supplied table set.
    #[error("Query plan references unknown table '{table}' in {operator}")]
    UnknownTable { table: String, operator: String },

    /// A query plan references a column absent from the joined schema.
    #[error("Query plan references unknown column '{column}' in {operator} (table scope: {table})")]
    UnknownColumn {
        table: String,
        column: String,
        operator: String,
    },

    /// Arithmetic or ordered comparison attempted on a non-numeric column.
    #[error("Type mismatch in {operator}: column '{column}' has type {dtype}, expected numeric")]
    TypeMismatch {
        column: String,
        operator: String,
        dtype: String,
    },

    /// A result or store artifact could not be written.
    #[error("Failed to write '{path}': {reason}")]
    WriteFailure { path: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error (remote dataset sources).
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, used by the run report and CLI output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            Self::NameCollision { .. } => "NAME_COLLISION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::UnknownTable { .. } => "UNKNOWN_TABLE",
            Self::UnknownColumn { .. } => "UNKNOWN_COLUMN",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::WriteFailure { .. } => "WRITE_FAILURE",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check whether this error came from static plan validation.
    pub fn is_plan_error(&self) -> bool {
        match self {
            Self::UnknownTable { .. } | Self::UnknownColumn { .. } | Self::TypeMismatch { .. } => {
                true
            }
            Self::WithContext { source, .. } => source.is_plan_error(),
            _ => false,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}
