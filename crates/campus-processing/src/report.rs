//! Report types produced by the pipeline for observability.
//!
//! Reports carry no downstream effect; they exist so an operator can see
//! what a run did without re-reading the artifacts.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Null statistics for one presence-flagged column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullStats {
    /// Cleaned (lowercase) column name.
    pub column: String,
    /// Number of null values in the cleaned table.
    pub null_count: usize,
    /// Percentage of rows with a null value (0.0 - 100.0).
    pub null_percentage: f64,
}

/// Summary of the actions the cleaner took on one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Table name.
    pub table: String,
    /// Row count before cleaning.
    pub rows_before: usize,
    /// Row count after cleaning.
    pub rows_after: usize,
    /// Exact-duplicate rows removed.
    pub duplicates_removed: usize,
    /// Per presence-flagged column null statistics.
    pub null_stats: Vec<NullStats>,
    /// True when the table was copied unchanged.
    pub passthrough: bool,
}

impl CleaningReport {
    /// Percentage of rows removed as duplicates.
    pub fn duplicates_removed_percentage(&self) -> f64 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.duplicates_removed as f64 / self.rows_before as f64) * 100.0
        }
    }
}

/// Outcome of one query plan in a best-effort batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Query plan name.
    pub name: String,
    /// Result row count, when the query succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Path of the written result artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Error code and message, when the query failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryOutcome {
    pub fn success(name: impl Into<String>, rows: usize, artifact: &Path) -> Self {
        Self {
            name: name.into(),
            rows: Some(rows),
            artifact: Some(artifact.display().to_string()),
            error: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: None,
            artifact: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Full report for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// RFC 3339 timestamp of report generation.
    pub generated_at: String,
    /// Cleaning summaries, one per raw table that was cleaned this run.
    pub cleaning: Vec<CleaningReport>,
    /// Query outcomes, one per executed plan.
    pub queries: Vec<QueryOutcome>,
}

impl RunReport {
    pub fn new(cleaning: Vec<CleaningReport>, queries: Vec<QueryOutcome>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            cleaning,
            queries,
        }
    }

    /// Count of failed queries in this run.
    pub fn failed_queries(&self) -> usize {
        self.queries.iter().filter(|q| !q.is_success()).count()
    }

    /// Write the report as pretty JSON under `dir`.
    pub fn write_to_file(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("run_report.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}
