//! Data cleaning for the raw datasets.
//!
//! The cleaner applies a fixed per-table transformation, in order:
//!
//! 1. Remove exact-duplicate rows (identical across all columns), keeping
//!    the first occurrence.
//! 2. Rename all columns to lowercase; two distinct source columns folding
//!    to the same name is an error.
//! 3. Append a boolean `has_<col>_data` presence flag for each designated
//!    nullable column. Null values themselves are preserved, never imputed
//!    or dropped.
//!
//! Passthrough tables skip all three steps and are copied unchanged.

mod spec;

pub use spec::{CleaningSpec, dataset_specs, spec_for};

use crate::error::{PipelineError, Result};
use crate::report::{CleaningReport, NullStats};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Applies the fixed cleaning transformation to one table.
pub struct TableCleaner;

impl TableCleaner {
    /// Clean a table according to its spec.
    ///
    /// Returns the cleaned table and a [`CleaningReport`] describing the
    /// actions taken. The report is for observability only.
    pub fn clean(df: DataFrame, spec: &CleaningSpec) -> Result<(DataFrame, CleaningReport)> {
        let rows_before = df.height();

        if spec.is_passthrough() {
            debug!("Table '{}' is passthrough, copied unchanged", spec.table);
            let report = CleaningReport {
                table: spec.table.to_string(),
                rows_before,
                rows_after: rows_before,
                duplicates_removed: 0,
                null_stats: Vec::new(),
                passthrough: true,
            };
            return Ok((df, report));
        }

        info!("Cleaning table '{}' ({} rows)", spec.table, rows_before);

        // 1. Exact-duplicate removal, first occurrence wins.
        let mut df = if spec.dedup {
            df.unique_stable(None, UniqueKeepStrategy::First, None)?
        } else {
            df
        };
        let duplicates_removed = rows_before - df.height();
        if duplicates_removed > 0 {
            debug!(
                "Removed {} duplicate rows from '{}'",
                duplicates_removed, spec.table
            );
        }

        // 2. Lowercase column names, refusing silent merges.
        let lowered = Self::lowercase_names(&df, spec.table)?;
        df.set_column_names(lowered)?;

        // 3. Presence flags for designated nullable columns.
        let mut null_stats = Vec::with_capacity(spec.presence_flags.len());
        let rows_after = df.height();
        for col_name in &spec.presence_flags {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::UnknownColumn {
                    table: spec.table.to_string(),
                    column: col_name.to_string(),
                    operator: "presence_flag".to_string(),
                })?;
            let null_count = column.null_count();
            let null_percentage = if rows_after == 0 {
                0.0
            } else {
                (null_count as f64 / rows_after as f64) * 100.0
            };

            let mut flag = column
                .as_materialized_series()
                .is_not_null()
                .into_series();
            flag.rename(format!("has_{col_name}_data").into());
            df.with_column(flag)?;

            null_stats.push(NullStats {
                column: col_name.to_string(),
                null_count,
                null_percentage,
            });
        }

        let report = CleaningReport {
            table: spec.table.to_string(),
            rows_before,
            rows_after,
            duplicates_removed,
            null_stats,
            passthrough: false,
        };

        info!(
            "Cleaned '{}': {} -> {} rows, {} duplicates removed",
            spec.table, rows_before, rows_after, duplicates_removed
        );

        Ok((df, report))
    }

    /// Fold all column names to lowercase, failing on collisions.
    fn lowercase_names(df: &DataFrame, table: &str) -> Result<Vec<String>> {
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut lowered = Vec::with_capacity(df.width());

        for name in df.get_column_names() {
            let lower = name.to_lowercase();
            if let Some(previous) = seen.insert(lower.clone(), name.to_string())
                && previous != name.as_str()
            {
                return Err(PipelineError::NameCollision {
                    table: table.to_string(),
                    name: lower,
                });
            }
            lowered.push(lower);
        }
        Ok(lowered)
    }
}
