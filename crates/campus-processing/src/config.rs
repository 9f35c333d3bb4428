//! Configuration types for the pipeline.
//!
//! Uses the builder pattern for flexible and ergonomic setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one pipeline run.
///
/// Use [`PipelineConfig::builder()`] to create a configuration with a
/// fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use campus_processing::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .data_dir("data")
///     .store_dir("cleaned")
///     .output_dir("results")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory containing the raw CSV datasets.
    /// Default: "data"
    pub data_dir: PathBuf,

    /// Directory holding the cleaned-table artifacts (the store).
    /// Default: "cleaned"
    pub store_dir: PathBuf,

    /// Directory for query result artifacts.
    /// Default: "results"
    pub output_dir: PathBuf,

    /// Decimal precision applied to floats when writing result CSVs.
    /// Rounding happens at presentation time only, never during
    /// aggregation. Default: 2
    pub float_precision: usize,

    /// Re-run cleaning even when a cleaned artifact already exists.
    /// Default: false
    pub force_clean: bool,

    /// Only run query plans whose names appear here. Empty means all.
    /// Default: empty
    pub query_filter: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            store_dir: PathBuf::from("cleaned"),
            output_dir: PathBuf::from("results"),
            float_precision: 2,
            force_clean: false,
            query_filter: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.float_precision > 12 {
            return Err(ConfigValidationError::InvalidFloatPrecision(
                self.float_precision,
            ));
        }
        if self.store_dir == self.output_dir {
            return Err(ConfigValidationError::OverlappingDirs(
                self.store_dir.clone(),
            ));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid float precision: {0} (must be at most 12)")]
    InvalidFloatPrecision(usize),

    #[error("Store and output directories must differ, both are {0:?}")]
    OverlappingDirs(PathBuf),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    data_dir: Option<PathBuf>,
    store_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    float_precision: Option<usize>,
    force_clean: Option<bool>,
    query_filter: Option<Vec<String>>,
}

impl PipelineConfigBuilder {
    /// Set the directory containing raw CSV datasets.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Set the cleaned-table store directory.
    pub fn store_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_dir = Some(path.into());
        self
    }

    /// Set the query result output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the float precision used when writing result CSVs.
    pub fn float_precision(mut self, digits: usize) -> Self {
        self.float_precision = Some(digits);
        self
    }

    /// Re-clean raw tables even when cleaned artifacts already exist.
    pub fn force_clean(mut self, force: bool) -> Self {
        self.force_clean = Some(force);
        self
    }

    /// Restrict the run to the named query plans.
    pub fn query_filter(mut self, names: Vec<String>) -> Self {
        self.query_filter = Some(names);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            data_dir: self.data_dir.unwrap_or_else(|| PathBuf::from("data")),
            store_dir: self.store_dir.unwrap_or_else(|| PathBuf::from("cleaned")),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("results")),
            float_precision: self.float_precision.unwrap_or(2),
            force_clean: self.force_clean.unwrap_or(false),
            query_filter: self.query_filter.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}
