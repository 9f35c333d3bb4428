//! Data-Mining Pipeline for US Higher-Education Datasets
//!
//! Loads five flat tabular datasets (tuition cost, salary potential,
//! diversity, historical tuition, tuition by income), cleans them with a
//! fixed per-table policy, and runs a battery of declarative relational
//! queries whose results are persisted as CSV artifacts.
//!
//! # Overview
//!
//! The pipeline is a straight line of explicit stages:
//!
//! - **Loader**: raw CSV (local path or URL) into a typed `DataFrame`
//! - **Cleaner**: de-duplication, lowercase column names, presence flags
//! - **Store**: file-backed cleaned-table artifacts, one per table
//! - **Query Engine**: typed query plans compiled to polars lazy queries
//! - **Result Sink**: one CSV artifact per query result
//!
//! Runs are batch, single-threaded, and best-effort: a failing table or
//! query is logged and reported without aborting the stages that remain.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use campus_processing::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .data_dir("data")
//!     .store_dir("cleaned")
//!     .output_dir("results")
//!     .build()?;
//!
//! let report = Pipeline::new(config).run()?;
//! println!("{} queries failed", report.failed_queries());
//! ```
//!
//! Individual stages are usable on their own; each takes its inputs
//! explicitly rather than reading shared state:
//!
//! ```rust,ignore
//! use campus_processing::{DatasetLoader, Source, TableCleaner, spec_for};
//!
//! let df = DatasetLoader::load(&Source::parse("data/tuition_cost.csv"))?;
//! let (cleaned, report) = TableCleaner::clean(df, spec_for("tuition_cost").unwrap())?;
//! println!("removed {} duplicates", report.duplicates_removed);
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod queries;
pub mod query;
pub mod report;
pub mod sink;
pub mod store;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{CleaningSpec, TableCleaner, dataset_specs, spec_for};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use loader::{DatasetLoader, Source};
pub use pipeline::Pipeline;
pub use query::{
    AggFunc, Aggregate, CmpOp, Derivation, DeriveExpr, Join, Literal, Predicate, QueryEngine,
    QueryPlan, SortKey,
};
pub use report::{CleaningReport, NullStats, QueryOutcome, RunReport};
pub use sink::ResultSink;
pub use store::TableStore;
