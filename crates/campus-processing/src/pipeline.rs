//! The batch pipeline: clean every raw table, then run the query battery.
//!
//! Stage semantics are best-effort: one table or query failing is logged
//! and recorded in the run report, and the run continues with the stages
//! that remain. Each stage takes its inputs explicitly; there is no
//! ambient shared environment between stages.

use crate::cleaner::{TableCleaner, dataset_specs};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::loader::{DatasetLoader, Source};
use crate::queries;
use crate::query::{QueryEngine, QueryPlan};
use crate::report::{CleaningReport, QueryOutcome, RunReport};
use crate::sink::ResultSink;
use crate::store::TableStore;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// One batch run over the five datasets.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Execute the full run: cleaning stage, then each query plan.
    pub fn run(&self) -> Result<RunReport> {
        let store = TableStore::new(&self.config.store_dir)?;
        let cleaning = self.clean_stage(&store);
        let tables = self.load_cleaned_tables(&store);
        let queries = self.query_stage(&tables)?;
        Ok(RunReport::new(cleaning, queries))
    }

    /// Clean every raw table whose cleaned artifact is missing (or all of
    /// them under `force_clean`). Failures are logged and skipped.
    fn clean_stage(&self, store: &TableStore) -> Vec<CleaningReport> {
        let mut reports = Vec::new();

        for spec in dataset_specs() {
            if !self.config.force_clean && store.exists(spec.table) {
                debug!("Cleaned artifact for '{}' exists, skipping", spec.table);
                continue;
            }

            let source = Source::Path(self.config.data_dir.join(format!("{}.csv", spec.table)));
            let result = DatasetLoader::load(&source)
                .and_then(|df| TableCleaner::clean(df, spec))
                .and_then(|(mut df, report)| {
                    store.put(spec.table, &mut df)?;
                    Ok(report)
                });

            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(
                        "Cleaning stage failed for '{}' [{}]: {}",
                        spec.table,
                        e.error_code(),
                        e
                    );
                }
            }
        }
        reports
    }

    /// Pull every available cleaned table from the store. Queries against
    /// a table that failed to clean will fail plan validation and be
    /// recorded as such.
    fn load_cleaned_tables(&self, store: &TableStore) -> HashMap<String, DataFrame> {
        let mut tables = HashMap::new();
        for spec in dataset_specs() {
            match store.get(spec.table) {
                Ok(df) => {
                    debug!("Loaded cleaned table '{}': {:?}", spec.table, df.shape());
                    tables.insert(spec.table.to_string(), df);
                }
                Err(e) => warn!("Cleaned table '{}' unavailable: {}", spec.table, e),
            }
        }
        tables
    }

    /// Run each selected plan, saving successes and recording failures.
    fn query_stage(&self, tables: &HashMap<String, DataFrame>) -> Result<Vec<QueryOutcome>> {
        let sink = ResultSink::new(&self.config.output_dir, self.config.float_precision)?;
        let plans = self.selected_plans();
        info!("Running {} query plans", plans.len());

        let mut outcomes = Vec::with_capacity(plans.len());
        for plan in &plans {
            match QueryEngine::run(plan, tables) {
                Ok(mut result) => match sink.save(&plan.name, &mut result) {
                    Ok(path) => {
                        outcomes.push(QueryOutcome::success(&plan.name, result.height(), &path));
                    }
                    Err(e) => {
                        error!("Query '{}' sink failed [{}]: {}", plan.name, e.error_code(), e);
                        outcomes.push(QueryOutcome::failure(
                            &plan.name,
                            format!("{}: {}", e.error_code(), e),
                        ));
                    }
                },
                Err(e) => {
                    error!("Query '{}' failed [{}]: {}", plan.name, e.error_code(), e);
                    outcomes.push(QueryOutcome::failure(
                        &plan.name,
                        format!("{}: {}", e.error_code(), e),
                    ));
                }
            }
        }
        Ok(outcomes)
    }

    fn selected_plans(&self) -> Vec<QueryPlan> {
        let battery = queries::battery();
        if self.config.query_filter.is_empty() {
            return battery;
        }
        let selected: Vec<QueryPlan> = battery
            .into_iter()
            .filter(|p| self.config.query_filter.iter().any(|n| n == &p.name))
            .collect();
        for name in &self.config.query_filter {
            if !selected.iter().any(|p| &p.name == name) {
                warn!("Unknown query name in filter: '{}'", name);
            }
        }
        selected
    }
}
