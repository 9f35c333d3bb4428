//! Cleaned-table store: file-backed persistence for cleaned tables.
//!
//! One CSV artifact per table name. After the cleaning stage, the store is
//! the single source of truth; no downstream component reads raw sources.

use crate::error::{PipelineError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed store for cleaned tables.
pub struct TableStore {
    dir: PathBuf,
}

impl TableStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }

    /// Persist a cleaned table under `name`, overwriting any existing
    /// artifact.
    pub fn put(&self, name: &str, df: &mut DataFrame) -> Result<()> {
        let path = self.path_for(name);
        let mut file = File::create(&path).map_err(|e| PipelineError::WriteFailure {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| PipelineError::WriteFailure {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!("Stored cleaned table '{}' at {}", name, path.display());
        Ok(())
    }

    /// Load a cleaned table by name.
    ///
    /// Fails with [`PipelineError::NotFound`] when no artifact exists.
    pub fn get(&self, name: &str) -> Result<DataFrame> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(PipelineError::NotFound(name.to_string()));
        }
        let df = CsvReadOptions::default()
            .with_infer_schema_length(None)
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path))?
            .finish()?;
        Ok(df)
    }

    /// Check whether a cleaned artifact exists for `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// List the table names currently in the store, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
