//! Dataset loader: reads a raw CSV resource into a DataFrame.
//!
//! Sources are local paths or HTTP(S) URLs. Column types are inferred over
//! the whole file: a column is integer if every non-null value parses as an
//! integer literal, float if every non-null value parses as a decimal,
//! boolean for the true/false vocabulary, otherwise string. Inference
//! problems fall back to a more permissive read instead of failing the load.

use crate::error::{PipelineError, Result};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A raw dataset source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Local CSV file.
    Path(PathBuf),
    /// Remote CSV resource, fetched over HTTP(S).
    Url(String),
}

impl Source {
    /// Classify a raw source string as a URL or a local path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Source::Url(raw.to_string())
        } else {
            Source::Path(PathBuf::from(raw))
        }
    }

    fn describe(&self) -> String {
        match self {
            Source::Path(p) => p.display().to_string(),
            Source::Url(u) => u.clone(),
        }
    }
}

/// Loads raw CSV datasets into memory.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a CSV resource into a DataFrame.
    ///
    /// Fails with [`PipelineError::SourceUnavailable`] if the resource
    /// cannot be read.
    pub fn load(source: &Source) -> Result<DataFrame> {
        match source {
            Source::Path(path) => Self::load_path(path),
            Source::Url(url) => Self::load_url(url),
        }
    }

    fn load_path(path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(PipelineError::SourceUnavailable {
                source_name: path.display().to_string(),
                reason: "file not found".to_string(),
            });
        }

        info!("Loading dataset from: {}", path.display());
        Self::read_with_fallbacks(path)
    }

    fn load_url(url: &str) -> Result<DataFrame> {
        info!("Fetching dataset from: {}", url);

        let unavailable = |reason: String| PipelineError::SourceUnavailable {
            source_name: url.to_string(),
            reason,
        };

        let response = reqwest::blocking::get(url).map_err(|e| unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP status {}", response.status())));
        }
        let body = response.bytes().map_err(|e| unavailable(e.to_string()))?;

        let df = CsvReadOptions::default()
            .with_infer_schema_length(None)
            .with_has_header(true)
            .into_reader_with_file_handle(Cursor::new(body.to_vec()))
            .finish()?;
        debug!("Fetched remote dataset: {:?}", df.shape());
        Ok(df)
    }

    /// Read a local CSV with multiple fallback strategies.
    ///
    /// Strategy 1 reads with strict quote handling and whole-file schema
    /// inference. Strategy 2 drops the quote character. Strategy 3 pre-cleans
    /// the raw content (stray quotes, blank lines) and reads from a buffer.
    fn read_with_fallbacks(path: &Path) -> Result<DataFrame> {
        match CsvReadOptions::default()
            .with_infer_schema_length(None)
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
        {
            Ok(df) => return Ok(df),
            Err(e) => debug!("Standard loading failed: {}", e),
        }

        match CsvReadOptions::default()
            .with_infer_schema_length(None)
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_quote_char(None))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
        {
            Ok(df) => return Ok(df),
            Err(e) => debug!("Loading without quotes failed: {}", e),
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| PipelineError::SourceUnavailable {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let cleaned = clean_csv_content(&content);

        CsvReadOptions::default()
            .with_infer_schema_length(None)
            .with_has_header(true)
            .into_reader_with_file_handle(Cursor::new(cleaned))
            .finish()
            .map_err(PipelineError::from)
    }
}

/// Strip doubled quotes and blank lines from malformed CSV content.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
