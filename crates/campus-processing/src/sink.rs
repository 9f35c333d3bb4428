//! Result sink: persists query result tables as CSV artifacts.
//!
//! Floats are written with a fixed decimal precision so rounding happens
//! at presentation time only; aggregation itself is never rounded.
//! Rerunning with unchanged inputs reproduces identical bytes.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes result tables to uniquely named CSV artifacts.
pub struct ResultSink {
    output_dir: PathBuf,
    float_precision: usize,
}

impl ResultSink {
    /// Create a sink writing under `output_dir`, creating it if needed.
    pub fn new(output_dir: impl Into<PathBuf>, float_precision: usize) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            float_precision,
        })
    }

    /// Write `df` as `<output_dir>/<name>.csv`, overwriting any existing
    /// artifact.
    pub fn save(&self, name: &str, df: &mut DataFrame) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("{name}.csv"));
        let write_failure = |e: String| PipelineError::WriteFailure {
            path: path.display().to_string(),
            reason: e,
        };

        let mut file = File::create(&path).map_err(|e| write_failure(e.to_string()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_float_precision(Some(self.float_precision))
            .finish(df)
            .map_err(|e| write_failure(e.to_string()))?;

        info!(
            "Saved result '{}' ({} rows) to {}",
            name,
            df.height(),
            path.display()
        );
        Ok(path)
    }

    /// Output directory of this sink.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_save_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ResultSink::new(dir.path(), 2).unwrap();
        let mut df = df!(
            "state" => ["Ohio", "Iowa"],
            "avg_cost" => [21000.456f64, 18000.1],
        )
        .unwrap();

        let path = sink.save("avg_cost_by_state", &mut df).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "state,avg_cost");
        // presentation-time rounding to 2 decimals
        assert_eq!(lines.next().unwrap(), "Ohio,21000.46");
        assert_eq!(lines.next().unwrap(), "Iowa,18000.10");
    }

    #[test]
    fn test_save_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ResultSink::new(dir.path(), 2).unwrap();
        let mut df = df!("n" => [1i64, 2]).unwrap();

        let path = sink.save("counts", &mut df).unwrap();
        let first = std::fs::read(&path).unwrap();
        sink.save("counts", &mut df).unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_unwritable_path() {
        let sink = ResultSink {
            output_dir: PathBuf::from("/nonexistent-root-dir/results"),
            float_precision: 2,
        };
        let mut df = df!("n" => [1i64]).unwrap();
        let err = sink.save("counts", &mut df).unwrap_err();
        assert_eq!(err.error_code(), "WRITE_FAILURE");
    }
}
