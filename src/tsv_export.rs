//! TSV export for machine-readable benchmark results

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::ErrorPolicy;
use crate::driver::tolerate;
use crate::metrics::ResultsMatrix;

const HEADER: &str =
    "variant\tthreads\ttotal_ops\trepeats\tmean_secs\tmin_secs\tmax_secs\tops_per_sec";

/// TSV exporter for benchmark results
pub struct TsvExporter {
    basename: String,
}

impl TsvExporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            basename: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// `<basename>-results.tsv`
    pub fn results_path(&self) -> PathBuf {
        PathBuf::from(format!("{}-results.tsv", self.basename))
    }

    /// Write one row per (variant, thread-count) cell, in report order
    pub fn export_results(&self, results: &ResultsMatrix, total_ops: usize) -> Result<PathBuf> {
        let path = self.results_path();
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut f = BufWriter::new(file);

        writeln!(f, "{}", HEADER)?;
        for row in rows(results, total_ops) {
            writeln!(f, "{}", row)?;
        }
        f.flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;

        println!("\nTSV results exported to: {}", path.display());
        Ok(path)
    }

    /// Export under an error policy: a failed write is logged and yields `None`
    /// unless the policy is strict. The table on stdout is already complete.
    pub fn export_with_policy(
        &self,
        results: &ResultsMatrix,
        total_ops: usize,
        policy: ErrorPolicy,
    ) -> Result<Option<PathBuf>> {
        tolerate(policy, self.export_results(results, total_ops))
    }
}

fn rows(results: &ResultsMatrix, total_ops: usize) -> Vec<String> {
    let mut out = Vec::new();
    for (tag, cells) in results.rows() {
        for (i, cell) in cells.iter().enumerate() {
            let mean = cell.mean_secs();
            let ops_per_sec = if mean > 0.0 { total_ops as f64 / mean } else { 0.0 };
            out.push(format!(
                "{}\t{}\t{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.0}",
                tag,
                i + 1,
                total_ops,
                cell.count(),
                mean,
                cell.min_secs(),
                cell.max_secs(),
                ops_per_sec
            ));
        }
    }
    out
}
