// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_MAX_THREADS, DEFAULT_OUTPUT_DIR, DEFAULT_REPEATS, DEFAULT_TOTAL_OPS,
    DEFAULT_VARIANTS, MAX_THREADS_LIMIT, NUM_ACTION_KINDS,
};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BenchConfig {
    /// Operations per (variant, thread-count) cell, split across that cell's workers.
    #[serde(default = "default_total_ops")]
    pub total_ops: usize,

    /// Thread counts 1..=max_threads are measured for every variant.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    /// Timed trials per cell.
    #[serde(default = "default_repeats")]
    pub repeats: usize,

    /// Directory the workload files are written to and read back from.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Seed for workload generation. When omitted every run draws fresh workloads
    /// from OS entropy; when set, every file is reproducible.
    #[serde(default)]
    pub seed: Option<u64>,

    /// What to do about unreadable files, malformed lines and bad field indices
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Workload mixes. Defaults to the three built-in variants A, B and C.
    #[serde(default = "default_variants")]
    pub variants: Vec<VariantSpec>,
}

fn default_total_ops() -> usize {
    DEFAULT_TOTAL_OPS
}

fn default_max_threads() -> usize {
    DEFAULT_MAX_THREADS
}

fn default_repeats() -> usize {
    DEFAULT_REPEATS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_variants() -> Vec<VariantSpec> {
    DEFAULT_VARIANTS
        .iter()
        .map(|(tag, weights)| VariantSpec {
            tag: tag.to_string(),
            weights: weights.to_vec(),
        })
        .collect()
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            total_ops: default_total_ops(),
            max_threads: default_max_threads(),
            repeats: default_repeats(),
            output_dir: default_output_dir(),
            seed: None,
            error_policy: ErrorPolicy::default(),
            variants: default_variants(),
        }
    }
}

/// Handling of invalid input during a run
///
/// `BestEffort` keeps the run going: unreadable files are logged and treated as empty,
/// malformed lines are skipped, out-of-range fields read as 0 and ignore writes.
/// `Strict` turns each of those into an error that stops the run.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    #[default]
    BestEffort,
    Strict,
}

impl ErrorPolicy {
    pub fn is_strict(self) -> bool {
        self == ErrorPolicy::Strict
    }
}

/// One workload mix: a tag used in file names and the report, plus relative weights
/// for read 0, write 0, read 1, write 1 and snapshot (in that order).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VariantSpec {
    pub tag: String,
    pub weights: Vec<f64>,
}

impl VariantSpec {
    pub fn validate(&self) -> Result<()> {
        if self.tag.is_empty() {
            bail!("variant tag must not be empty");
        }
        if self.tag.contains(['/', '\\']) || self.tag.chars().any(char::is_whitespace) {
            bail!("variant tag '{}' must not contain path separators or whitespace", self.tag);
        }
        if self.weights.len() != NUM_ACTION_KINDS {
            bail!(
                "variant '{}' has {} weights, expected {} (read 0, write 0, read 1, write 1, snapshot)",
                self.tag,
                self.weights.len(),
                NUM_ACTION_KINDS
            );
        }
        if let Some(w) = self.weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            bail!("variant '{}' has invalid weight {}", self.tag, w);
        }
        if self.weights.iter().sum::<f64>() <= 0.0 {
            bail!("variant '{}' weights must not all be zero", self.tag);
        }
        Ok(())
    }
}

impl BenchConfig {
    /// Read and validate a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        Self::from_yaml_str(&buf).with_context(|| format!("parse {}", path.display()))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: BenchConfig = serde_yaml::from_str(yaml).context("invalid config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_ops == 0 {
            bail!("total_ops must be at least 1");
        }
        if self.max_threads == 0 {
            bail!("max_threads must be at least 1");
        }
        if self.max_threads > MAX_THREADS_LIMIT {
            bail!(
                "max_threads {} exceeds the limit of {}",
                self.max_threads,
                MAX_THREADS_LIMIT
            );
        }
        if self.repeats == 0 {
            bail!("repeats must be at least 1");
        }
        if self.variants.is_empty() {
            bail!("at least one variant is required");
        }
        for (i, v) in self.variants.iter().enumerate() {
            v.validate()?;
            if self.variants[..i].iter().any(|other| other.tag == v.tag) {
                bail!("duplicate variant tag '{}'", v.tag);
            }
        }
        Ok(())
    }

    /// Total number of timed trials the run will perform
    pub fn total_trials(&self) -> u64 {
        (self.variants.len() as u64)
            .saturating_mul(self.max_threads as u64)
            .saturating_mul(self.repeats as u64)
    }
}
