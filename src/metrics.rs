//! Trial timings and the variant × thread-count results matrix

use std::time::Duration;

/// Timings of the trials for one (variant, thread-count) cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStats {
    pub samples: Vec<Duration>,
}

impl CellStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one trial's elapsed wall-clock time
    pub fn record(&mut self, elapsed: Duration) {
        self.samples.push(elapsed);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Mean elapsed seconds; 0.0 when nothing was recorded
    pub fn mean_secs(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: f64 = self.samples.iter().map(Duration::as_secs_f64).sum();
        total / self.samples.len() as f64
    }

    pub fn min_secs(&self) -> f64 {
        self.samples.iter().min().map_or(0.0, Duration::as_secs_f64)
    }

    pub fn max_secs(&self) -> f64 {
        self.samples.iter().max().map_or(0.0, Duration::as_secs_f64)
    }
}

/// Per-cell statistics indexed `[variant][threads - 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsMatrix {
    pub tags: Vec<String>,
    pub max_threads: usize,
    cells: Vec<Vec<CellStats>>,
}

impl ResultsMatrix {
    pub fn new(tags: Vec<String>, max_threads: usize) -> Self {
        let cells = vec![vec![CellStats::new(); max_threads]; tags.len()];
        Self {
            tags,
            max_threads,
            cells,
        }
    }

    /// Cell for `variant` at `threads` (1-based). Panics when out of range.
    pub fn cell(&self, variant: usize, threads: usize) -> &CellStats {
        &self.cells[variant][threads - 1]
    }

    pub fn cell_mut(&mut self, variant: usize, threads: usize) -> &mut CellStats {
        &mut self.cells[variant][threads - 1]
    }

    pub fn mean_secs(&self, variant: usize, threads: usize) -> f64 {
        self.cell(variant, threads).mean_secs()
    }

    /// Rows of `(tag, per-thread-count cells)` in variant order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[CellStats])> {
        self.tags
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(Vec::as_slice))
    }
}
