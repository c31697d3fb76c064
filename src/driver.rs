// src/driver.rs
//
// Benchmark driver: partitions the operation budget, writes one workload file per
// worker, then times repeated trials for every (variant, thread-count) cell.
//

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::config::{BenchConfig, ErrorPolicy};
use crate::constants::{WORKLOAD_FILE_EXT, WORKLOAD_FILE_PREFIX};
use crate::engine::measure_time;
use crate::metrics::{CellStats, ResultsMatrix};
use crate::workload::{load_workload, Action, WorkloadGenerator, WorkloadMix};

/// Split `total` operations across `workers`: every worker gets `total / workers`,
/// and the first `total % workers` workers get one more.
pub fn partition(total: usize, workers: usize) -> Vec<usize> {
    if workers == 0 {
        return Vec::new();
    }
    let base = total / workers;
    let remainder = total % workers;
    (0..workers)
        .map(|worker_id| if worker_id < remainder { base + 1 } else { base })
        .collect()
}

/// `input_<tag>_<threads>_<worker>.txt`
pub fn workload_filename(tag: &str, threads: usize, worker: usize) -> String {
    format!(
        "{}_{}_{}_{}.{}",
        WORKLOAD_FILE_PREFIX, tag, threads, worker, WORKLOAD_FILE_EXT
    )
}

pub fn workload_path(dir: &Path, tag: &str, threads: usize, worker: usize) -> PathBuf {
    dir.join(workload_filename(tag, threads, worker))
}

/// Seed for one workload file, derived from the run seed and the file's coordinates
fn file_seed(seed: u64, variant: usize, threads: usize, worker: usize) -> u64 {
    let coords = ((variant as u64) << 40) | ((threads as u64) << 20) | worker as u64;
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ coords
}

fn file_rng(cfg: &BenchConfig, variant: usize, threads: usize, worker: usize) -> StdRng {
    match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(file_seed(seed, variant, threads, worker)),
        None => StdRng::from_os_rng(),
    }
}

/// Apply the error policy to a fallible step: best-effort logs and yields `None`
pub(crate) fn tolerate<T>(policy: ErrorPolicy, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if !policy.is_strict() => {
            error!("{:#}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Outcome of the generation phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub files_written: usize,
    pub files_failed: usize,
    pub mix: WorkloadMix,
}

/// Write every workload file the run will read: for each thread count and variant,
/// one file per worker holding that worker's share of `total_ops`.
pub fn generate_all_files(cfg: &BenchConfig) -> Result<GenerationSummary> {
    let policy = cfg.error_policy;
    let mut summary = GenerationSummary::default();

    tolerate(
        policy,
        std::fs::create_dir_all(&cfg.output_dir)
            .with_context(|| format!("create {}", cfg.output_dir.display())),
    )?;

    let generators = cfg
        .variants
        .iter()
        .map(|v| {
            WorkloadGenerator::new(&v.weights).with_context(|| format!("variant '{}'", v.tag))
        })
        .collect::<Result<Vec<_>>>()?;

    for threads in 1..=cfg.max_threads {
        let shares = partition(cfg.total_ops, threads);
        for (variant, (spec, generator)) in cfg.variants.iter().zip(&generators).enumerate() {
            for (worker, &nops) in shares.iter().enumerate() {
                let path = workload_path(&cfg.output_dir, &spec.tag, threads, worker);
                let mut rng = file_rng(cfg, variant, threads, worker);
                match tolerate(policy, generator.generate_file(&path, nops, &mut rng))? {
                    Some(mix) => {
                        summary.files_written += 1;
                        summary.mix.merge_from(&mix);
                    }
                    None => summary.files_failed += 1,
                }
            }
        }
    }

    info!(
        "Generated {} workload files in {} ({} failed)",
        summary.files_written,
        cfg.output_dir.display(),
        summary.files_failed
    );
    Ok(summary)
}

/// Parse the `threads` workload files of one variant
pub fn load_cell(cfg: &BenchConfig, tag: &str, threads: usize) -> Result<Vec<Vec<Action>>> {
    (0..threads)
        .map(|worker| {
            load_workload(
                &workload_path(&cfg.output_dir, tag, threads, worker),
                cfg.error_policy,
            )
        })
        .collect()
}

/// Time `cfg.repeats` trials of one cell. Files are re-parsed and a fresh record is
/// built for every trial.
pub fn measure_cell(
    cfg: &BenchConfig,
    tag: &str,
    threads: usize,
    progress: &ProgressBar,
) -> Result<CellStats> {
    let mut stats = CellStats::new();
    for repeat in 0..cfg.repeats {
        let workloads = load_cell(cfg, tag, threads)?;
        if repeat == 0 {
            let mut mix = WorkloadMix::default();
            for w in &workloads {
                mix.merge_from(&WorkloadMix::from_actions(w));
            }
            debug!(
                "{} x{}: {} actions ({} reads, {} writes, {} snapshots)",
                tag,
                threads,
                mix.total(),
                mix.reads,
                mix.writes,
                mix.snapshots
            );
        }

        let elapsed = measure_time(workloads, cfg.error_policy)
            .with_context(|| format!("{} with {} threads, trial {}", tag, threads, repeat + 1))?;
        debug!("{} x{} trial {}: {:?}", tag, threads, repeat + 1, elapsed);
        stats.record(elapsed);
        progress.inc(1);
    }
    Ok(stats)
}

/// Measure every (variant, thread-count) cell from the files already on disk
pub fn measure_all(cfg: &BenchConfig, progress: &ProgressBar) -> Result<ResultsMatrix> {
    let tags = cfg.variants.iter().map(|v| v.tag.clone()).collect();
    let mut results = ResultsMatrix::new(tags, cfg.max_threads);

    for (variant, spec) in cfg.variants.iter().enumerate() {
        for threads in 1..=cfg.max_threads {
            progress.set_message(format!("{} with {} threads", spec.tag, threads));
            let stats = measure_cell(cfg, &spec.tag, threads, progress)?;
            info!(
                "{} x{}: mean {:.4}s over {} trials",
                spec.tag,
                threads,
                stats.mean_secs(),
                stats.count()
            );
            *results.cell_mut(variant, threads) = stats;
        }
    }
    Ok(results)
}

/// Generate all workload files, then measure every cell
pub fn run_benchmark(cfg: &BenchConfig, progress: &ProgressBar) -> Result<ResultsMatrix> {
    cfg.validate()?;
    generate_all_files(cfg)?;
    measure_all(cfg, progress)
}
