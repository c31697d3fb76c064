//
// contention-bench: generate read/write/snapshot workloads, replay them across
// 1..N worker threads against a shared record, report mean trial time per cell
//

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use contention_bench::config::{BenchConfig, ErrorPolicy};
use contention_bench::driver::{generate_all_files, measure_all};
use contention_bench::report::print_results;
use contention_bench::tsv_export::TsvExporter;

// -----------------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------------
#[derive(Parser, Debug)]
#[command(
    name = "contention-bench",
    version,
    about = "Measure lock contention on a shared two-field record across thread counts"
)]
struct Cli {
    /// YAML config file; CLI flags below override its values
    ///
    /// Example:
    ///   contention-bench --config configs/contention.yaml
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Total operations per (variant, thread-count) cell
    #[arg(long)]
    total_ops: Option<usize>,

    /// Highest thread count to measure (1..=N)
    #[arg(long)]
    max_threads: Option<usize>,

    /// Timed trials per cell
    #[arg(long)]
    repeats: Option<usize>,

    /// Directory for the generated workload files
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Seed workload generation for reproducible files
    #[arg(long)]
    seed: Option<u64>,

    /// Fail on unreadable files, malformed lines and out-of-range fields
    #[arg(long)]
    strict: bool,

    /// Only write the workload files, then exit
    #[arg(long, conflicts_with = "no_generate")]
    generate_only: bool,

    /// Reuse workload files from a previous run instead of generating new ones
    #[arg(long)]
    no_generate: bool,

    /// Export machine-readable results; writes <PATH>-results.tsv
    #[arg(long, value_name = "PATH")]
    results_tsv: Option<PathBuf>,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn build_config(&self) -> Result<BenchConfig> {
        let mut cfg = match &self.config {
            Some(path) => BenchConfig::from_file(path)?,
            None => BenchConfig::default(),
        };
        if let Some(n) = self.total_ops {
            cfg.total_ops = n;
        }
        if let Some(n) = self.max_threads {
            cfg.max_threads = n;
        }
        if let Some(n) = self.repeats {
            cfg.repeats = n;
        }
        if let Some(dir) = &self.dir {
            cfg.output_dir = dir.clone();
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if self.strict {
            cfg.error_policy = ErrorPolicy::Strict;
        }
        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }
}

// -----------------------------------------------------------------------------
// main
// -----------------------------------------------------------------------------
fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::new(format!("contention_bench={}", level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cfg = cli.build_config()?;
    info!(
        "Config: {} ops, threads 1..={}, {} repeats, {} variants, policy {:?}, dir {}",
        cfg.total_ops,
        cfg.max_threads,
        cfg.repeats,
        cfg.variants.len(),
        cfg.error_policy,
        cfg.output_dir.display()
    );

    let t0 = Instant::now();
    if !cli.no_generate {
        generate_all_files(&cfg)?;
    }
    if cli.generate_only {
        eprintln!("Workload files written to {}", cfg.output_dir.display());
        return Ok(());
    }

    let pb = ProgressBar::new(cfg.total_trials());
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} trials {msg}",
        )?
        .progress_chars("#>-"),
    );
    let results = measure_all(&cfg, &pb)?;
    pb.finish_and_clear();
    info!("Benchmark finished in {:.2}s", t0.elapsed().as_secs_f64());

    print_results(&results);

    if let Some(path) = &cli.results_tsv {
        TsvExporter::new(path).export_with_policy(&results, cfg.total_ops, cfg.error_policy)?;
    }
    Ok(())
}
