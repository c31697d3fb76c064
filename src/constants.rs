// src/constants.rs
//
// Central location for the defaults used throughout contention-bench.
// Config fields that are omitted from YAML and not overridden on the CLI fall back to these.

// =============================================================================
// Benchmark shape
// =============================================================================

/// Total operations per (variant, thread-count) cell, split across workers
pub const DEFAULT_TOTAL_OPS: usize = 400_000;

/// Thread counts are swept from 1 up to and including this value
pub const DEFAULT_MAX_THREADS: usize = 3;

/// Upper bound on `max_threads`; each cell spawns that many OS threads
pub const MAX_THREADS_LIMIT: usize = 1024;

/// Timed trials per cell; the reported figure is their mean
pub const DEFAULT_REPEATS: usize = 5;

/// Workload files are written here unless `output_dir` is set
pub const DEFAULT_OUTPUT_DIR: &str = ".";

// =============================================================================
// Workload mixes
// =============================================================================

/// Number of distinct action kinds a variant assigns weights to:
/// read 0, write 0, read 1, write 1, snapshot
pub const NUM_ACTION_KINDS: usize = 5;

/// Built-in variants: (tag, relative weights in action-kind order)
pub const DEFAULT_VARIANTS: [(&str, [f64; NUM_ACTION_KINDS]); 3] = [
    ("A_variant", [0.10, 0.05, 0.50, 0.10, 0.25]),
    ("B_variant", [0.20, 0.20, 0.20, 0.20, 0.20]),
    ("C_variant", [0.20, 0.10, 0.05, 0.20, 0.45]),
];

// =============================================================================
// Shared record
// =============================================================================

/// Number of independently locked fields in the shared record
pub const RECORD_FIELDS: usize = 2;

/// Value written by every generated write action
pub const GENERATED_WRITE_VALUE: i32 = 1;

// =============================================================================
// Files
// =============================================================================

/// Prefix of every generated workload file name
pub const WORKLOAD_FILE_PREFIX: &str = "input";

/// Extension of every generated workload file name
pub const WORKLOAD_FILE_EXT: &str = "txt";
