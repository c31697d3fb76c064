// src/lib.rs

pub mod config;
pub mod constants;
pub mod driver; // Partitioning, file generation, timed trials
pub mod engine; // Thread-per-workload replay
pub mod metrics;
pub mod record; // The contended two-field record
pub mod report;
pub mod tsv_export; // TSV export for machine-readable results
pub mod workload;

pub use config::{BenchConfig, ErrorPolicy, VariantSpec};
pub use metrics::ResultsMatrix;
pub use record::SharedRecord;
pub use workload::Action;
