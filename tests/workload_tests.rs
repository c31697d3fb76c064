// tests/workload_tests.rs

// Workload file generation and parsing against the filesystem

use contention_bench::config::ErrorPolicy;
use contention_bench::engine::execute;
use contention_bench::record::SharedRecord;
use contention_bench::workload::{
    load_workload, parse_file, Action, WorkloadGenerator, WorkloadMix,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use tempfile::TempDir;

/// The file holds exactly the generator's draws, in draw order.
#[test]
fn test_generate_then_parse_matches_draws() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("input_A_variant_1_0.txt");
    let generator = WorkloadGenerator::new(&[0.10, 0.05, 0.50, 0.10, 0.25]).unwrap();

    let recorded = generator.draws(5_000, &mut StdRng::seed_from_u64(2024));
    let mix = generator
        .generate_file(&path, 5_000, &mut StdRng::seed_from_u64(2024))
        .unwrap();

    let parsed = parse_file(&path, ErrorPolicy::Strict).unwrap();
    assert_eq!(parsed.len(), 5_000);
    assert_eq!(parsed, recorded);
    assert_eq!(mix, WorkloadMix::from_actions(&parsed));
}

#[test]
fn test_generate_zero_ops_writes_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.txt");
    let generator = WorkloadGenerator::new(&[1.0; 5]).unwrap();
    generator.generate_file(&path, 0, &mut StdRng::seed_from_u64(0)).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
    assert!(parse_file(&path, ErrorPolicy::Strict).unwrap().is_empty());
}

#[test]
fn test_generate_into_missing_dir_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("input.txt");
    let generator = WorkloadGenerator::new(&[1.0; 5]).unwrap();
    let err = generator
        .generate_file(&path, 10, &mut StdRng::seed_from_u64(0))
        .unwrap_err();
    assert!(err.to_string().contains("for writing"));
    assert!(!path.exists());
}

#[test]
fn test_hand_written_file_replay() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hand.txt");
    fs::write(&path, "write 0 5\nread 0\nstring\n").unwrap();

    let actions = parse_file(&path, ErrorPolicy::BestEffort).unwrap();
    assert_eq!(actions, vec![Action::Write(0, 5), Action::Read(0), Action::Snapshot]);

    let rec = SharedRecord::new();
    execute(&actions, &rec, ErrorPolicy::BestEffort).unwrap();
    assert_eq!(rec.get(0), 5);
    assert_eq!(rec.get(1), 0);
    assert_eq!(rec.snapshot(), "5 0");
}

#[test]
fn test_malformed_file_parses_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.txt");
    fs::write(&path, "foo bar baz\n").unwrap();

    assert!(parse_file(&path, ErrorPolicy::BestEffort).unwrap().is_empty());
    assert!(parse_file(&path, ErrorPolicy::Strict).is_err());
}

#[test]
fn test_unreadable_file_policy() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.txt");

    assert!(parse_file(&path, ErrorPolicy::BestEffort).is_err());
    assert!(load_workload(&path, ErrorPolicy::BestEffort).unwrap().is_empty());
    let err = load_workload(&path, ErrorPolicy::Strict).unwrap_err();
    assert!(err.to_string().contains("for reading"));
}

/// One undecodable line costs only that line, not the rest of the file.
#[test]
fn test_invalid_utf8_line_keeps_rest_of_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.txt");
    fs::write(&path, b"write 0 5\nread 0\n\xff\xfe junk\nstring\n").unwrap();

    let actions = load_workload(&path, ErrorPolicy::BestEffort).unwrap();
    assert_eq!(actions, vec![Action::Write(0, 5), Action::Read(0), Action::Snapshot]);
    assert!(load_workload(&path, ErrorPolicy::Strict).is_err());
}
