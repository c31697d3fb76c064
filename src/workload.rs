// src/workload.rs
//
// Workload actions, the weighted generator that writes workload files, and the
// parser that reads them back.
//

use anyhow::{anyhow, bail, Context, Result};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, error};

use rand::distr::weighted::WeightedIndex;
use rand::Rng;
use rand_distr::Distribution;

use crate::config::ErrorPolicy;
use crate::constants::{GENERATED_WRITE_VALUE, NUM_ACTION_KINDS};

// -----------------------------------------------------------------------------
// Actions
// -----------------------------------------------------------------------------

/// One step of a workload, replayed against the shared record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read a field and discard the value
    Read(i32),
    /// Write `value` into `field`
    Write(i32, i32),
    /// Format both fields under both locks
    Snapshot,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Read(field) => write!(f, "read {}", field),
            Action::Write(field, value) => write!(f, "write {} {}", field, value),
            Action::Snapshot => f.write_str("string"),
        }
    }
}

/// Strict parse of a single workload line: the command must be known, operands
/// must be present and numeric, and nothing may follow them.
impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let cmd = tokens.next().ok_or_else(|| anyhow!("empty line"))?;
        let mut operand = |name: &str| -> Result<i32> {
            let tok = tokens
                .next()
                .ok_or_else(|| anyhow!("'{}' is missing its {} operand", cmd, name))?;
            tok.parse()
                .with_context(|| format!("'{}' has non-numeric {} operand '{}'", cmd, name, tok))
        };
        let action = match cmd {
            "read" => Action::Read(operand("field")?),
            "write" => {
                let field = operand("field")?;
                Action::Write(field, operand("value")?)
            }
            "string" => Action::Snapshot,
            other => bail!("unknown command '{}'", other),
        };
        if let Some(extra) = tokens.next() {
            bail!("unexpected trailing token '{}'", extra);
        }
        Ok(action)
    }
}

impl Action {
    /// Lenient parse of a single workload line.
    ///
    /// Unknown commands and blank lines yield `None`. Missing or non-numeric operands
    /// of a known command read as 0 and trailing tokens are ignored.
    pub fn parse_lenient(line: &str) -> Option<Action> {
        let mut tokens = line.split_whitespace();
        let cmd = tokens.next()?;
        let mut operand = || tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0);
        match cmd {
            "read" => Some(Action::Read(operand())),
            "write" => {
                let field = operand();
                Some(Action::Write(field, operand()))
            }
            "string" => Some(Action::Snapshot),
            _ => None,
        }
    }
}

/// The five action kinds a generated workload is drawn from, in weight order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ReadField0,
    WriteField0,
    ReadField1,
    WriteField1,
    Snapshot,
}

impl ActionKind {
    pub const ALL: [ActionKind; NUM_ACTION_KINDS] = [
        ActionKind::ReadField0,
        ActionKind::WriteField0,
        ActionKind::ReadField1,
        ActionKind::WriteField1,
        ActionKind::Snapshot,
    ];

    /// Kind for a sampled weight index; anything past the last index is a snapshot
    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or(ActionKind::Snapshot)
    }

    pub fn action(self) -> Action {
        match self {
            ActionKind::ReadField0 => Action::Read(0),
            ActionKind::WriteField0 => Action::Write(0, GENERATED_WRITE_VALUE),
            ActionKind::ReadField1 => Action::Read(1),
            ActionKind::WriteField1 => Action::Write(1, GENERATED_WRITE_VALUE),
            ActionKind::Snapshot => Action::Snapshot,
        }
    }
}

/// Action counts for one workload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkloadMix {
    pub reads: u64,
    pub writes: u64,
    pub snapshots: u64,
}

impl WorkloadMix {
    pub fn from_actions(actions: &[Action]) -> Self {
        let mut mix = Self::default();
        for a in actions {
            mix.add(a);
        }
        mix
    }

    pub fn add(&mut self, action: &Action) {
        match action {
            Action::Read(_) => self.reads += 1,
            Action::Write(..) => self.writes += 1,
            Action::Snapshot => self.snapshots += 1,
        }
    }

    pub fn merge_from(&mut self, other: &WorkloadMix) {
        self.reads += other.reads;
        self.writes += other.writes;
        self.snapshots += other.snapshots;
    }

    pub fn total(&self) -> u64 {
        self.reads + self.writes + self.snapshots
    }
}

// -----------------------------------------------------------------------------
// Generation
// -----------------------------------------------------------------------------

/// Draws actions from relative weights over the five [`ActionKind`]s
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    chooser: WeightedIndex<f64>,
}

impl WorkloadGenerator {
    /// Weights are relative and need not sum to 1
    pub fn new(weights: &[f64]) -> Result<Self> {
        if weights.len() != NUM_ACTION_KINDS {
            bail!("expected {} weights, got {}", NUM_ACTION_KINDS, weights.len());
        }
        let chooser = WeightedIndex::new(weights.iter().copied()).context("invalid weights")?;
        Ok(Self { chooser })
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        ActionKind::from_index(self.chooser.sample(rng)).action()
    }

    /// `n` draws in order, without touching the filesystem
    pub fn draws<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Action> {
        (0..n).map(|_| self.draw(rng)).collect()
    }

    /// Write `n` draws to `out`, one encoded action per line
    pub fn generate_to<W: Write, R: Rng + ?Sized>(
        &self,
        out: &mut W,
        n: usize,
        rng: &mut R,
    ) -> Result<WorkloadMix> {
        let mut mix = WorkloadMix::default();
        for _ in 0..n {
            let action = self.draw(rng);
            writeln!(out, "{}", action)?;
            mix.add(&action);
        }
        Ok(mix)
    }

    /// Create (or truncate) `path` and write `n` draws to it.
    ///
    /// Nothing is written if the file cannot be created.
    pub fn generate_file<R: Rng + ?Sized>(
        &self,
        path: &Path,
        n: usize,
        rng: &mut R,
    ) -> Result<WorkloadMix> {
        let file = File::create(path)
            .with_context(|| format!("Cannot open {} for writing", path.display()))?;
        let mut out = BufWriter::new(file);
        let mix = self
            .generate_to(&mut out, n, rng)
            .with_context(|| format!("write {}", path.display()))?;
        out.flush()
            .with_context(|| format!("flush {}", path.display()))?;
        debug!(
            "Generated {}: {} reads, {} writes, {} snapshots",
            path.display(),
            mix.reads,
            mix.writes,
            mix.snapshots
        );
        Ok(mix)
    }
}

// -----------------------------------------------------------------------------
// Parsing
// -----------------------------------------------------------------------------

/// Parse workload text line by line.
///
/// Blank lines are always skipped. Under [`ErrorPolicy::BestEffort`] unrecognised
/// lines are skipped too; under [`ErrorPolicy::Strict`] the first bad line is an error.
pub fn parse_reader<R: BufRead>(reader: R, policy: ErrorPolicy) -> Result<Vec<Action>> {
    let mut actions = Vec::new();
    let mut skipped = 0usize;

    for (line_num, raw) in reader.split(b'\n').enumerate() {
        let mut raw = raw.with_context(|| format!("read line {}", line_num + 1))?;
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) if policy.is_strict() => {
                bail!("line {}: not valid UTF-8 ({})", line_num + 1, e.utf8_error());
            }
            // Invalid bytes only spoil this line; lossy text never names a command
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        if line.trim().is_empty() {
            continue;
        }
        if policy.is_strict() {
            let action = line
                .parse::<Action>()
                .with_context(|| format!("line {}: '{}'", line_num + 1, line))?;
            actions.push(action);
        } else {
            match Action::parse_lenient(&line) {
                Some(action) => actions.push(action),
                None => {
                    debug!("Skipping line {} (unrecognised: '{}')", line_num + 1, line);
                    skipped += 1;
                }
            }
        }
    }

    if skipped > 0 {
        debug!("Skipped {} unrecognised lines", skipped);
    }
    Ok(actions)
}

pub fn parse_str(text: &str, policy: ErrorPolicy) -> Result<Vec<Action>> {
    parse_reader(text.as_bytes(), policy)
}

/// Parse a workload file; an unreadable file is an error
pub fn parse_file(path: &Path, policy: ErrorPolicy) -> Result<Vec<Action>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open {} for reading", path.display()))?;
    parse_reader(BufReader::new(file), policy).with_context(|| format!("parse {}", path.display()))
}

/// Parse a workload file, applying `policy` to failures.
///
/// Best-effort: a failure is logged and the workload comes back empty, so its worker
/// simply does nothing. Strict: the failure is returned.
pub fn load_workload(path: &Path, policy: ErrorPolicy) -> Result<Vec<Action>> {
    match parse_file(path, policy) {
        Ok(actions) => Ok(actions),
        Err(e) if !policy.is_strict() => {
            error!("{:#}", e);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Read(0).to_string(), "read 0");
        assert_eq!(Action::Write(1, 1).to_string(), "write 1 1");
        assert_eq!(Action::Snapshot.to_string(), "string");
    }

    #[test]
    fn test_action_strict_parse() {
        assert_eq!("read 1".parse::<Action>().unwrap(), Action::Read(1));
        assert_eq!("write 0 5".parse::<Action>().unwrap(), Action::Write(0, 5));
        assert_eq!("  write  -1   -9 ".parse::<Action>().unwrap(), Action::Write(-1, -9));
        assert_eq!("string".parse::<Action>().unwrap(), Action::Snapshot);

        assert!("".parse::<Action>().is_err());
        assert!("read".parse::<Action>().is_err());
        assert!("read x".parse::<Action>().is_err());
        assert!("write 0".parse::<Action>().is_err());
        assert!("string now".parse::<Action>().is_err());
        assert!("foo bar baz".parse::<Action>().is_err());
    }

    #[test]
    fn test_action_lenient_parse() {
        assert_eq!(Action::parse_lenient("read 1"), Some(Action::Read(1)));
        assert_eq!(Action::parse_lenient("read"), Some(Action::Read(0)));
        assert_eq!(Action::parse_lenient("read abc"), Some(Action::Read(0)));
        assert_eq!(Action::parse_lenient("write 1"), Some(Action::Write(1, 0)));
        assert_eq!(Action::parse_lenient("write 1 3 extra"), Some(Action::Write(1, 3)));
        assert_eq!(Action::parse_lenient("string trailing"), Some(Action::Snapshot));
        assert_eq!(Action::parse_lenient("foo bar baz"), None);
        assert_eq!(Action::parse_lenient("   "), None);
        assert_eq!(Action::parse_lenient("READ 0"), None);
    }

    #[test]
    fn test_action_kind_mapping() {
        let lines: Vec<String> = ActionKind::ALL.iter().map(|k| k.action().to_string()).collect();
        assert_eq!(lines, ["read 0", "write 0 1", "read 1", "write 1 1", "string"]);
        assert_eq!(ActionKind::from_index(99), ActionKind::Snapshot);
    }

    #[test]
    fn test_generator_rejects_bad_weights() {
        assert!(WorkloadGenerator::new(&[1.0, 1.0]).is_err());
        assert!(WorkloadGenerator::new(&[0.0; NUM_ACTION_KINDS]).is_err());
        assert!(WorkloadGenerator::new(&[1.0, -1.0, 1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn test_generator_single_kind() {
        let generator = WorkloadGenerator::new(&[0.0, 0.0, 0.0, 3.0, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generator.draws(200, &mut rng).iter().all(|a| *a == Action::Write(1, 1)));
    }

    #[test]
    fn test_generator_is_reproducible() {
        let generator = WorkloadGenerator::new(&[0.1, 0.05, 0.5, 0.1, 0.25]).unwrap();
        let a = generator.draws(500, &mut StdRng::seed_from_u64(42));
        let b = generator.draws(500, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_to_round_trips_through_parser() {
        let generator = WorkloadGenerator::new(&[0.2; NUM_ACTION_KINDS]).unwrap();
        let expected = generator.draws(1000, &mut StdRng::seed_from_u64(9));

        let mut buf = Vec::new();
        let mix = generator
            .generate_to(&mut buf, 1000, &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(mix, WorkloadMix::from_actions(&expected));
        assert_eq!(mix.total(), 1000);

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1000);
        assert_eq!(parse_str(&text, ErrorPolicy::Strict).unwrap(), expected);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let text = "write 0 5\nfoo bar baz\n\nread 0\nstring\n";
        let actions = parse_str(text, ErrorPolicy::BestEffort).unwrap();
        assert_eq!(actions, vec![Action::Write(0, 5), Action::Read(0), Action::Snapshot]);

        assert!(parse_str("foo bar baz", ErrorPolicy::BestEffort).unwrap().is_empty());
        assert_eq!(
            parse_str("read 1\r\nstring\r\n", ErrorPolicy::Strict).unwrap(),
            vec![Action::Read(1), Action::Snapshot]
        );
        let err = parse_str(text, ErrorPolicy::Strict).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_parse_skips_invalid_utf8_line() {
        let bytes: &[u8] = b"write 0 5\nread 0\n\xff\xfe junk\nstring\n";
        let actions = parse_reader(bytes, ErrorPolicy::BestEffort).unwrap();
        assert_eq!(actions, vec![Action::Write(0, 5), Action::Read(0), Action::Snapshot]);

        let err = parse_reader(bytes, ErrorPolicy::Strict).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_workload_mix() {
        let mut mix = WorkloadMix::from_actions(&[
            Action::Read(0),
            Action::Read(7),
            Action::Write(1, 2),
            Action::Snapshot,
        ]);
        assert_eq!((mix.reads, mix.writes, mix.snapshots), (2, 1, 1));
        mix.merge_from(&WorkloadMix { reads: 1, writes: 1, snapshots: 1 });
        assert_eq!(mix.total(), 7);
    }
}
