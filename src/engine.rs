// src/engine.rs
// Execution engine: one OS thread per workload, all replaying against one shared record

use anyhow::{anyhow, Context, Result};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, trace};

use crate::config::ErrorPolicy;
use crate::record::SharedRecord;
use crate::workload::Action;

/// Replay `actions` in order against `record` on the calling thread.
///
/// Read values and snapshot strings go through `black_box` so the lock round trip is
/// never optimised away. Under a strict policy an out-of-range field stops the replay.
pub fn execute(actions: &[Action], record: &SharedRecord, policy: ErrorPolicy) -> Result<()> {
    for (i, action) in actions.iter().enumerate() {
        match *action {
            Action::Read(field) => {
                let v = if policy.is_strict() {
                    record.try_get(field).with_context(|| format!("action {}", i))?
                } else {
                    record.get(field)
                };
                black_box(v);
            }
            Action::Write(field, value) => {
                if policy.is_strict() {
                    record.try_set(field, value).with_context(|| format!("action {}", i))?;
                } else {
                    record.set(field, value);
                }
            }
            Action::Snapshot => {
                black_box(record.snapshot());
            }
        }
    }
    Ok(())
}

/// Spawn one worker per workload against `record` and join them all.
///
/// Returns only once every worker has finished, even when one of them fails; the first
/// failure (or panic) is then reported.
pub fn run_once(
    record: &Arc<SharedRecord>,
    workloads: Vec<Vec<Action>>,
    policy: ErrorPolicy,
) -> Result<()> {
    let mut handles = Vec::with_capacity(workloads.len());
    let mut spawn_err = None;

    for (worker_id, actions) in workloads.into_iter().enumerate() {
        let record = Arc::clone(record);
        let spawned = thread::Builder::new()
            .name(format!("worker-{}", worker_id))
            .spawn(move || {
                trace!("Worker {} replaying {} actions", worker_id, actions.len());
                execute(&actions, &record, policy)
            });
        match spawned {
            Ok(handle) => handles.push((worker_id, handle)),
            Err(e) => {
                spawn_err = Some(anyhow!(e).context(format!("spawn worker {}", worker_id)));
                break;
            }
        }
    }

    let mut first_err = spawn_err;
    for (worker_id, handle) in handles {
        let outcome = match handle.join() {
            Ok(result) => result.with_context(|| format!("worker {} failed", worker_id)),
            Err(_) => Err(anyhow!("worker {} panicked", worker_id)),
        };
        if let Err(e) = outcome {
            error!("{:#}", e);
            first_err.get_or_insert(e);
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Time one trial: a fresh record, every workload replayed concurrently, all joined.
pub fn measure_time(workloads: Vec<Vec<Action>>, policy: ErrorPolicy) -> Result<Duration> {
    let record = Arc::new(SharedRecord::new());
    let start = Instant::now();
    run_once(&record, workloads, policy)?;
    Ok(start.elapsed())
}
