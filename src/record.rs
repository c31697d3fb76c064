//! Shared two-field record: the unit of contention for every trial.
//!
//! Each field sits behind its own `parking_lot::Mutex`, so single-field reads and
//! writes on different fields never contend with each other. `snapshot()` is the
//! only path that holds more than one lock and always takes field 0 before field 1.

use anyhow::{bail, Result};
use parking_lot::Mutex;

use crate::constants::RECORD_FIELDS;

/// Two integer fields, each independently lockable
#[derive(Debug, Default)]
pub struct SharedRecord {
    fields: [Mutex<i32>; RECORD_FIELDS],
}

impl SharedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a raw field index from a workload onto a slot, if it names one
    fn slot(field: i32) -> Option<usize> {
        usize::try_from(field).ok().filter(|&i| i < RECORD_FIELDS)
    }

    /// Write `value` into `field`. Out-of-range fields are ignored.
    pub fn set(&self, field: i32, value: i32) {
        if let Some(i) = Self::slot(field) {
            *self.fields[i].lock() = value;
        }
    }

    /// Read `field`. Out-of-range fields read as 0.
    pub fn get(&self, field: i32) -> i32 {
        match Self::slot(field) {
            Some(i) => *self.fields[i].lock(),
            None => 0,
        }
    }

    /// Like [`set`](Self::set) but rejects out-of-range fields
    pub fn try_set(&self, field: i32, value: i32) -> Result<()> {
        let Some(i) = Self::slot(field) else {
            bail!("field index {} out of range (record has {} fields)", field, RECORD_FIELDS);
        };
        *self.fields[i].lock() = value;
        Ok(())
    }

    /// Like [`get`](Self::get) but rejects out-of-range fields
    pub fn try_get(&self, field: i32) -> Result<i32> {
        let Some(i) = Self::slot(field) else {
            bail!("field index {} out of range (record has {} fields)", field, RECORD_FIELDS);
        };
        Ok(*self.fields[i].lock())
    }

    /// Both fields as `"v0 v1"`, read while holding both locks.
    ///
    /// Lock order is field 0 then field 1; no other path holds two locks.
    pub fn snapshot(&self) -> String {
        let f0 = self.fields[0].lock();
        let f1 = self.fields[1].lock();
        format!("{} {}", *f0, *f1)
    }
}
