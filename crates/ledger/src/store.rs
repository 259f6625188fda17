// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::LedgerResult;
use std::collections::BTreeMap;

/// Keys a transaction read (with the value it observed) and the values it wants to write.
///
/// A commit succeeds only if every read value is still current, which rules out applying a
/// transaction against a stale view of the state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadWriteSet {
    reads: BTreeMap<String, Option<Vec<u8>>>,
    writes: BTreeMap<String, Vec<u8>>,
}

impl ReadWriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value observed for `key`. The first observation wins.
    pub fn record_read(&mut self, key: &str, value: Option<Vec<u8>>) {
        self.reads.entry(key.to_string()).or_insert(value);
    }

    pub fn record_write(&mut self, key: &str, value: Vec<u8>) {
        self.writes.insert(key.to_string(), value);
    }

    pub fn observed(&self, key: &str) -> Option<&Option<Vec<u8>>> {
        self.reads.get(key)
    }

    pub fn pending(&self, key: &str) -> Option<&Vec<u8>> {
        self.writes.get(key)
    }

    pub fn reads(&self) -> impl Iterator<Item = (&String, &Option<Vec<u8>>)> {
        self.reads.iter()
    }

    pub fn writes(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.writes.iter()
    }
}

/// The ledger's world state: opaque bytes under string keys, plus the history of every value a
/// key has held.
pub trait StateStore: Send + Sync {
    fn read(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Validate the read set against the current state and apply the writes, all or nothing.
    /// Returns [`crate::LedgerError::Conflict`] when a read value is no longer current.
    fn commit(&self, rw_set: &ReadWriteSet) -> LedgerResult<()>;

    /// Every committed value of `key`, oldest first.
    fn history(&self, key: &str) -> LedgerResult<Vec<Vec<u8>>>;
}
