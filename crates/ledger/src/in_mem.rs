// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{LedgerError, LedgerResult, ReadWriteSet, StateStore};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    db: BTreeMap<String, Vec<u8>>,
    history: BTreeMap<String, Vec<Vec<u8>>>,
}

/// StateStore kept in process memory.
#[derive(Default)]
pub struct InMemStateStore {
    inner: Mutex<Inner>,
}

impl InMemStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::Storage("in-memory store lock poisoned".to_string()))
    }

    /// Number of keys currently holding a value
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.lock()?.db.len())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.lock()?.db.is_empty())
    }
}

impl StateStore for InMemStateStore {
    fn read(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.lock()?.db.get(key).cloned())
    }

    fn commit(&self, rw_set: &ReadWriteSet) -> LedgerResult<()> {
        let mut inner = self.lock()?;

        for (key, observed) in rw_set.reads() {
            if inner.db.get(key) != observed.as_ref() {
                return Err(LedgerError::Conflict { key: key.clone() });
            }
        }

        for (key, value) in rw_set.writes() {
            inner.db.insert(key.clone(), value.clone());
            inner
                .history
                .entry(key.clone())
                .or_default()
                .push(value.clone());
        }
        Ok(())
    }

    fn history(&self, key: &str) -> LedgerResult<Vec<Vec<u8>>> {
        Ok(self.lock()?.history.get(key).cloned().unwrap_or_default())
    }
}
