// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{LedgerError, LedgerResult, ReadWriteSet, StateStore};
use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

const STATE_TREE: &str = "world_state";
const HISTORY_TREE: &str = "history";

// sled allows one open handle per database folder and process; stores opened on the same
// folder share it.
static OPEN_DBS: Lazy<Mutex<HashMap<PathBuf, Db>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn open_shared(path: &Path) -> Result<Db> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Could not create ledger folder '{}'", path.display()))?;
    let key = path
        .canonicalize()
        .with_context(|| format!("Could not resolve '{}'", path.display()))?;
    let mut open = OPEN_DBS
        .lock()
        .map_err(|_| anyhow!("ledger database registry lock poisoned"))?;
    if let Some(db) = open.get(&key) {
        return Ok(db.clone());
    }

    let db = sled::open(&key)
        .with_context(|| format!("Could not open ledger database at '{}'", key.display()))?;
    if db.was_recovered() {
        info!("recovered ledger state at: {:?}", &key);
    } else {
        info!("created ledger state at: {:?}", &key);
    }
    open.insert(key, db.clone());
    Ok(db)
}

/// StateStore persisted with sled.
///
/// World state and key history live in two trees that are updated in one sled transaction.
/// History entries are keyed by `key ++ 0x00 ++ id` so a prefix scan returns them in commit
/// order.
pub struct SledStateStore {
    db: Db,
    state: Tree,
    history: Tree,
}

impl SledStateStore {
    pub fn open(path: &Path) -> Result<Self> {
        let db = open_shared(path)?;
        let state = db.open_tree(STATE_TREE)?;
        let history = db.open_tree(HISTORY_TREE)?;
        Ok(Self { db, state, history })
    }

    pub fn flush(&self) -> LedgerResult<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Flush the database at `path` and drop it from the shared handles, so the folder is
    /// released once every store opened on it is dropped and can then be opened again.
    ///
    /// Returns `false` when nothing at `path` was open.
    pub fn close(path: &Path) -> Result<bool> {
        let Ok(key) = path.canonicalize() else {
            return Ok(false);
        };
        let mut open = OPEN_DBS
            .lock()
            .map_err(|_| anyhow!("ledger database registry lock poisoned"))?;
        let Some(db) = open.remove(&key) else {
            return Ok(false);
        };
        db.flush()
            .with_context(|| format!("Could not flush ledger database at '{}'", key.display()))?;
        info!("closed ledger state at: {:?}", &key);
        Ok(true)
    }
}

fn history_prefix(key: &str) -> Vec<u8> {
    let mut prefix = key.as_bytes().to_vec();
    prefix.push(0);
    prefix
}

fn history_key(key: &str, id: u64) -> Vec<u8> {
    let mut k = history_prefix(key);
    k.extend_from_slice(&id.to_be_bytes());
    k
}

impl StateStore for SledStateStore {
    fn read(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.state.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn commit(&self, rw_set: &ReadWriteSet) -> LedgerResult<()> {
        // ids are taken up front because the transaction closure may run more than once
        let mut writes = Vec::new();
        for (key, value) in rw_set.writes() {
            writes.push((key, value, history_key(key, self.db.generate_id()?)));
        }

        let result = (&self.state, &self.history).transaction(|(state, history)| {
            for (key, observed) in rw_set.reads() {
                let current = state.get(key.as_bytes())?;
                if current.as_deref() != observed.as_deref() {
                    return Err(ConflictableTransactionError::Abort(key.clone()));
                }
            }
            for (key, value, entry) in &writes {
                state.insert(key.as_bytes(), value.as_slice())?;
                history.insert(entry.as_slice(), value.as_slice())?;
            }
            Ok(())
        });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(key)) => Err(LedgerError::Conflict { key }),
            Err(TransactionError::Storage(err)) => Err(err.into()),
        }
    }

    fn history(&self, key: &str) -> LedgerResult<Vec<Vec<u8>>> {
        self.history
            .scan_prefix(history_prefix(key))
            .values()
            .map(|v| v.map(|bytes| bytes.to_vec()).map_err(LedgerError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(key: &str, observed: Option<&[u8]>, value: &[u8]) -> ReadWriteSet {
        let mut rw = ReadWriteSet::new();
        rw.record_read(key, observed.map(|v| v.to_vec()));
        rw.record_write(key, value.to_vec());
        rw
    }

    #[test]
    fn persists_state_and_history() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ledger.db");

        let store = SledStateStore::open(&path)?;
        store.commit(&write("aggregator/Org3", None, b"1"))?;
        store.commit(&write("aggregator/Org3", Some(b"1"), b"2"))?;
        store.commit(&write("aggregator/Org30", None, b"x"))?;
        store.flush()?;

        // a second handle to the same path shares the cached db
        let reopened = SledStateStore::open(&path)?;
        assert_eq!(reopened.read("aggregator/Org3")?, Some(b"2".to_vec()));
        assert_eq!(
            reopened.history("aggregator/Org3")?,
            vec![b"1".to_vec(), b"2".to_vec()]
        );
        assert_eq!(reopened.history("aggregator/Org30")?, vec![b"x".to_vec()]);
        Ok(())
    }

    #[test]
    fn stale_reads_abort_the_transaction() -> Result<()> {
        let dir = tempdir()?;
        let store = SledStateStore::open(&dir.path().join("ledger.db"))?;
        store.commit(&write("k", None, b"1"))?;
        store.commit(&write("k", Some(b"1"), b"2"))?;

        let err = store.commit(&write("k", Some(b"1"), b"3")).unwrap_err();
        assert!(err.is_transient());
        assert_eq!(store.read("k")?, Some(b"2".to_vec()));
        assert_eq!(store.history("k")?.len(), 2);
        Ok(())
    }

    #[test]
    fn closed_databases_can_be_reopened() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ledger.db");

        let store = SledStateStore::open(&path)?;
        store.commit(&write("k", None, b"1"))?;
        drop(store);
        assert!(SledStateStore::close(&path)?);
        assert!(!SledStateStore::close(&path)?);

        // the folder lock is gone, so sled itself can take it
        let db = sled::open(&path)?;
        let state = db.open_tree(STATE_TREE)?;
        assert_eq!(state.get(b"k")?.as_deref(), Some(&b"1"[..]));
        drop(state);
        drop(db);

        let reopened = SledStateStore::open(&path)?;
        assert_eq!(reopened.read("k")?, Some(b"1".to_vec()));
        assert!(SledStateStore::close(&path)?);
        Ok(())
    }

    #[test]
    fn closing_an_unknown_path_is_a_no_op() -> Result<()> {
        let dir = tempdir()?;
        assert!(!SledStateStore::close(&dir.path().join("missing"))?);
        Ok(())
    }
}
