// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ChaincodeEvent, LedgerResult, ReadWriteSet, StateStore};

/// What a contract sees of the ledger while it executes one transaction.
///
/// Reads go to the store and are remembered in the read set; writes and the event are buffered
/// and only take effect if the ledger commits the transaction.
pub struct TxContext<'a> {
    tx_id: String,
    store: &'a dyn StateStore,
    rw_set: ReadWriteSet,
    event: Option<ChaincodeEvent>,
}

impl<'a> TxContext<'a> {
    pub fn new(tx_id: impl Into<String>, store: &'a dyn StateStore) -> Self {
        Self {
            tx_id: tx_id.into(),
            store,
            rw_set: ReadWriteSet::new(),
            event: None,
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Read a key, seeing this transaction's own pending writes first.
    pub fn get_state(&mut self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        if let Some(pending) = self.rw_set.pending(key) {
            return Ok(Some(pending.clone()));
        }
        if let Some(observed) = self.rw_set.observed(key) {
            return Ok(observed.clone());
        }
        let value = self.store.read(key)?;
        self.rw_set.record_read(key, value.clone());
        Ok(value)
    }

    pub fn put_state(&mut self, key: &str, value: Vec<u8>) {
        self.rw_set.record_write(key, value);
    }

    /// Committed values of `key`, oldest first. Not part of the read set.
    pub fn get_history(&self, key: &str) -> LedgerResult<Vec<Vec<u8>>> {
        self.store.history(key)
    }

    /// Set the event emitted on commit. A transaction carries at most one event; setting it
    /// again replaces the previous one.
    pub fn set_event(&mut self, name: &str, subject: &str, payload: Vec<u8>) {
        self.event = Some(ChaincodeEvent {
            name: name.to_string(),
            subject: subject.to_string(),
            payload,
        });
    }

    pub fn into_parts(self) -> (ReadWriteSet, Option<ChaincodeEvent>) {
        (self.rw_set, self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemStateStore;

    #[test]
    fn reads_are_recorded_and_writes_buffered() -> LedgerResult<()> {
        let store = InMemStateStore::new();
        let mut ctx = TxContext::new("tx1", &store);

        assert_eq!(ctx.get_state("a")?, None);
        ctx.put_state("a", b"1".to_vec());
        assert_eq!(ctx.get_state("a")?, Some(b"1".to_vec()));
        ctx.set_event("aggregate", "Org3", vec![1]);

        // nothing reaches the store before commit
        assert_eq!(store.read("a")?, None);

        let (rw_set, event) = ctx.into_parts();
        assert_eq!(rw_set.observed("a"), Some(&None));
        assert_eq!(event.map(|e| e.subject), Some("Org3".to_string()));
        store.commit(&rw_set)?;
        assert_eq!(store.read("a")?, Some(b"1".to_vec()));
        Ok(())
    }
}
