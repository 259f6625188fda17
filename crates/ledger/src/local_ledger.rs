// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    BlockCommitted, Chaincode, ChaincodeEvent, ChaincodeEventDelivered, EventBus, LedgerError,
    LedgerEvent, LedgerResult, Proposal, ReadWriteSet, StateStore, TransactionSubmitter,
    TxContext, TxReceipt,
};
use actix::Addr;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// In-process ledger that runs a single contract over a [`StateStore`].
///
/// A submission is executed against the current state first, then ordered: the read set is
/// validated and the writes applied under the ordering lock, and the resulting events are
/// published while the lock is still held so that subscribers see events in commit order.
pub struct LocalLedger<C: Chaincode> {
    name: String,
    chaincode: C,
    store: Arc<dyn StateStore>,
    bus: Addr<EventBus<LedgerEvent>>,
    /// Height of the chain. Doubles as the ordering lock.
    orderer: Mutex<u64>,
}

struct Endorsed {
    tx_id: String,
    payload: Vec<u8>,
    rw_set: ReadWriteSet,
    event: Option<ChaincodeEvent>,
}

impl<C: Chaincode> LocalLedger<C> {
    pub fn new(
        name: impl Into<String>,
        chaincode: C,
        store: Arc<dyn StateStore>,
        bus: Addr<EventBus<LedgerEvent>>,
    ) -> Self {
        Self {
            name: name.into(),
            chaincode,
            store,
            bus,
            orderer: Mutex::new(0),
        }
    }

    pub fn height(&self) -> LedgerResult<u64> {
        self.orderer
            .lock()
            .map(|height| *height)
            .map_err(|_| LedgerError::Storage("orderer lock poisoned".to_string()))
    }

    fn tx_id(&self, proposal: &Proposal) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update(proposal.operation.as_bytes());
        for arg in &proposal.args {
            hasher.update((arg.len() as u64).to_be_bytes());
            hasher.update(arg);
        }
        hasher.update(rand::random::<u64>().to_be_bytes());
        hex::encode(hasher.finalize())
    }

    fn execute(&self, proposal: &Proposal) -> LedgerResult<Endorsed> {
        let tx_id = self.tx_id(proposal);
        let mut ctx = TxContext::new(tx_id.clone(), self.store.as_ref());
        let payload = self
            .chaincode
            .invoke(&mut ctx, &proposal.operation, &proposal.args)
            .map_err(|err| {
                debug!(
                    tx_id = %tx_id,
                    operation = %proposal.operation,
                    error = %err,
                    "Proposal rejected"
                );
                LedgerError::Rejected(err)
            })?;
        let (rw_set, event) = ctx.into_parts();
        Ok(Endorsed {
            tx_id,
            payload,
            rw_set,
            event,
        })
    }

    fn order(&self, endorsed: Endorsed) -> LedgerResult<TxReceipt> {
        let mut height = self
            .orderer
            .lock()
            .map_err(|_| LedgerError::Storage("orderer lock poisoned".to_string()))?;
        *height += 1;
        let block_number = *height;

        let committed = self.store.commit(&endorsed.rw_set);
        self.bus.do_send(LedgerEvent::BlockCommitted(BlockCommitted {
            block_number,
            tx_id: endorsed.tx_id.clone(),
            valid: committed.is_ok(),
        }));

        if let Err(err) = committed {
            warn!(
                tx_id = %endorsed.tx_id,
                block_number,
                error = %err,
                "Transaction invalidated at commit"
            );
            return Err(err);
        }

        if let Some(event) = endorsed.event {
            self.bus
                .do_send(LedgerEvent::Chaincode(ChaincodeEventDelivered {
                    tx_id: endorsed.tx_id.clone(),
                    block_number,
                    event,
                }));
        }

        debug!(tx_id = %endorsed.tx_id, block_number, "Transaction committed");
        Ok(TxReceipt {
            tx_id: endorsed.tx_id,
            block_number,
            payload: endorsed.payload,
        })
    }
}

#[async_trait]
impl<C: Chaincode> TransactionSubmitter for LocalLedger<C> {
    async fn submit(&self, proposal: Proposal) -> LedgerResult<TxReceipt> {
        let endorsed = self.execute(&proposal)?;
        // Let other submissions run between endorsement and ordering like a real network would.
        tokio::task::yield_now().await;
        self.order(endorsed)
    }

    async fn query(&self, proposal: Proposal) -> LedgerResult<Vec<u8>> {
        Ok(self.execute(&proposal)?.payload)
    }
}

#[async_trait]
impl<T: TransactionSubmitter + ?Sized> TransactionSubmitter for Arc<T> {
    async fn submit(&self, proposal: Proposal) -> LedgerResult<TxReceipt> {
        (**self).submit(proposal).await
    }

    async fn query(&self, proposal: Proposal) -> LedgerResult<Vec<u8>> {
        (**self).query(proposal).await
    }
}
