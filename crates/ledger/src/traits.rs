// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{EventBus, LedgerEvent, LedgerResult, Proposal, Subscribe};
use actix::{Addr, Recipient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_id: String,
    pub block_number: u64,
    pub payload: Vec<u8>,
}

/// Sends proposals to the ledger.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Execute and commit a proposal. Succeeds only once its writes and event are committed.
    async fn submit(&self, proposal: Proposal) -> LedgerResult<TxReceipt>;

    /// Execute a proposal without committing anything.
    async fn query(&self, proposal: Proposal) -> LedgerResult<Vec<u8>>;
}

/// Registers listeners for committed ledger events.
pub trait EventSubscriber {
    fn subscribe(&self, event_type: &str, listener: Recipient<LedgerEvent>);
}

impl EventSubscriber for Addr<EventBus<LedgerEvent>> {
    fn subscribe(&self, event_type: &str, listener: Recipient<LedgerEvent>) {
        self.do_send(Subscribe::new(event_type, listener));
    }
}
