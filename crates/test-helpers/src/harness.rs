// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr};
use ppdag_aggregator::{
    AggregationChaincode, AggregatorClient, DecryptionListener, AGGREGATE_EVENT,
};
use ppdag_ledger::{
    EventBus, EventSubscriber, HistoryCollector, InMemStateStore, LedgerEvent, LocalLedger,
    StateStore,
};
use ppdag_paillier::{PrivateKey, SchemeKind};
use std::sync::Arc;

pub type SharedLedger = Arc<LocalLedger<AggregationChaincode>>;

/// A local ledger running the aggregation contract, with a collector recording every event.
pub struct LedgerHarness {
    pub ledger: SharedLedger,
    pub bus: Addr<EventBus<LedgerEvent>>,
    pub history: Addr<HistoryCollector<LedgerEvent>>,
}

impl LedgerHarness {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let bus = EventBus::<LedgerEvent>::new().start();
        let history = EventBus::history(&bus);
        let ledger = Arc::new(LocalLedger::new(
            "test-ledger",
            AggregationChaincode,
            store,
            bus.clone(),
        ));
        Self {
            ledger,
            bus,
            history,
        }
    }

    pub fn in_mem() -> Self {
        Self::new(Arc::new(InMemStateStore::new()))
    }

    pub fn client(&self) -> AggregatorClient<SharedLedger> {
        AggregatorClient::new(self.ledger.clone())
    }

    /// Start a decryption listener for `aggregator_id` followed by a collector of `aggregate`
    /// events. Once the collector has seen an event the listener has it queued too.
    pub fn listen(
        &self,
        aggregator_id: &str,
        private_key: PrivateKey,
    ) -> (Addr<DecryptionListener>, Addr<HistoryCollector<LedgerEvent>>) {
        let listener = DecryptionListener::attach(
            &self.bus,
            aggregator_id,
            SchemeKind::Paillier.build(ppdag_paillier::MIN_MODULUS_BITS),
            Arc::new(private_key),
        );
        let aggregates = HistoryCollector::<LedgerEvent>::new().start();
        self.bus
            .subscribe(AGGREGATE_EVENT, aggregates.clone().recipient());
        (listener, aggregates)
    }
}
