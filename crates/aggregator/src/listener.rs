// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::protocol::AGGREGATE_EVENT;
use actix::prelude::*;
use num_bigint::BigUint;
use ppdag_ledger::{EventSubscriber, LedgerEvent};
use ppdag_paillier::{AdditiveScheme, Ciphertext, PrivateKey};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{error, info};

/// A total recovered from an `aggregate` event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptedTotal {
    pub tx_id: String,
    pub block_number: u64,
    pub total: BigUint,
}

#[derive(Message)]
#[rtype(result = "Option<DecryptedTotal>")]
pub struct GetLatestTotal;

/// The retained totals, oldest first.
#[derive(Message)]
#[rtype(result = "Vec<DecryptedTotal>")]
pub struct GetDecryptedTotals;

/// Totals a listener keeps unless configured otherwise.
pub const DEFAULT_RETAINED_TOTALS: usize = 256;

/// Holds the private key and decrypts every new total committed for one aggregator.
///
/// Only the most recent `retain` totals are kept, older ones are dropped as new ones arrive.
pub struct DecryptionListener {
    aggregator_id: String,
    scheme: Arc<dyn AdditiveScheme>,
    private_key: Arc<PrivateKey>,
    totals: VecDeque<DecryptedTotal>,
    retain: usize,
}

impl DecryptionListener {
    pub fn new(
        aggregator_id: &str,
        scheme: Arc<dyn AdditiveScheme>,
        private_key: Arc<PrivateKey>,
    ) -> Self {
        Self {
            aggregator_id: aggregator_id.to_string(),
            scheme,
            private_key,
            totals: VecDeque::new(),
            retain: DEFAULT_RETAINED_TOTALS,
        }
    }

    /// Keep at most `retain` totals, never fewer than the latest one.
    pub fn with_retained_totals(mut self, retain: usize) -> Self {
        self.retain = retain.max(1);
        self
    }

    fn record(&mut self, total: DecryptedTotal) {
        while self.totals.len() >= self.retain {
            self.totals.pop_front();
        }
        self.totals.push_back(total);
    }

    /// Start the listener and subscribe it to `aggregate` events.
    pub fn attach(
        events: &impl EventSubscriber,
        aggregator_id: &str,
        scheme: Arc<dyn AdditiveScheme>,
        private_key: Arc<PrivateKey>,
    ) -> Addr<Self> {
        let addr = Self::new(aggregator_id, scheme, private_key).start();
        events.subscribe(AGGREGATE_EVENT, addr.clone().recipient());
        addr
    }
}

impl Actor for DecryptionListener {
    type Context = Context<Self>;
}

impl Handler<LedgerEvent> for DecryptionListener {
    type Result = ();

    fn handle(&mut self, msg: LedgerEvent, _: &mut Self::Context) -> Self::Result {
        let Some(delivered) = msg.chaincode() else {
            return;
        };
        if delivered.event.name != AGGREGATE_EVENT || delivered.event.subject != self.aggregator_id
        {
            return;
        }

        let decrypted = Ciphertext::from_bytes(&delivered.event.payload)
            .and_then(|c| self.scheme.decrypt(&c, &self.private_key));
        match decrypted {
            Ok(total) => {
                info!(
                    aggregator_id = %self.aggregator_id,
                    block_number = delivered.block_number,
                    tx_id = %delivered.tx_id,
                    "aggregated total is {}",
                    total
                );
                self.record(DecryptedTotal {
                    tx_id: delivered.tx_id.clone(),
                    block_number: delivered.block_number,
                    total,
                });
            }
            Err(err) => error!(
                aggregator_id = %self.aggregator_id,
                tx_id = %delivered.tx_id,
                "Could not decrypt aggregate event: {}",
                err
            ),
        }
    }
}

impl Handler<GetLatestTotal> for DecryptionListener {
    type Result = Option<DecryptedTotal>;

    fn handle(&mut self, _: GetLatestTotal, _: &mut Self::Context) -> Self::Result {
        self.totals.back().cloned()
    }
}

impl Handler<GetDecryptedTotals> for DecryptionListener {
    type Result = Vec<DecryptedTotal>;

    fn handle(&mut self, _: GetDecryptedTotals, _: &mut Self::Context) -> Self::Result {
        self.totals.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppdag_ledger::{ChaincodeEvent, ChaincodeEventDelivered};
    use ppdag_paillier::{encrypt, KeyGenerator, SchemeKind};

    fn aggregate(subject: &str, payload: Vec<u8>, block_number: u64) -> LedgerEvent {
        LedgerEvent::Chaincode(ChaincodeEventDelivered {
            tx_id: format!("tx{block_number}"),
            block_number,
            event: ChaincodeEvent {
                name: AGGREGATE_EVENT.to_string(),
                subject: subject.to_string(),
                payload,
            },
        })
    }

    #[actix::test]
    async fn decrypts_only_its_own_aggregator() -> anyhow::Result<()> {
        let (pk, sk) =
            KeyGenerator::from_primes(&BigUint::from(1_000_003u32), &BigUint::from(1_000_033u32))?;
        let listener =
            DecryptionListener::new("Org3", SchemeKind::Paillier.build(512), Arc::new(sk)).start();

        let mine = encrypt(&BigUint::from(300u32), &pk)?;
        let theirs = encrypt(&BigUint::from(7u32), &pk)?;
        listener.send(aggregate("Org4", theirs.to_bytes(), 1)).await?;
        listener.send(aggregate("Org3", mine.to_bytes(), 2)).await?;
        listener.send(aggregate("Org3", vec![], 3)).await?;

        let latest = listener.send(GetLatestTotal).await?.expect("a total");
        assert_eq!(latest.total, BigUint::from(300u32));
        assert_eq!(latest.block_number, 2);
        assert_eq!(listener.send(GetDecryptedTotals).await?.len(), 1);
        Ok(())
    }

    #[actix::test]
    async fn keeps_only_the_most_recent_totals() -> anyhow::Result<()> {
        let (pk, sk) =
            KeyGenerator::from_primes(&BigUint::from(1_000_003u32), &BigUint::from(1_000_033u32))?;
        let listener =
            DecryptionListener::new("Org3", SchemeKind::Paillier.build(512), Arc::new(sk))
                .with_retained_totals(2)
                .start();

        for (block, total) in [(1u64, 100u32), (2, 300), (3, 350)] {
            let payload = encrypt(&BigUint::from(total), &pk)?.to_bytes();
            listener.send(aggregate("Org3", payload, block)).await?;
        }

        let kept: Vec<u64> = listener
            .send(GetDecryptedTotals)
            .await?
            .iter()
            .map(|t| t.block_number)
            .collect();
        assert_eq!(kept, vec![2, 3]);
        let latest = listener.send(GetLatestTotal).await?.expect("a total");
        assert_eq!(latest.total, BigUint::from(350u32));
        Ok(())
    }
}
