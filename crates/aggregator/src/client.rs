// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::protocol::ops;
use crate::{AggregationError, AggregationResult, AggregatorAccount, ErrorKind};
use num_bigint::BigUint;
use ppdag_ledger::{Proposal, TransactionSubmitter, TxReceipt};
use ppdag_paillier::{encoding, AdditiveScheme, Ciphertext, PublicKey};
use tracing::{debug, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Talks to the aggregation contract through a [`TransactionSubmitter`].
///
/// Submissions that lose a read-set conflict are re-submitted up to `max_retries` times. Every
/// attempt re-executes the contract, so a retry always works against fresh state. No other
/// error is retried.
pub struct AggregatorClient<S: TransactionSubmitter> {
    submitter: S,
    max_retries: u32,
}

impl<S: TransactionSubmitter> AggregatorClient<S> {
    pub fn new(submitter: S) -> Self {
        Self::with_max_retries(submitter, DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(submitter: S, max_retries: u32) -> Self {
        Self {
            submitter,
            max_retries,
        }
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    async fn submit(&self, id: &str, proposal: Proposal) -> AggregationResult<TxReceipt> {
        let mut attempt = 0;
        loop {
            let err = match self.submitter.submit(proposal.clone()).await {
                Ok(receipt) => {
                    debug!(
                        aggregator_id = id,
                        operation = %proposal.operation,
                        tx_id = %receipt.tx_id,
                        block_number = receipt.block_number,
                        "Submission committed"
                    );
                    return Ok(receipt);
                }
                Err(err) => AggregationError::from_ledger(err, id, &proposal.operation),
            };
            if !err.is_transient() || attempt >= self.max_retries {
                return Err(err);
            }
            attempt += 1;
            warn!(
                aggregator_id = id,
                operation = %proposal.operation,
                attempt,
                max_retries = self.max_retries,
                "Retrying after transient failure: {}",
                err.message
            );
        }
    }

    async fn query(&self, id: &str, proposal: Proposal) -> AggregationResult<Vec<u8>> {
        self.submitter
            .query(proposal.clone())
            .await
            .map_err(|err| AggregationError::from_ledger(err, id, &proposal.operation))
    }

    fn decode_account(id: &str, op: &str, bytes: &[u8]) -> AggregationResult<AggregatorAccount> {
        AggregatorAccount::from_bytes(bytes)
            .map_err(|e| AggregationError::new(ErrorKind::InvalidParameter, id, op, e.to_string()))
    }

    pub async fn initialize(
        &self,
        id: &str,
        affiliation: Option<&str>,
        modulus_squared: Option<&BigUint>,
    ) -> AggregationResult<AggregatorAccount> {
        let proposal = Proposal::new(ops::INITIALIZE)
            .arg(id)
            .arg(affiliation.unwrap_or_default())
            .arg(modulus_squared.map(encoding::to_base64).unwrap_or_default());
        let receipt = self.submit(id, proposal).await?;
        Self::decode_account(id, ops::INITIALIZE, &receipt.payload)
    }

    pub async fn contribute(
        &self,
        id: &str,
        ciphertext: &Ciphertext,
        modulus_squared: &BigUint,
    ) -> AggregationResult<AggregatorAccount> {
        let proposal = Proposal::new(ops::CONTRIBUTE)
            .arg(id)
            .arg(ciphertext.to_base64())
            .arg(encoding::to_base64(modulus_squared));
        let receipt = self.submit(id, proposal).await?;
        Self::decode_account(id, ops::CONTRIBUTE, &receipt.payload)
    }

    pub async fn contribute_all(
        &self,
        id: &str,
        ciphertexts: &[Ciphertext],
        modulus_squared: &BigUint,
    ) -> AggregationResult<AggregatorAccount> {
        let proposal = ciphertexts.iter().fold(
            Proposal::new(ops::CONTRIBUTE_ALL)
                .arg(id)
                .arg(encoding::to_base64(modulus_squared)),
            |proposal, c| proposal.arg(c.to_base64()),
        );
        let receipt = self.submit(id, proposal).await?;
        Self::decode_account(id, ops::CONTRIBUTE_ALL, &receipt.payload)
    }

    /// Encrypt `value` under `pk` with `scheme` and contribute it.
    pub async fn contribute_value(
        &self,
        scheme: &dyn AdditiveScheme,
        pk: &PublicKey,
        id: &str,
        value: &BigUint,
    ) -> AggregationResult<AggregatorAccount> {
        let ciphertext = scheme
            .encrypt(value, pk)
            .map_err(|e| AggregationError::from_paillier(e, id, ops::CONTRIBUTE))?;
        self.contribute(id, &ciphertext, pk.n_squared()).await
    }

    pub async fn current_total(&self, id: &str) -> AggregationResult<Ciphertext> {
        let bytes = self
            .query(id, Proposal::new(ops::CURRENT_TOTAL).arg(id))
            .await?;
        Ciphertext::from_bytes(&bytes)
            .map_err(|e| AggregationError::from_paillier(e, id, ops::CURRENT_TOTAL))
    }

    pub async fn account(&self, id: &str) -> AggregationResult<AggregatorAccount> {
        let bytes = self.query(id, Proposal::new(ops::ACCOUNT).arg(id)).await?;
        Self::decode_account(id, ops::ACCOUNT, &bytes)
    }

    pub async fn history(&self, id: &str) -> AggregationResult<Vec<AggregatorAccount>> {
        let bytes = self.query(id, Proposal::new(ops::HISTORY).arg(id)).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AggregationError::new(ErrorKind::InvalidParameter, id, ops::HISTORY, e.to_string())
        })
    }
}
