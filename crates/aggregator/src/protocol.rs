// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! State machine that drives one aggregator's running total.
//!
//! An account is either absent (uninitialized) or active. Every call runs inside a single
//! ledger transaction, so a contribution's write and its `aggregate` event are committed
//! together or not at all. Nothing here ever decrypts.

use crate::{AggregationError, AggregationResult, AggregatorAccount, ErrorKind};
use num_bigint::BigUint;
use num_traits::One;
use ppdag_ledger::TxContext;
use ppdag_paillier::{combine_mod_n_squared, ensure_in_domain, Ciphertext};
use tracing::info;

/// Name of the event emitted with the new total after every accepted contribution.
pub const AGGREGATE_EVENT: &str = "aggregate";

pub mod ops {
    pub const INITIALIZE: &str = "initialize";
    pub const CONTRIBUTE: &str = "contribute";
    pub const CONTRIBUTE_ALL: &str = "dataAggregation";
    pub const CURRENT_TOTAL: &str = "currentTotal";
    pub const ACCOUNT: &str = "account";
    pub const HISTORY: &str = "history";
}

fn storage_error(err: ppdag_ledger::LedgerError, id: &str, op: &str) -> AggregationError {
    AggregationError::new(ErrorKind::TransientStore, id, op, err.to_string())
}

fn load(ctx: &mut TxContext<'_>, id: &str, op: &str) -> AggregationResult<AggregatorAccount> {
    let key = AggregatorAccount::storage_key(id);
    let bytes = ctx
        .get_state(&key)
        .map_err(|e| storage_error(e, id, op))?
        .ok_or_else(|| {
            AggregationError::new(ErrorKind::NotFound, id, op, format!("aggregator {id} not found"))
        })?;
    AggregatorAccount::from_bytes(&bytes).map_err(|e| {
        AggregationError::new(
            ErrorKind::InvalidParameter,
            id,
            op,
            format!("stored account is unreadable: {e}"),
        )
    })
}

fn store(
    ctx: &mut TxContext<'_>,
    account: &AggregatorAccount,
    op: &str,
) -> AggregationResult<()> {
    let bytes = account.to_bytes().map_err(|e| {
        AggregationError::new(ErrorKind::InvalidParameter, &account.aggregator_id, op, e.to_string())
    })?;
    ctx.put_state(&AggregatorAccount::storage_key(&account.aggregator_id), bytes);
    Ok(())
}

fn ensure_square_modulus(modulus_squared: &BigUint, id: &str, op: &str) -> AggregationResult<()> {
    let root = modulus_squared.sqrt();
    if modulus_squared <= &BigUint::one() || &root * &root != *modulus_squared {
        return Err(AggregationError::new(
            ErrorKind::InvalidParameter,
            id,
            op,
            "modulus must be a perfect square greater than one",
        ));
    }
    Ok(())
}

/// Create the account for `id` with the identity ciphertext as its total.
pub fn initialize(
    ctx: &mut TxContext<'_>,
    id: &str,
    affiliation: Option<String>,
    modulus_squared: Option<BigUint>,
) -> AggregationResult<AggregatorAccount> {
    let op = ops::INITIALIZE;
    if id.is_empty() {
        return Err(AggregationError::new(
            ErrorKind::InvalidParameter,
            id,
            op,
            "aggregator id must not be empty",
        ));
    }
    if let Some(m) = &modulus_squared {
        ensure_square_modulus(m, id, op)?;
    }
    let key = AggregatorAccount::storage_key(id);
    if ctx
        .get_state(&key)
        .map_err(|e| storage_error(e, id, op))?
        .is_some()
    {
        return Err(AggregationError::new(
            ErrorKind::AlreadyInitialized,
            id,
            op,
            format!("aggregator {id} is already initialized"),
        ));
    }

    let account = AggregatorAccount::new(id, affiliation, modulus_squared);
    store(ctx, &account, op)?;
    info!(aggregator_id = id, tx_id = ctx.tx_id(), "aggregator is initialized");
    Ok(account)
}

/// Fold one ciphertext into the running total.
pub fn contribute(
    ctx: &mut TxContext<'_>,
    id: &str,
    ciphertext: &Ciphertext,
    expected_modulus_squared: &BigUint,
) -> AggregationResult<AggregatorAccount> {
    apply(
        ctx,
        id,
        std::slice::from_ref(ciphertext),
        expected_modulus_squared,
        ops::CONTRIBUTE,
    )
}

/// Fold several ciphertexts into the running total in one transaction.
pub fn contribute_all(
    ctx: &mut TxContext<'_>,
    id: &str,
    ciphertexts: &[Ciphertext],
    expected_modulus_squared: &BigUint,
) -> AggregationResult<AggregatorAccount> {
    if ciphertexts.is_empty() {
        return Err(AggregationError::new(
            ErrorKind::InvalidParameter,
            id,
            ops::CONTRIBUTE_ALL,
            "at least one ciphertext is required",
        ));
    }
    apply(
        ctx,
        id,
        ciphertexts,
        expected_modulus_squared,
        ops::CONTRIBUTE_ALL,
    )
}

fn apply(
    ctx: &mut TxContext<'_>,
    id: &str,
    ciphertexts: &[Ciphertext],
    expected_modulus_squared: &BigUint,
    op: &str,
) -> AggregationResult<AggregatorAccount> {
    let mut account = load(ctx, id, op)?;

    match &account.modulus_squared {
        Some(bound) if bound != expected_modulus_squared => {
            return Err(AggregationError::new(
                ErrorKind::IncompatibleKey,
                id,
                op,
                "ciphertext modulus differs from the one bound to this aggregator",
            ));
        }
        Some(_) => {}
        None => ensure_square_modulus(expected_modulus_squared, id, op)?,
    }
    for c in ciphertexts {
        ensure_in_domain(c, expected_modulus_squared)
            .map_err(|e| AggregationError::from_paillier(e, id, op))?;
    }

    let total = ciphertexts
        .iter()
        .try_fold(account.encrypted_total.clone(), |acc, c| {
            combine_mod_n_squared(&acc, c, expected_modulus_squared)
        })
        .map_err(|e| AggregationError::from_paillier(e, id, op))?;

    account.encrypted_total = total;
    account.modulus_squared = Some(expected_modulus_squared.clone());
    account.contribution_count += ciphertexts.len() as u64;
    store(ctx, &account, op)?;
    ctx.set_event(AGGREGATE_EVENT, id, account.encrypted_total.to_bytes());

    info!(
        aggregator_id = id,
        tx_id = ctx.tx_id(),
        contributions = account.contribution_count,
        "aggregated total of {} updated",
        id
    );
    Ok(account)
}

pub fn current_total(ctx: &mut TxContext<'_>, id: &str) -> AggregationResult<Ciphertext> {
    Ok(load(ctx, id, ops::CURRENT_TOTAL)?.encrypted_total)
}

pub fn account(ctx: &mut TxContext<'_>, id: &str) -> AggregationResult<AggregatorAccount> {
    load(ctx, id, ops::ACCOUNT)
}

/// Every committed version of the account, oldest first.
pub fn history(ctx: &mut TxContext<'_>, id: &str) -> AggregationResult<Vec<AggregatorAccount>> {
    let op = ops::HISTORY;
    let versions = ctx
        .get_history(&AggregatorAccount::storage_key(id))
        .map_err(|e| storage_error(e, id, op))?;
    if versions.is_empty() {
        return Err(AggregationError::new(
            ErrorKind::NotFound,
            id,
            op,
            format!("aggregator {id} not found"),
        ));
    }
    versions
        .iter()
        .map(|bytes| {
            AggregatorAccount::from_bytes(bytes).map_err(|e| {
                AggregationError::new(ErrorKind::InvalidParameter, id, op, e.to_string())
            })
        })
        .collect()
}
