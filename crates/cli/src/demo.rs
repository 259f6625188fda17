// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::key_files::{read_private_key, read_public_key};
use actix::Actor;
use anyhow::{bail, Context, Result};
use num_bigint::BigUint;
use ppdag_aggregator::{
    AggregationChaincode, AggregatorClient, DecryptionListener, ErrorKind, GetLatestTotal,
    AGGREGATE_EVENT,
};
use ppdag_config::AppConfig;
use ppdag_ledger::{
    EventBus, EventSubscriber, HistoryCollector, InMemStateStore, LedgerEvent, LocalLedger,
    SledStateStore, StateStore, TakeEvents,
};
use std::{path::PathBuf, sync::Arc};
use tracing::info;

/// Contribute `values` one transaction at a time to the configured aggregator on a local
/// ledger, printing the total the decryption listener recovers after each one.
pub async fn execute(
    config: &AppConfig,
    keys: Option<(PathBuf, PathBuf)>,
    values: Vec<BigUint>,
) -> Result<()> {
    let id = config.aggregator_id.as_str();
    let scheme = config.scheme.build(config.key_bits);

    let (pk, sk) = match keys {
        Some((public_path, private_path)) => (
            read_public_key(&public_path)?,
            read_private_key(&private_path)?,
        ),
        None => {
            info!(bits = config.key_bits, "Generating a fresh key pair for this run");
            scheme.generate()?
        }
    };
    if !pk.pairs_with(&sk) {
        bail!("The public and private key do not belong to the same key pair");
    }

    let sled = match config.db_path()? {
        Some(path) => Some((Arc::new(SledStateStore::open(&path)?), path)),
        None => None,
    };
    let store: Arc<dyn StateStore> = match &sled {
        Some((sled, _)) => sled.clone() as Arc<dyn StateStore>,
        None => Arc::new(InMemStateStore::new()),
    };

    let bus = EventBus::<LedgerEvent>::new().start();
    let ledger = Arc::new(LocalLedger::new(
        &config.name,
        AggregationChaincode,
        store,
        bus.clone(),
    ));
    let listener = DecryptionListener::attach(&bus, id, scheme.clone(), Arc::new(sk));
    let aggregates = HistoryCollector::<LedgerEvent>::new().start();
    bus.subscribe(AGGREGATE_EVENT, aggregates.clone().recipient());

    let client = AggregatorClient::with_max_retries(ledger, config.max_retries);
    match client
        .initialize(id, config.affiliation.as_deref(), None)
        .await
    {
        Ok(_) => info!(aggregator_id = id, "Aggregator initialized"),
        Err(err) if err.kind == ErrorKind::AlreadyInitialized => {
            info!(aggregator_id = id, "Continuing existing aggregation")
        }
        Err(err) => return Err(err.into()),
    }

    for value in values {
        let account = client
            .contribute_value(scheme.as_ref(), &pk, id, &value)
            .await?;
        aggregates.send(TakeEvents::new(1)).await??;
        let latest = listener
            .send(GetLatestTotal)
            .await?
            .context("Listener did not decrypt the new total")?;
        println!(
            "{id}: contributed {value}, total is {} after {} contributions (block {})",
            latest.total, account.contribution_count, latest.block_number
        );
    }

    drop(client);
    if let Some((sled, path)) = sled {
        drop(sled);
        SledStateStore::close(&path)?;
    }
    Ok(())
}
