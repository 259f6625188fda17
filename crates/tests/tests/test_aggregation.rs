// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Result};
use num_bigint::BigUint;
use num_traits::One;
use ppdag_aggregator::{ErrorKind, GetDecryptedTotals, GetLatestTotal};
use ppdag_ledger::{LedgerEvent, TakeEvents};
use ppdag_paillier::{decrypt, encrypt, Ciphertext};
use ppdag_test_helpers::{fixture_keys, init_test_tracing, other_fixture_keys, LedgerHarness};

fn big(value: u64) -> BigUint {
    BigUint::from(value)
}

#[actix::test]
async fn test_org3_scenario() -> Result<()> {
    init_test_tracing();
    let (pk, sk) = fixture_keys()?;
    let harness = LedgerHarness::in_mem();
    let (listener, aggregates) = harness.listen("Org3", sk.clone());
    let client = harness.client();

    client.initialize("Org3", Some("BJ"), None).await?;

    // two organisations submit in one transaction
    let c1 = encrypt(&big(100), &pk)?;
    let c2 = encrypt(&big(200), &pk)?;
    let account = client
        .contribute_all("Org3", &[c1, c2], pk.n_squared())
        .await?;
    assert_eq!(account.contribution_count, 2);

    aggregates.send(TakeEvents::new(1)).await??;
    let latest = listener.send(GetLatestTotal).await?;
    let Some(latest) = latest else {
        bail!("listener saw no total");
    };
    assert_eq!(latest.total, big(300));

    let c3 = encrypt(&big(50), &pk)?;
    client.contribute("Org3", &c3, pk.n_squared()).await?;
    aggregates.send(TakeEvents::new(1)).await??;

    let totals: Vec<BigUint> = listener
        .send(GetDecryptedTotals)
        .await?
        .into_iter()
        .map(|t| t.total)
        .collect();
    assert_eq!(totals, vec![big(300), big(350)]);
    assert_eq!(decrypt(&client.current_total("Org3").await?, &sk)?, big(350));

    let account = client.account("Org3").await?;
    assert_eq!(account.contribution_count, 3);
    assert_eq!(account.affiliation.as_deref(), Some("BJ"));
    assert_eq!(account.modulus_squared.as_ref(), Some(pk.n_squared()));
    Ok(())
}

#[actix::test]
async fn test_concurrent_contributions_are_not_lost() -> Result<()> {
    let (pk, sk) = fixture_keys()?;
    let harness = LedgerHarness::in_mem();
    let alice = harness.client();
    let bob = harness.client();

    alice.initialize("Org3", None, None).await?;
    let c10 = encrypt(&big(10), &pk)?;
    let c20 = encrypt(&big(20), &pk)?;

    let (a, b) = tokio::join!(
        alice.contribute("Org3", &c10, pk.n_squared()),
        bob.contribute("Org3", &c20, pk.n_squared())
    );
    a?;
    b?;

    let account = alice.account("Org3").await?;
    assert_eq!(account.contribution_count, 2);
    assert_eq!(decrypt(&account.encrypted_total, &sk)?, big(30));

    // the losing submission was invalidated once and then re-executed on fresh state:
    // one block for initialize, three for the contributions and two aggregate events
    let events = harness.history.send(TakeEvents::new(6)).await??;
    let invalid = events
        .iter()
        .filter(|e| matches!(e, LedgerEvent::BlockCommitted(b) if !b.valid))
        .count();
    let aggregates = events.iter().filter(|e| e.chaincode().is_some()).count();
    assert_eq!(invalid, 1);
    assert_eq!(aggregates, 2);
    Ok(())
}

#[actix::test]
async fn test_protocol_sequencing() -> Result<()> {
    let (pk, sk) = fixture_keys()?;
    let harness = LedgerHarness::in_mem();
    let client = harness.client();
    let c = encrypt(&big(1), &pk)?;

    let Err(err) = client.contribute("Org3", &c, pk.n_squared()).await else {
        bail!("contributing before initialize must fail");
    };
    assert_eq!(err.kind, ErrorKind::NotFound);
    let Err(err) = client.current_total("Org3").await else {
        bail!("reading before initialize must fail");
    };
    assert_eq!(err.kind, ErrorKind::NotFound);

    client.initialize("Org3", None, None).await?;
    assert_eq!(client.current_total("Org3").await?, Ciphertext::identity());
    let Err(err) = client.initialize("Org3", None, None).await else {
        bail!("initializing twice must fail");
    };
    assert_eq!(err.kind, ErrorKind::AlreadyInitialized);

    let values = [3u64, 1, 4, 1, 5, 9, 2, 6];
    for v in values {
        client
            .contribute("Org3", &encrypt(&big(v), &pk)?, pk.n_squared())
            .await?;
    }
    let expected: u64 = values.iter().sum();
    assert_eq!(decrypt(&client.current_total("Org3").await?, &sk)?, big(expected));

    let history = client.history("Org3").await?;
    assert_eq!(history.len(), values.len() + 1);
    assert_eq!(history[0].contribution_count, 0);
    assert_eq!(history.last().map(|a| a.contribution_count), Some(8));
    Ok(())
}

#[actix::test]
async fn test_failed_contributions_leave_no_trace() -> Result<()> {
    let (pk, sk) = fixture_keys()?;
    let (other, _) = other_fixture_keys()?;
    let harness = LedgerHarness::in_mem();
    let client = harness.client();

    client
        .initialize("Org3", None, Some(pk.n_squared()))
        .await?;
    assert_eq!(harness.ledger.height()?, 1);

    let foreign = encrypt(&big(5), &other)?;
    let Err(err) = client
        .contribute("Org3", &foreign, other.n_squared())
        .await
    else {
        bail!("foreign key must be rejected");
    };
    assert_eq!(err.kind, ErrorKind::IncompatibleKey);

    let oversized = Ciphertext::from(pk.n_squared() + BigUint::one());
    let Err(err) = client
        .contribute("Org3", &oversized, pk.n_squared())
        .await
    else {
        bail!("out of range ciphertext must be rejected");
    };
    assert_eq!(err.kind, ErrorKind::IncompatibleKey);

    // rejected proposals are never ordered, so no block and no event
    assert_eq!(harness.ledger.height()?, 1);
    let account = client.account("Org3").await?;
    assert_eq!(account.contribution_count, 0);
    assert_eq!(decrypt(&account.encrypted_total, &sk)?, big(0));
    Ok(())
}

#[actix::test]
async fn test_totals_wrap_modulo_n() -> Result<()> {
    let (pk, sk) = fixture_keys()?;
    let harness = LedgerHarness::in_mem();
    let client = harness.client();
    client.initialize("Org3", None, None).await?;

    let near_n = pk.n() - BigUint::one();
    client
        .contribute("Org3", &encrypt(&near_n, &pk)?, pk.n_squared())
        .await?;
    client
        .contribute("Org3", &encrypt(&big(2), &pk)?, pk.n_squared())
        .await?;

    assert_eq!(decrypt(&client.current_total("Org3").await?, &sk)?, big(1));
    Ok(())
}

#[actix::test]
async fn test_aggregators_are_independent() -> Result<()> {
    let (pk, sk) = fixture_keys()?;
    let harness = LedgerHarness::in_mem();
    let (listener, _) = harness.listen("Org3", sk.clone());
    let client = harness.client();

    client.initialize("Org3", None, None).await?;
    client.initialize("Org4", None, None).await?;

    let c11 = encrypt(&big(11), &pk)?;
    let c22 = encrypt(&big(22), &pk)?;
    let (a, b) = tokio::join!(
        client.contribute("Org3", &c11, pk.n_squared()),
        client.contribute("Org4", &c22, pk.n_squared())
    );
    a?;
    b?;

    let events = harness.history.send(TakeEvents::new(6)).await??;
    assert!(events
        .iter()
        .all(|e| !matches!(e, LedgerEvent::BlockCommitted(b) if !b.valid)));

    assert_eq!(decrypt(&client.current_total("Org3").await?, &sk)?, big(11));
    assert_eq!(decrypt(&client.current_total("Org4").await?, &sk)?, big(22));

    // the bus hands an event to every subscriber in one step, so the listener has it queued
    let totals: Vec<BigUint> = listener
        .send(GetDecryptedTotals)
        .await?
        .into_iter()
        .map(|t| t.total)
        .collect();
    assert_eq!(totals, vec![big(11)]);
    Ok(())
}
