// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use num_bigint::BigUint;
use ppdag_ledger::SledStateStore;
use ppdag_paillier::{decrypt, encrypt};
use ppdag_test_helpers::{fixture_keys, LedgerHarness};
use std::sync::Arc;
use tempfile::tempdir;

#[actix::test]
async fn test_total_survives_restart() -> Result<()> {
    let (pk, sk) = fixture_keys()?;
    let dir = tempdir()?;
    let path = dir.path().join("db");

    {
        let store = SledStateStore::open(&path)?;
        let harness = LedgerHarness::new(Arc::new(store));
        let client = harness.client();
        client.initialize("Org3", Some("BJ"), None).await?;
        client
            .contribute("Org3", &encrypt(&BigUint::from(100u32), &pk)?, pk.n_squared())
            .await?;
    }
    // the first run's handles are dropped, so closing releases the folder as an exit would
    assert!(SledStateStore::close(&path)?);

    let store = SledStateStore::open(&path)?;
    let harness = LedgerHarness::new(Arc::new(store));
    let client = harness.client();
    assert_eq!(
        decrypt(&client.current_total("Org3").await?, &sk)?,
        BigUint::from(100u32)
    );

    client
        .contribute("Org3", &encrypt(&BigUint::from(200u32), &pk)?, pk.n_squared())
        .await?;
    let account = client.account("Org3").await?;
    assert_eq!(decrypt(&account.encrypted_total, &sk)?, BigUint::from(300u32));
    assert_eq!(account.contribution_count, 2);
    assert_eq!(client.history("Org3").await?.len(), 3);

    drop(client);
    drop(harness);
    assert!(SledStateStore::close(&path)?);
    Ok(())
}
