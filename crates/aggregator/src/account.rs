// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use num_bigint::BigUint;
use ppdag_paillier::Ciphertext;
use serde::{Deserialize, Serialize};

/// Prefix of every account key in the world state.
pub const ACCOUNT_KEY_PREFIX: &str = "aggregator/";

/// The running encrypted total owned by one aggregator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorAccount {
    pub aggregator_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    pub encrypted_total: Ciphertext,
    /// `n²` of the key every contribution must be encrypted under. Bound at initialization or
    /// by the first contribution.
    #[serde(default, with = "optional_base64")]
    pub modulus_squared: Option<BigUint>,
    pub contribution_count: u64,
}

impl AggregatorAccount {
    pub fn new(
        aggregator_id: &str,
        affiliation: Option<String>,
        modulus_squared: Option<BigUint>,
    ) -> Self {
        Self {
            aggregator_id: aggregator_id.to_string(),
            affiliation,
            encrypted_total: Ciphertext::identity(),
            modulus_squared,
            contribution_count: 0,
        }
    }

    pub fn storage_key(aggregator_id: &str) -> String {
        format!("{ACCOUNT_KEY_PREFIX}{aggregator_id}")
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

mod optional_base64 {
    use num_bigint::BigUint;
    use ppdag_paillier::encoding;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<BigUint>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&encoding::to_base64(v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigUint>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| encoding::from_base64(&encoded).map_err(D::Error::custom))
            .transpose()
    }
}
