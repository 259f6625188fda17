// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Trait that must be implemented by events used with EventBus
pub trait Event:
    Message<Result = ()> + Clone + Display + Send + Sync + Unpin + Sized + 'static
{
    fn event_type(&self) -> String;
}

/// Event raised by a contract during a transaction. It is only delivered once the transaction
/// has committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEvent {
    /// Event name subscribers filter on, eg. "aggregate"
    pub name: String,
    /// Entity the event is about, eg. the aggregator id
    pub subject: String,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEventDelivered {
    pub tx_id: String,
    pub block_number: u64,
    pub event: ChaincodeEvent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCommitted {
    pub block_number: u64,
    pub tx_id: String,
    /// False when the transaction was ordered but failed read-set validation
    pub valid: bool,
}

#[derive(Message, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[rtype(result = "()")]
pub enum LedgerEvent {
    Chaincode(ChaincodeEventDelivered),
    BlockCommitted(BlockCommitted),
}

impl LedgerEvent {
    pub fn chaincode(&self) -> Option<&ChaincodeEventDelivered> {
        match self {
            LedgerEvent::Chaincode(delivered) => Some(delivered),
            _ => None,
        }
    }
}

impl Event for LedgerEvent {
    fn event_type(&self) -> String {
        match self {
            LedgerEvent::Chaincode(delivered) => delivered.event.name.clone(),
            LedgerEvent::BlockCommitted(_) => "BlockCommitted".to_string(),
        }
    }
}

impl Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Chaincode(d) => write!(
                f,
                "{}(subject={}, block={}, tx={}, {} bytes)",
                d.event.name,
                d.event.subject,
                d.block_number,
                d.tx_id,
                d.event.payload.len()
            ),
            LedgerEvent::BlockCommitted(b) => write!(
                f,
                "BlockCommitted(block={}, tx={}, valid={})",
                b.block_number, b.tx_id, b.valid
            ),
        }
    }
}
