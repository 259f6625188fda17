// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod chaincode;
mod error;
mod eventbus;
mod events;
mod in_mem;
mod local_ledger;
mod sled_store;
mod store;
mod traits;
mod tx_context;

pub use chaincode::*;
pub use error::*;
pub use eventbus::*;
pub use events::*;
pub use in_mem::*;
pub use local_ledger::*;
pub use sled_store::*;
pub use store::*;
pub use traits::*;
pub use tx_context::*;
