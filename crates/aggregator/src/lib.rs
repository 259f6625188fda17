// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod account;
mod client;
mod contract;
mod error;
mod listener;
pub mod protocol;

pub use account::*;
pub use client::*;
pub use contract::*;
pub use error::*;
pub use listener::*;
pub use protocol::{ops, AGGREGATE_EVENT};
