// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! eventdb-kernel: the record model and access rules shared by the eventdb node and tooling.

pub mod error;
pub mod types;
pub mod event;
pub mod token;
pub mod gate;
pub mod payload;

#[cfg(test)]
pub mod tests;

pub use error::{KernelError, KernelResult};
pub use event::{EventKey, EventRecord};
pub use gate::{AccessGate, AuthMode, AuthTables, GateError};
pub use token::Credentials;
pub use types::id::EventId;
