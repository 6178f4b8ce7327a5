//! Client for the tahu governance program.
//!
//! [`TahuClient`] builds, signs and submits program instructions through a [`Ledger`],
//! waiting a bounded time for confirmation and retrying transient failures.

pub mod client;
pub mod config;
pub mod error;
pub mod instructions;
pub mod interface;
pub mod ledger;

pub use client::{SendOptions, TahuClient};
pub use config::ProviderConfig;
pub use error::{Error, Result};
pub use ledger::{Ledger, RpcLedger};
