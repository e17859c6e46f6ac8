//! Transaction construction, multi-party signing and multi-chain dispatch
//! for Pact chains.
//!
//! ```text
//! NetworkContext ──▶ CommandBuilder ──▶ Dispatcher ──▶ PactRpc ──▶ node
//!  (config, client)   (with_* calls)     (finalize per chain,
//!                                          sign, local/submit/listen)
//! ```

// Command model
pub mod command;
pub mod signing;

// Dispatch and transport
pub mod client;
pub mod dispatch;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{HttpPactClient, NetworkContext, PactRpc};
pub use command::{CommandBuilder, PartiallySignedTransaction, Transaction};
pub use config::TxkitConfig;
pub use dispatch::{Dispatcher, SubmitOptions};
pub use error::{PactError, PactResult};
pub use signing::{KeyPairWallet, SigningAuthority};
