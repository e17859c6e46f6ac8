//! Dispatch of built commands to one or many chains.
//!
//! # Data Flow
//! ```text
//! CommandBuilder::{build, sign, multi_sign}
//!     → Dispatcher (command + Finalizer)
//!     → finalize per chain (clone command, set chainId, sign)
//!     → submit.rs (preflight → send → listen)
//!     → PactRpc
//! ```
//!
//! # Design Decisions
//! - Submission-class operations check every slot is signed before any request
//! - Fan-out runs chains concurrently; only `sequence` submission enforces order
//! - `failure` results become `PactError::ChainFailure`, never a degraded value

pub mod dispatcher;
pub mod finalize;
pub mod submit;

pub use dispatcher::Dispatcher;
pub use finalize::Finalizer;
pub use submit::{
    cross_chain_continuation, listen_transaction, poll_transactions, preflight_transaction,
    spv_proof, submit_and_listen_transactions, submit_transaction, target_of, SubmitOptions,
};
