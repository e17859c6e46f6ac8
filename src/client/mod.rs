//! RPC collaborators: the transport trait, its HTTP implementation, the
//! network context and the request/result types they exchange.
//!
//! # Data Flow
//! ```text
//! Dispatcher
//!     → NetworkContext::client() (Arc<dyn PactRpc>)
//!     → HttpPactClient (endpoint URL per chain, failover, timeout)
//!     → Pact node /local /send /listen /poll /spv
//! ```
//!
//! # Design Decisions
//! - Retries stop at endpoint failover; nothing above the transport retries
//! - `PactRpc` is a trait so tests and alternative transports plug in

pub mod http;
pub mod network;
pub mod rpc;
pub mod types;

pub use http::HttpPactClient;
pub use network::NetworkContext;
pub use rpc::PactRpc;
pub use types::{
    BlockMetadata, ChainTarget, CommandOutcome, LocalOptions, LocalPactTransactionResult,
    TransactionDescriptor, TransactionResult,
};
