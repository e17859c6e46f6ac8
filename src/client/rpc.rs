//! Transport interface consumed by the dispatcher.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::client::types::{
    ChainTarget, LocalOptions, LocalPactTransactionResult, TransactionDescriptor, TransactionResult,
};
use crate::command::transaction::{PartiallySignedTransaction, Transaction};
use crate::command::types::ChainId;
use crate::error::PactResult;

/// Pact REST API operations. Implementations own timeouts and failover;
/// callers above this trait never retry.
#[async_trait]
pub trait PactRpc: Send + Sync {
    /// Non-committing execution.
    async fn local(
        &self,
        target: &ChainTarget,
        tx: &PartiallySignedTransaction,
        options: LocalOptions,
    ) -> PactResult<LocalPactTransactionResult>;

    /// Submit signed transactions; returns one request key per transaction.
    async fn send(&self, target: &ChainTarget, txs: &[Transaction]) -> PactResult<Vec<String>>;

    /// Block until the transaction has a result.
    async fn listen(&self, descriptor: &TransactionDescriptor) -> PactResult<TransactionResult>;

    /// Results known so far for the given request keys; pending keys are absent.
    async fn poll(
        &self,
        target: &ChainTarget,
        request_keys: &[String],
    ) -> PactResult<HashMap<String, TransactionResult>>;

    /// SPV proof that `descriptor`'s transaction happened, for use on `target_chain`.
    async fn spv(&self, descriptor: &TransactionDescriptor, target_chain: &ChainId) -> PactResult<String>;
}
