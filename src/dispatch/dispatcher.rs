//! Single-chain and fan-out dispatch of a built command.

use futures_util::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;

use crate::client::network::NetworkContext;
use crate::client::types::{
    ChainTarget, LocalOptions, LocalPactTransactionResult, TransactionDescriptor, TransactionResult,
};
use crate::command::transaction::{PartiallySignedTransaction, Transaction};
use crate::command::types::{ChainId, Command};
use crate::dispatch::finalize::Finalizer;
use crate::dispatch::submit::{
    preflight_transaction, submit_and_listen_transactions, submit_transaction, SubmitOptions,
};
use crate::error::{PactError, PactResult};
use crate::observability::metrics;

/// A finished command plus the strategy that signs it.
///
/// Single-chain operations use the command's chain id, `*_on` operations fan
/// out to the given chains and `*_all` operations to every chain of the
/// network. Each chain gets its own copy of the command, so envelopes differ
/// in `meta.chainId`, hash and signatures.
#[derive(Debug)]
pub struct Dispatcher {
    command: Command,
    context: Arc<NetworkContext>,
    finalizer: Finalizer,
}

impl Dispatcher {
    pub(crate) fn new(command: Command, context: Arc<NetworkContext>, finalizer: Finalizer) -> Self {
        Self {
            command,
            context,
            finalizer,
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn context(&self) -> &Arc<NetworkContext> {
        &self.context
    }

    fn single_chain(&self) -> PactResult<ChainId> {
        if self.command.meta.chain_id.is_empty() {
            return Err(PactError::Config(
                "no chain id set; call with_chain_id or use a fan-out operation".to_string(),
            ));
        }
        Ok(self.command.meta.chain_id.clone())
    }

    fn target(&self, chain_id: &ChainId) -> ChainTarget {
        ChainTarget::new(self.command.network_id.clone(), chain_id.clone())
    }

    pub async fn finalize(&self) -> PactResult<PartiallySignedTransaction> {
        let chain_id = self.single_chain()?;
        self.finalize_for(&chain_id).await
    }

    /// Envelope for one chain, independent of every other chain's.
    pub async fn finalize_for(&self, chain_id: &ChainId) -> PactResult<PartiallySignedTransaction> {
        let mut command = self.command.clone();
        command.meta.chain_id = chain_id.clone();
        self.finalizer.finalize(command).await
    }

    pub async fn finalize_on(&self, chains: &[ChainId]) -> PactResult<Vec<PartiallySignedTransaction>> {
        try_join_all(chains.iter().map(|chain_id| self.finalize_for(chain_id))).await
    }

    /// Fully signed envelopes for every chain, or `Unsigned` before any network call.
    async fn signed_on(&self, chains: &[ChainId]) -> PactResult<Vec<Transaction>> {
        self.finalize_on(chains)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    async fn run_local(&self, chain_id: &ChainId, options: LocalOptions) -> PactResult<TransactionResult> {
        let tx = self.finalize_for(chain_id).await?;
        let response = self
            .context
            .client()
            .local(&self.target(chain_id), &tx, options)
            .await?;
        metrics::record_local(chain_id, response.result.is_success());
        tracing::debug!(
            chain_id = %chain_id,
            hash = %tx.hash(),
            success = response.result.is_success(),
            "Local execution finished"
        );
        response.result.ensure_success(chain_id)
    }

    /// Speculative read without signature checks; returns the success data.
    pub async fn dirty_read(&self) -> PactResult<Value> {
        let chain_id = self.single_chain()?;
        self.dirty_read_for(&chain_id).await
    }

    pub async fn dirty_read_on(&self, chains: &[ChainId]) -> PactResult<Vec<Value>> {
        try_join_all(chains.iter().map(|chain_id| self.dirty_read_for(chain_id))).await
    }

    pub async fn dirty_read_all(&self) -> PactResult<Vec<Value>> {
        self.dirty_read_on(&self.context.chain_ids()).await
    }

    async fn dirty_read_for(&self, chain_id: &ChainId) -> PactResult<Value> {
        self.run_local(chain_id, LocalOptions::dirty_read())
            .await?
            .into_data(chain_id)
    }

    /// Local execution with signature verification; returns the full result.
    pub async fn local(&self) -> PactResult<TransactionResult> {
        let chain_id = self.single_chain()?;
        self.run_local(&chain_id, LocalOptions::verified()).await
    }

    pub async fn local_on(&self, chains: &[ChainId]) -> PactResult<Vec<TransactionResult>> {
        try_join_all(
            chains
                .iter()
                .map(|chain_id| self.run_local(chain_id, LocalOptions::verified())),
        )
        .await
    }

    pub async fn local_all(&self) -> PactResult<Vec<TransactionResult>> {
        self.local_on(&self.context.chain_ids()).await
    }

    pub async fn preflight(&self) -> PactResult<LocalPactTransactionResult> {
        let chain_id = self.single_chain()?;
        let mut results = self.preflight_on(std::slice::from_ref(&chain_id)).await?;
        results
            .pop()
            .ok_or_else(|| PactError::InvalidTransaction("no preflight result".to_string()))
    }

    pub async fn preflight_on(&self, chains: &[ChainId]) -> PactResult<Vec<LocalPactTransactionResult>> {
        let txs = self.signed_on(chains).await?;
        let rpc = self.context.client();
        try_join_all(txs.iter().map(|tx| preflight_transaction(rpc.as_ref(), tx))).await
    }

    pub async fn preflight_all(&self) -> PactResult<Vec<LocalPactTransactionResult>> {
        self.preflight_on(&self.context.chain_ids()).await
    }

    /// Send without waiting for the result.
    pub async fn submit(&self, options: SubmitOptions) -> PactResult<TransactionDescriptor> {
        let chain_id = self.single_chain()?;
        let mut descriptors = self.submit_on(std::slice::from_ref(&chain_id), options).await?;
        descriptors
            .pop()
            .ok_or_else(|| PactError::Transport("send returned no request key".to_string()))
    }

    pub async fn submit_on(
        &self,
        chains: &[ChainId],
        options: SubmitOptions,
    ) -> PactResult<Vec<TransactionDescriptor>> {
        let txs = self.signed_on(chains).await?;
        let rpc = self.context.client();

        if options.sequence {
            let mut descriptors = Vec::with_capacity(txs.len());
            for tx in &txs {
                descriptors.push(submit_transaction(rpc.as_ref(), tx, options.preflight).await?);
            }
            return Ok(descriptors);
        }
        try_join_all(
            txs.iter()
                .map(|tx| submit_transaction(rpc.as_ref(), tx, options.preflight)),
        )
        .await
    }

    pub async fn submit_all(&self, options: SubmitOptions) -> PactResult<Vec<TransactionDescriptor>> {
        self.submit_on(&self.context.chain_ids(), options).await
    }

    /// Send and block until the result is known.
    pub async fn submit_and_listen(&self, options: SubmitOptions) -> PactResult<TransactionResult> {
        let chain_id = self.single_chain()?;
        let mut results = self
            .submit_and_listen_on(std::slice::from_ref(&chain_id), options)
            .await?;
        results
            .pop()
            .ok_or_else(|| PactError::Transport("listen returned no result".to_string()))
    }

    pub async fn submit_and_listen_on(
        &self,
        chains: &[ChainId],
        options: SubmitOptions,
    ) -> PactResult<Vec<TransactionResult>> {
        let txs = self.signed_on(chains).await?;
        submit_and_listen_transactions(self.context.client().as_ref(), &txs, options).await
    }

    pub async fn submit_and_listen_all(&self, options: SubmitOptions) -> PactResult<Vec<TransactionResult>> {
        self.submit_and_listen_on(&self.context.chain_ids(), options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, context_with, wallet, RecordingRpc};

    fn chains(ids: &[u32]) -> Vec<ChainId> {
        ids.iter().map(|&c| ChainId::from(c)).collect()
    }

    #[tokio::test]
    async fn test_fan_out_produces_independent_transactions() {
        let alice = wallet(1);
        let dispatcher = context()
            .execution("(coin.details \"alice\")")
            .with_signer(alice.public_key(), |f| vec![f.gas()])
            .sign(Arc::new(alice));

        let txs = dispatcher.finalize_on(&chains(&[0, 1])).await.unwrap();
        let a = txs[0].command().unwrap();
        let b = txs[1].command().unwrap();

        assert_eq!(a.payload, b.payload);
        assert_eq!(a.signers, b.signers);
        assert_eq!(a.meta.chain_id.as_str(), "0");
        assert_eq!(b.meta.chain_id.as_str(), "1");
        assert_ne!(txs[0].hash(), txs[1].hash());
        assert_ne!(txs[0].sigs()[0].sig, txs[1].sigs()[0].sig);
    }

    #[tokio::test]
    async fn test_dirty_read_returns_data() {
        let rpc = Arc::new(RecordingRpc::default());
        let dispatcher = context_with(rpc.clone())
            .execution("(+ 1 2)")
            .with_chain_id(2u32)
            .build();

        assert_eq!(dispatcher.dirty_read().await.unwrap(), "2");
        assert_eq!(rpc.events(), vec!["local:2"]);
    }

    #[tokio::test]
    async fn test_dirty_read_all_covers_every_chain() {
        let dispatcher = context().execution("(+ 1 2)").build();
        let values = dispatcher.dirty_read_all().await.unwrap();
        assert_eq!(values, vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn test_chain_failure_is_an_error() {
        let dispatcher = context().execution("(error \"nope\")").build();
        match dispatcher.local().await.unwrap_err() {
            PactError::ChainFailure { chain_id, error, .. } => {
                assert_eq!(chain_id, "0");
                assert_eq!(error["message"], "boom");
            }
            other => panic!("expected chain failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_chain_id_is_config_error() {
        let dispatcher = context()
            .execution("(+ 1 2)")
            .with_chain_id("")
            .build();
        assert!(matches!(dispatcher.dirty_read().await, Err(PactError::Config(_))));
        assert_eq!(dispatcher.dirty_read_on(&chains(&[1])).await.unwrap(), vec!["1"]);
    }

    #[tokio::test]
    async fn test_unsigned_submission_never_reaches_network() {
        let rpc = Arc::new(RecordingRpc::default());
        let alice = wallet(1);
        let dispatcher = context_with(rpc.clone())
            .execution("(+ 1 2)")
            .with_signer(alice.public_key(), |f| vec![f.gas()])
            .build();

        let err = dispatcher.submit(SubmitOptions::preflight()).await.unwrap_err();
        assert!(matches!(err, PactError::Unsigned { ref indices } if indices == &vec![0]));
        assert!(matches!(
            dispatcher.preflight().await,
            Err(PactError::Unsigned { .. })
        ));
        assert!(rpc.events().is_empty());
    }

    #[tokio::test]
    async fn test_submit_with_preflight() {
        let rpc = Arc::new(RecordingRpc::default());
        let dispatcher = context_with(rpc.clone())
            .execution("(+ 1 2)")
            .sign(Arc::new(wallet(1)));

        let descriptor = dispatcher.submit(SubmitOptions::preflight()).await.unwrap();
        assert_eq!(descriptor.chain_id.as_str(), "0");
        assert_eq!(descriptor.network_id, "development");

        let events = rpc.events();
        assert_eq!(events[0], "preflight:0");
        assert_eq!(events[1], format!("send:0:{}", descriptor.request_key));
    }

    #[tokio::test]
    async fn test_failing_preflight_blocks_send() {
        let rpc = Arc::new(RecordingRpc::default());
        let dispatcher = context_with(rpc.clone())
            .execution("(error \"nope\")")
            .sign(Arc::new(wallet(1)));

        let err = dispatcher.submit(SubmitOptions::preflight()).await.unwrap_err();
        assert!(matches!(err, PactError::ChainFailure { .. }));
        assert_eq!(rpc.events(), vec!["preflight:0"]);
    }

    #[tokio::test]
    async fn test_preflight_surfaces_warnings() {
        let dispatcher = context().execution("(+ 1 2)").sign(Arc::new(wallet(1)));
        let result = dispatcher.preflight().await.unwrap();
        assert_eq!(result.preflight_warnings, vec!["Gas price is high"]);
        assert!(result.result.is_success());
    }

    #[tokio::test]
    async fn test_submit_and_listen_sequenced_order() {
        let rpc = Arc::new(RecordingRpc::default());
        let dispatcher = context_with(rpc.clone())
            .execution("(+ 1 2)")
            .sign(Arc::new(wallet(1)));

        let results = dispatcher
            .submit_and_listen_on(&chains(&[0, 1]), SubmitOptions::sequenced())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);

        let ops: Vec<String> = rpc
            .events()
            .iter()
            .map(|e| e.split(':').take(2).collect::<Vec<_>>().join(":"))
            .collect();
        assert_eq!(ops, vec!["send:0", "listen:0", "send:1", "listen:1"]);
    }

    #[tokio::test]
    async fn test_submit_and_listen_concurrent_submits_first() {
        let rpc = Arc::new(RecordingRpc::default());
        let dispatcher = context_with(rpc.clone())
            .execution("(+ 1 2)")
            .sign(Arc::new(wallet(1)));

        let results = dispatcher
            .submit_and_listen_all(SubmitOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 3);

        let events = rpc.events();
        let last_send = events.iter().rposition(|e| e.starts_with("send:")).unwrap();
        let first_listen = events.iter().position(|e| e.starts_with("listen:")).unwrap();
        assert!(last_send < first_listen);
    }

    #[tokio::test]
    async fn test_listen_failure_is_an_error() {
        let dispatcher = context()
            .execution("(error \"late\")")
            .sign(Arc::new(wallet(1)));
        let err = dispatcher
            .submit_and_listen(SubmitOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PactError::ChainFailure { request_key: Some(_), .. }));
    }
}
