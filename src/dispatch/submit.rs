//! Submission pipeline over already finalized transactions.
//!
//! These functions back the [`Dispatcher`](crate::dispatch::Dispatcher) and are
//! public for callers holding pre-signed transactions, such as the steps of a
//! cross-chain continuation saga.

use futures_util::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::client::network::NetworkContext;
use crate::client::rpc::PactRpc;
use crate::client::types::{
    ChainTarget, LocalOptions, LocalPactTransactionResult, TransactionDescriptor, TransactionResult,
};
use crate::command::builder::CommandBuilder;
use crate::command::transaction::{PartiallySignedTransaction, Transaction};
use crate::command::types::{ChainId, ContPayload};
use crate::error::{PactError, PactResult};
use crate::observability::metrics;

/// Options for submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Run a preflight before sending; a failing preflight aborts the send.
    pub preflight: bool,
    /// Submit and await transactions one at a time, in order.
    pub sequence: bool,
}

impl SubmitOptions {
    pub fn preflight() -> Self {
        Self {
            preflight: true,
            sequence: false,
        }
    }

    pub fn sequenced() -> Self {
        Self {
            preflight: false,
            sequence: true,
        }
    }
}

/// Network and chain a transaction was built for.
pub fn target_of(tx: &Transaction) -> PactResult<ChainTarget> {
    let command = tx.command()?;
    if command.meta.chain_id.is_empty() {
        return Err(PactError::InvalidTransaction(format!(
            "transaction {} has no chain id",
            tx.hash()
        )));
    }
    Ok(ChainTarget::new(command.network_id, command.meta.chain_id))
}

/// Local execution of a signed transaction, returning warnings alongside the result.
pub async fn preflight_transaction(
    rpc: &dyn PactRpc,
    tx: &Transaction,
) -> PactResult<LocalPactTransactionResult> {
    let target = target_of(tx)?;
    let envelope = PartiallySignedTransaction::from(tx.clone());
    let LocalPactTransactionResult {
        result,
        preflight_warnings,
    } = rpc.local(&target, &envelope, LocalOptions::preflight()).await?;

    metrics::record_local(&target.chain_id, result.is_success());
    for warning in &preflight_warnings {
        tracing::warn!(
            chain_id = %target.chain_id,
            hash = %tx.hash(),
            warning = %warning,
            "Preflight warning"
        );
    }

    let result = result.ensure_success(&target.chain_id)?;
    tracing::debug!(chain_id = %target.chain_id, hash = %tx.hash(), gas = result.gas, "Preflight passed");
    Ok(LocalPactTransactionResult {
        result,
        preflight_warnings,
    })
}

/// Send one transaction without waiting for its result.
pub async fn submit_transaction(
    rpc: &dyn PactRpc,
    tx: &Transaction,
    preflight: bool,
) -> PactResult<TransactionDescriptor> {
    let target = target_of(tx)?;
    if preflight {
        preflight_transaction(rpc, tx).await?;
    }

    let request_key = rpc
        .send(&target, std::slice::from_ref(tx))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| PactError::Transport("send returned no request key".to_string()))?;

    metrics::record_submit(&target.chain_id);
    tracing::info!(
        chain_id = %target.chain_id,
        request_key = %request_key,
        "Transaction submitted"
    );
    Ok(TransactionDescriptor {
        request_key,
        chain_id: target.chain_id,
        network_id: target.network_id,
    })
}

/// Block until the submitted transaction has a result; failures become errors.
pub async fn listen_transaction(
    rpc: &dyn PactRpc,
    descriptor: &TransactionDescriptor,
) -> PactResult<TransactionResult> {
    let started = Instant::now();
    let result = rpc.listen(descriptor).await?;
    metrics::record_listen(&descriptor.chain_id, result.is_success(), started.elapsed());

    tracing::info!(
        chain_id = %descriptor.chain_id,
        request_key = %descriptor.request_key,
        success = result.is_success(),
        gas = result.gas,
        "Transaction result received"
    );
    result.ensure_success(&descriptor.chain_id)
}

/// Submit transactions and wait for every result.
///
/// With `sequence`, each transaction is submitted only after the previous one
/// has a successful result. Otherwise all are submitted first and then awaited
/// concurrently. Results come back in input order.
pub async fn submit_and_listen_transactions(
    rpc: &dyn PactRpc,
    txs: &[Transaction],
    options: SubmitOptions,
) -> PactResult<Vec<TransactionResult>> {
    if options.sequence {
        let mut results = Vec::with_capacity(txs.len());
        for (step, tx) in txs.iter().enumerate() {
            tracing::debug!(step, hash = %tx.hash(), "Submitting sequenced transaction");
            let descriptor = submit_transaction(rpc, tx, options.preflight).await?;
            results.push(listen_transaction(rpc, &descriptor).await?);
        }
        return Ok(results);
    }

    let descriptors = try_join_all(
        txs.iter()
            .map(|tx| submit_transaction(rpc, tx, options.preflight)),
    )
    .await?;
    try_join_all(descriptors.iter().map(|d| listen_transaction(rpc, d))).await
}

/// Poll several request keys, one request per chain.
///
/// Results are returned as reported; pending keys are absent from the map.
pub async fn poll_transactions(
    rpc: &dyn PactRpc,
    descriptors: &[TransactionDescriptor],
) -> PactResult<HashMap<String, TransactionResult>> {
    let mut by_target: HashMap<ChainTarget, Vec<String>> = HashMap::new();
    for descriptor in descriptors {
        by_target
            .entry(descriptor.target())
            .or_default()
            .push(descriptor.request_key.clone());
    }

    let answers = try_join_all(
        by_target
            .iter()
            .map(|(target, keys)| rpc.poll(target, keys)),
    )
    .await?;
    Ok(answers.into_iter().flatten().collect())
}

/// SPV proof that `descriptor`'s transaction happened, verifiable on `target_chain`.
pub async fn spv_proof(
    rpc: &dyn PactRpc,
    descriptor: &TransactionDescriptor,
    target_chain: &ChainId,
) -> PactResult<String> {
    let proof = rpc.spv(descriptor, target_chain).await?;
    tracing::debug!(
        request_key = %descriptor.request_key,
        source_chain = %descriptor.chain_id,
        target_chain = %target_chain,
        "SPV proof retrieved"
    );
    Ok(proof)
}

/// Builder for the next step of a cross-chain pact, proof included.
///
/// `result` is the finished step reported for `descriptor`.
pub async fn cross_chain_continuation(
    context: &Arc<NetworkContext>,
    descriptor: &TransactionDescriptor,
    result: &TransactionResult,
    target_chain: impl Into<ChainId>,
) -> PactResult<CommandBuilder> {
    let target_chain = target_chain.into();
    let pact_id = result.pact_id().ok_or_else(|| {
        PactError::InvalidTransaction(format!(
            "result for {} carries no pact continuation",
            descriptor.request_key
        ))
    })?;
    let step = result
        .pact_step()
        .and_then(|step| step.checked_add(1))
        .ok_or_else(|| {
            PactError::InvalidTransaction(format!(
                "result for {} has no continuable pact step",
                descriptor.request_key
            ))
        })?;
    let proof = spv_proof(context.client().as_ref(), descriptor, &target_chain).await?;

    Ok(context
        .continuation(ContPayload {
            pact_id: pact_id.to_string(),
            step,
            rollback: false,
            data: Default::default(),
            proof: Some(proof),
        })
        .with_chain_id(target_chain))
}
