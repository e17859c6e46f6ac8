//! Shared fixtures for unit tests.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::client::network::NetworkContext;
use crate::client::rpc::PactRpc;
use crate::client::types::{
    ChainTarget, CommandOutcome, LocalOptions, LocalPactTransactionResult, TransactionDescriptor,
    TransactionResult,
};
use crate::command::transaction::{PartiallySignedTransaction, Transaction};
use crate::command::types::{ChainId, Command, ExecPayload, Meta, Payload, Signer};
use crate::config::NetworkConfig;
use crate::error::PactResult;
use crate::signing::wallet::KeyPairWallet;

/// Deterministic wallet: the seed is `n` repeated.
pub fn wallet(n: u8) -> KeyPairWallet {
    KeyPairWallet::from_seed([n; 32], None)
}

/// Fixed exec command with one GAS signer per wallet, in the given order.
pub fn exec_command(signers: &[&KeyPairWallet]) -> Command {
    let meta = Meta {
        chain_id: "0".into(),
        creation_time: 1_700_000_000,
        sender: "gas-payer".into(),
        ..Meta::default()
    };
    let payload = Payload::Exec(ExecPayload {
        code: "(+ 1 2)".into(),
        data: Default::default(),
    });
    let mut command = Command::new(payload, "development", meta);
    command.nonce = "test-nonce".into();
    for wallet in signers {
        let mut signer = Signer::new(wallet.public_key());
        signer.clist.push(crate::command::capability::CapabilityFactory.gas());
        command.signers.push(signer);
    }
    command
}

/// Context for the default devnet backed by a fresh [`RecordingRpc`].
pub fn context() -> Arc<NetworkContext> {
    context_with(Arc::new(RecordingRpc::default()))
}

pub fn context_with(rpc: Arc<RecordingRpc>) -> Arc<NetworkContext> {
    let config = NetworkConfig {
        chain_ids: vec!["0".into(), "1".into(), "2".into()],
        ..NetworkConfig::default()
    };
    Arc::new(NetworkContext::new("devnet", config, rpc))
}

/// In-memory node. Records every call as `op:chain[:key]` and answers
/// success, unless the code contains `(error`.
#[derive(Default)]
pub struct RecordingRpc {
    events: Mutex<Vec<String>>,
    sent: Mutex<HashMap<String, Command>>,
}

impl RecordingRpc {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn answer(request_key: &str, command: &Command) -> TransactionResult {
        let failing = matches!(&command.payload, Payload::Exec(exec) if exec.code.contains("(error"));
        let result = if failing {
            CommandOutcome::Failure {
                error: json!({"message": "boom"}),
            }
        } else {
            CommandOutcome::Success {
                data: json!(command.meta.chain_id.as_str()),
            }
        };
        let continuation = match &command.payload {
            Payload::Exec(_) => Some(json!({"pactId": request_key, "step": 0})),
            Payload::Cont(cont) => Some(json!({"pactId": cont.pact_id, "step": cont.step})),
        };
        TransactionResult {
            req_key: request_key.to_string(),
            tx_id: Some(1),
            result,
            gas: 10,
            logs: None,
            meta_data: None,
            continuation,
            events: Vec::new(),
        }
    }
}

#[async_trait]
impl PactRpc for RecordingRpc {
    async fn local(
        &self,
        target: &ChainTarget,
        tx: &PartiallySignedTransaction,
        options: LocalOptions,
    ) -> PactResult<LocalPactTransactionResult> {
        let op = if options.preflight { "preflight" } else { "local" };
        self.record(format!("{}:{}", op, target.chain_id));
        let command = tx.command()?;
        let preflight_warnings = if options.preflight {
            vec!["Gas price is high".to_string()]
        } else {
            Vec::new()
        };
        Ok(LocalPactTransactionResult {
            result: Self::answer(tx.hash(), &command),
            preflight_warnings,
        })
    }

    async fn send(&self, target: &ChainTarget, txs: &[Transaction]) -> PactResult<Vec<String>> {
        let mut keys = Vec::new();
        for tx in txs {
            self.record(format!("send:{}:{}", target.chain_id, tx.hash()));
            self.sent
                .lock()
                .unwrap()
                .insert(tx.hash().to_string(), tx.command()?);
            keys.push(tx.hash().to_string());
        }
        Ok(keys)
    }

    async fn listen(&self, descriptor: &TransactionDescriptor) -> PactResult<TransactionResult> {
        self.record(format!("listen:{}:{}", descriptor.chain_id, descriptor.request_key));
        let command = self.sent.lock().unwrap().get(&descriptor.request_key).cloned();
        match command {
            Some(command) => Ok(Self::answer(&descriptor.request_key, &command)),
            None => Err(crate::error::PactError::Transport(format!(
                "unknown request key {}",
                descriptor.request_key
            ))),
        }
    }

    async fn poll(
        &self,
        target: &ChainTarget,
        request_keys: &[String],
    ) -> PactResult<HashMap<String, TransactionResult>> {
        self.record(format!("poll:{}", target.chain_id));
        let sent = self.sent.lock().unwrap();
        Ok(request_keys
            .iter()
            .filter_map(|key| sent.get(key).map(|c| (key.clone(), Self::answer(key, c))))
            .collect())
    }

    async fn spv(&self, descriptor: &TransactionDescriptor, target_chain: &ChainId) -> PactResult<String> {
        self.record(format!("spv:{}:{}", descriptor.chain_id, target_chain));
        Ok(format!("proof:{}:{}", descriptor.request_key, target_chain))
    }
}
