//! Request targets, descriptors and command results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::types::ChainId;
use crate::error::{PactError, PactResult};

/// Where a request goes: a network and one of its chains.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainTarget {
    pub network_id: String,
    pub chain_id: ChainId,
}

impl ChainTarget {
    pub fn new(network_id: impl Into<String>, chain_id: impl Into<ChainId>) -> Self {
        Self {
            network_id: network_id.into(),
            chain_id: chain_id.into(),
        }
    }
}

/// Handle of a submitted transaction, used to listen or poll for its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDescriptor {
    pub request_key: String,
    pub chain_id: ChainId,
    pub network_id: String,
}

impl TransactionDescriptor {
    pub fn target(&self) -> ChainTarget {
        ChainTarget {
            network_id: self.network_id.clone(),
            chain_id: self.chain_id.clone(),
        }
    }
}

/// Flags of a `/local` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalOptions {
    pub preflight: bool,
    pub signature_verification: bool,
}

impl LocalOptions {
    /// Speculative read: no signature checks, no preflight.
    pub fn dirty_read() -> Self {
        Self {
            preflight: false,
            signature_verification: false,
        }
    }

    pub fn verified() -> Self {
        Self {
            preflight: false,
            signature_verification: true,
        }
    }

    pub fn preflight() -> Self {
        Self {
            preflight: true,
            signature_verification: true,
        }
    }
}

/// Outcome reported by the chain for one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CommandOutcome {
    Success {
        #[serde(default)]
        data: Value,
    },
    Failure {
        #[serde(default)]
        error: Value,
    },
}

/// Block the command was included in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockMetadata {
    pub block_hash: Option<String>,
    pub block_height: Option<u64>,
    pub block_time: Option<u64>,
    pub prev_block_hash: Option<String>,
}

/// Terminal result of a command (`/local`, `/listen`, `/poll`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub req_key: String,
    #[serde(default)]
    pub tx_id: Option<u64>,
    pub result: CommandOutcome,
    #[serde(default)]
    pub gas: u64,
    #[serde(default)]
    pub logs: Option<String>,
    #[serde(default)]
    pub meta_data: Option<BlockMetadata>,
    #[serde(default)]
    pub continuation: Option<Value>,
    #[serde(default)]
    pub events: Vec<Value>,
}

impl TransactionResult {
    pub fn is_success(&self) -> bool {
        matches!(self.result, CommandOutcome::Success { .. })
    }

    /// Turn a `failure` outcome into [`PactError::ChainFailure`].
    pub fn ensure_success(self, chain_id: &ChainId) -> PactResult<Self> {
        match &self.result {
            CommandOutcome::Success { .. } => Ok(self),
            CommandOutcome::Failure { error } => Err(PactError::ChainFailure {
                chain_id: chain_id.to_string(),
                request_key: Some(self.req_key.clone()),
                error: error.clone(),
            }),
        }
    }

    /// Success data, or the chain's failure as an error.
    pub fn into_data(self, chain_id: &ChainId) -> PactResult<Value> {
        match self.result {
            CommandOutcome::Success { data } => Ok(data),
            CommandOutcome::Failure { error } => Err(PactError::ChainFailure {
                chain_id: chain_id.to_string(),
                request_key: Some(self.req_key),
                error,
            }),
        }
    }

    /// Id of the multi-step pact this command started or continued.
    pub fn pact_id(&self) -> Option<&str> {
        self.continuation.as_ref()?.get("pactId")?.as_str()
    }

    /// Step this result completed, for continuations.
    pub fn pact_step(&self) -> Option<u32> {
        self.continuation
            .as_ref()?
            .get("step")?
            .as_u64()
            .and_then(|s| u32::try_from(s).ok())
    }
}

/// `/local` result plus preflight warnings (empty unless preflight was requested).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPactTransactionResult {
    pub result: TransactionResult,
    #[serde(default)]
    pub preflight_warnings: Vec<String>,
}
