//! Canonical command model.
//!
//! Field names follow the Pact wire format (camelCase) so that a `Command`
//! serializes directly into the `cmd` string of an envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default gas limit for a command.
pub const DEFAULT_GAS_LIMIT: u64 = 150_000;

/// Default gas price in KDA per unit.
pub const DEFAULT_GAS_PRICE: f64 = 1.0e-8;

/// Default time-to-live in seconds.
pub const DEFAULT_TTL_SECS: u64 = 900;

/// Seconds subtracted from "now" so target nodes with a lagging clock accept
/// the creation time.
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 10;

/// Chain identifier. Pact chains are addressed by decimal strings ("0".."19").
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<u32> for ChainId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ChainId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ChainId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload of a command: a fresh execution or a continuation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Exec(ExecPayload),
    Cont(ContPayload),
}

impl Payload {
    /// Mutable access to the payload's environment data.
    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            Payload::Exec(exec) => &mut exec.data,
            Payload::Cont(cont) => &mut cont.data,
        }
    }

    pub fn data(&self) -> &Map<String, Value> {
        match self {
            Payload::Exec(exec) => &exec.data,
            Payload::Cont(cont) => &cont.data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecPayload {
    pub code: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// A step of a multi-step pact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContPayload {
    pub pact_id: String,
    pub step: u32,
    pub rollback: bool,
    #[serde(default)]
    pub data: Map<String, Value>,
    /// SPV proof, required when the step runs on a different chain.
    /// Always on the wire; `null` for a same-chain step.
    #[serde(default)]
    pub proof: Option<String>,
}

/// Public metadata of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub chain_id: ChainId,
    pub creation_time: u64,
    pub gas_limit: u64,
    pub gas_price: f64,
    pub sender: String,
    pub ttl: u64,
}

impl Meta {
    /// Metadata with system defaults, created "now" minus the clock skew.
    pub fn with_clock_skew(skew_secs: u64) -> Self {
        Self {
            chain_id: ChainId::default(),
            creation_time: unix_now().saturating_sub(skew_secs),
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            sender: String::new(),
            ttl: DEFAULT_TTL_SECS,
        }
    }
}

impl Default for Meta {
    fn default() -> Self {
        Self::with_clock_skew(DEFAULT_CLOCK_SKEW_SECS)
    }
}

/// Partial metadata update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct MetaPatch {
    pub chain_id: Option<ChainId>,
    pub creation_time: Option<u64>,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<f64>,
    pub sender: Option<String>,
    pub ttl: Option<u64>,
}

impl MetaPatch {
    pub fn apply(self, meta: &mut Meta) {
        if let Some(chain_id) = self.chain_id {
            meta.chain_id = chain_id;
        }
        if let Some(creation_time) = self.creation_time {
            meta.creation_time = creation_time;
        }
        if let Some(gas_limit) = self.gas_limit {
            meta.gas_limit = gas_limit;
        }
        if let Some(gas_price) = self.gas_price {
            meta.gas_price = gas_price;
        }
        if let Some(sender) = self.sender {
            meta.sender = sender;
        }
        if let Some(ttl) = self.ttl {
            meta.ttl = ttl;
        }
    }
}

/// Signature scheme of a signer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureScheme {
    #[serde(rename = "ED25519")]
    Ed25519,
    #[serde(rename = "WebAuthn")]
    WebAuthn,
}

/// A named, argument-scoped authorization granted by a signer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Capability {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// A declared signer. Its position in `Command::signers` fixes its signature slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub pub_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<SignatureScheme>,
    #[serde(rename = "addr", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clist: Vec<Capability>,
}

impl Signer {
    pub fn new(pub_key: impl Into<String>) -> Self {
        Self {
            pub_key: pub_key.into(),
            scheme: None,
            address: None,
            clist: Vec::new(),
        }
    }
}

/// Signer descriptor accepted by the builder: a bare key or key plus scheme/address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerKey {
    pub pub_key: String,
    pub scheme: Option<SignatureScheme>,
    pub address: Option<String>,
}

impl SignerKey {
    pub fn new(pub_key: impl Into<String>) -> Self {
        Self {
            pub_key: pub_key.into(),
            scheme: None,
            address: None,
        }
    }

    pub fn with_scheme(mut self, scheme: SignatureScheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

impl From<&str> for SignerKey {
    fn from(pub_key: &str) -> Self {
        Self::new(pub_key)
    }
}

impl From<String> for SignerKey {
    fn from(pub_key: String) -> Self {
        Self::new(pub_key)
    }
}

/// A non-key verifier (e.g. a ZK or bridge proof) with its own capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verifier {
    pub name: String,
    pub proof: Value,
    #[serde(default)]
    pub clist: Vec<Capability>,
}

/// Keyset stored in the payload data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyset {
    pub keys: Vec<String>,
    pub pred: String,
}

impl Keyset {
    pub fn keys_all(keys: Vec<String>) -> Self {
        Self {
            keys,
            pred: "keys-all".to_string(),
        }
    }

    pub fn keys_any(keys: Vec<String>) -> Self {
        Self {
            keys,
            pred: "keys-any".to_string(),
        }
    }

    pub fn keys_two(keys: Vec<String>) -> Self {
        Self {
            keys,
            pred: "keys-2".to_string(),
        }
    }
}

/// The logical transaction before serialization and signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub payload: Payload,
    pub meta: Meta,
    pub signers: Vec<Signer>,
    pub network_id: String,
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verifiers: Vec<Verifier>,
}

impl Command {
    pub fn new(payload: Payload, network_id: impl Into<String>, meta: Meta) -> Self {
        Self {
            payload,
            meta,
            signers: Vec::new(),
            network_id: network_id.into(),
            nonce: default_nonce(),
            verifiers: Vec::new(),
        }
    }

    /// Index of the signer with the given public key.
    pub fn signer_index(&self, pub_key: &str) -> Option<usize> {
        self.signers.iter().position(|s| s.pub_key == pub_key)
    }
}

/// Time-based unique nonce.
pub fn default_nonce() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("txkit:{}:{:08x}", millis, fastrand::u32(..))
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
