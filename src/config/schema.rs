//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the toolkit.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::command::types::{
    ChainId, Meta, DEFAULT_CLOCK_SKEW_SECS, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, DEFAULT_TTL_SECS,
};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TxkitConfig {
    /// Network used when none is named explicitly.
    pub default_network: String,

    /// Known networks by name.
    pub networks: BTreeMap<String, NetworkConfig>,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for TxkitConfig {
    fn default() -> Self {
        let mut networks = BTreeMap::new();
        networks.insert("devnet".to_string(), NetworkConfig::default());
        networks.insert(
            "testnet".to_string(),
            NetworkConfig {
                network_id: "testnet04".to_string(),
                rpc_url: "https://api.testnet.chainweb.com".to_string(),
                ..NetworkConfig::default()
            },
        );
        networks.insert(
            "mainnet".to_string(),
            NetworkConfig {
                network_id: "mainnet01".to_string(),
                rpc_url: "https://api.chainweb.com".to_string(),
                ..NetworkConfig::default()
            },
        );
        Self {
            default_network: "devnet".to_string(),
            networks,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// URL layout of the node's Pact API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiStyle {
    /// `/chainweb/0.0/{network}/chain/{chain}/pact/api/v1/...`
    Chainweb,
    /// Single-chain Pact server: `/api/v1/...`
    PactServer,
}

/// One target network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network id written into every command (e.g. "mainnet01").
    pub network_id: String,

    /// Node base URL.
    pub rpc_url: String,

    /// Failover base URLs, tried in order after `rpc_url`.
    pub failover_urls: Vec<String>,

    pub api_style: ApiStyle,

    /// Chains addressed by fan-out operations.
    pub chain_ids: Vec<String>,

    /// Timeout for local/send/poll/spv requests in seconds.
    pub rpc_timeout_secs: u64,

    /// Timeout for a blocking listen in seconds.
    pub listen_timeout_secs: u64,

    /// Defaults for new commands.
    pub meta: MetaDefaults,

    /// Signing keys available by account name.
    pub key_pairs: Vec<KeyPairConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network_id: "development".to_string(),
            rpc_url: "http://localhost:8080".to_string(),
            failover_urls: Vec::new(),
            api_style: ApiStyle::Chainweb,
            chain_ids: (0..20).map(|c: u32| c.to_string()).collect(),
            rpc_timeout_secs: 30,
            listen_timeout_secs: 180,
            meta: MetaDefaults::default(),
            key_pairs: Vec::new(),
        }
    }
}

impl NetworkConfig {
    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.chain_ids.iter().map(|c| ChainId::from(c.as_str())).collect()
    }

    pub fn key_pair(&self, account: &str) -> Option<&KeyPairConfig> {
        self.key_pairs.iter().find(|k| k.account == account)
    }
}

/// Metadata defaults applied when a command is created.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetaDefaults {
    /// Chain used by single-chain operations unless the builder sets one.
    pub chain_id: Option<String>,
    pub gas_limit: u64,
    pub gas_price: f64,
    pub ttl: u64,
    pub sender: String,
    /// Seconds subtracted from "now" for `creationTime`.
    pub clock_skew_secs: u64,
}

impl Default for MetaDefaults {
    fn default() -> Self {
        Self {
            chain_id: Some("0".to_string()),
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            ttl: DEFAULT_TTL_SECS,
            sender: String::new(),
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
        }
    }
}

impl MetaDefaults {
    /// Fresh metadata stamped with the current (skewed) creation time.
    pub fn to_meta(&self) -> Meta {
        let mut meta = Meta::with_clock_skew(self.clock_skew_secs);
        meta.chain_id = self.chain_id.as_deref().map(ChainId::from).unwrap_or_default();
        meta.gas_limit = self.gas_limit;
        meta.gas_price = self.gas_price;
        meta.ttl = self.ttl;
        meta.sender = self.sender.clone();
        meta
    }
}

/// Key material reference. The secret itself lives in an environment variable.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyPairConfig {
    /// Account name the key signs for.
    pub account: String,

    /// Hex-encoded ED25519 public key.
    pub public_key: String,

    /// Environment variable holding the hex-encoded secret key.
    #[serde(default)]
    pub secret_key_env: Option<String>,
}
