//! Network context: one resolved network plus its RPC client.
//!
//! A context is passed explicitly to every builder. There is no process-wide
//! default network.

use std::sync::Arc;

use crate::client::http::HttpPactClient;
use crate::client::rpc::PactRpc;
use crate::command::builder::CommandBuilder;
use crate::command::types::{ChainId, ContPayload, Meta};
use crate::config::{NetworkConfig, TxkitConfig};
use crate::error::{PactError, PactResult};
use crate::signing::wallet::KeyPairWallet;

/// Everything a command needs from its network: id, defaults, chains, client.
#[derive(Clone)]
pub struct NetworkContext {
    name: String,
    config: NetworkConfig,
    client: Arc<dyn PactRpc>,
}

impl NetworkContext {
    pub fn new(name: impl Into<String>, config: NetworkConfig, client: Arc<dyn PactRpc>) -> Self {
        Self {
            name: name.into(),
            config,
            client,
        }
    }

    /// Resolve a network from configuration and build its HTTP client.
    ///
    /// `network` falls back to `default_network`; an unknown name is a
    /// configuration error.
    pub fn from_config(config: &TxkitConfig, network: Option<&str>) -> PactResult<Arc<Self>> {
        let name = network.unwrap_or(&config.default_network);
        let network_config = config
            .networks
            .get(name)
            .ok_or_else(|| PactError::Config(format!("Unknown network '{}'", name)))?
            .clone();

        let client = HttpPactClient::new(&network_config)?;
        tracing::info!(
            network = %name,
            network_id = %network_config.network_id,
            chains = network_config.chain_ids.len(),
            "Network context resolved"
        );
        Ok(Arc::new(Self::new(name, network_config, Arc::new(client))))
    }

    /// Configuration name of the network (e.g. "devnet").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Network id written into commands (e.g. "development").
    pub fn network_id(&self) -> &str {
        &self.config.network_id
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Every chain of the network, in configuration order.
    pub fn chain_ids(&self) -> Vec<ChainId> {
        self.config.chain_ids()
    }

    pub fn client(&self) -> Arc<dyn PactRpc> {
        Arc::clone(&self.client)
    }

    /// Fresh metadata from the network's defaults.
    pub fn meta(&self) -> Meta {
        self.config.meta.to_meta()
    }

    /// Load the wallet configured for `account`.
    pub fn key_pair(&self, account: &str) -> PactResult<KeyPairWallet> {
        let key_pair = self.config.key_pair(account).ok_or_else(|| {
            PactError::Config(format!(
                "No key pair for account '{}' on network '{}'",
                account, self.name
            ))
        })?;
        let var = key_pair.secret_key_env.as_deref().ok_or_else(|| {
            PactError::Config(format!("Key pair '{}' has no secret_key_env", account))
        })?;

        let wallet = KeyPairWallet::from_env(var, Some(account.to_string()))?;
        if wallet.public_key() != key_pair.public_key.to_lowercase() {
            return Err(PactError::Wallet(format!(
                "Secret key in {} does not match the public key configured for '{}'",
                var, account
            )));
        }
        Ok(wallet)
    }

    /// Builder for an `exec` command on this network.
    pub fn execution(self: &Arc<Self>, code: impl Into<String>) -> CommandBuilder {
        CommandBuilder::execution(Arc::clone(self), code)
    }

    /// Builder for a continuation step on this network.
    pub fn continuation(self: &Arc<Self>, cont: ContPayload) -> CommandBuilder {
        CommandBuilder::continuation(Arc::clone(self), cont)
    }
}

impl std::fmt::Debug for NetworkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkContext")
            .field("name", &self.name)
            .field("network_id", &self.config.network_id)
            .field("chains", &self.config.chain_ids.len())
            .finish()
    }
}
