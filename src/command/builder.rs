//! Fluent command builder.
//!
//! A builder owns one [`Command`] seeded from its network context. Every
//! configuration method consumes and returns the builder; the terminal methods
//! (`build`, `sign`, `multi_sign`) hand the command to a [`Dispatcher`]
//! together with the strategy that turns it into an envelope.

use serde_json::Value;
use std::sync::Arc;

use crate::client::network::NetworkContext;
use crate::command::capability::CapabilityFactory;
use crate::command::types::{
    Capability, ChainId, Command, ContPayload, ExecPayload, Keyset, MetaPatch, Payload, Signer,
    SignerKey, Verifier,
};
use crate::dispatch::{Dispatcher, Finalizer};
use crate::error::{PactError, PactResult};
use crate::signing::wallet::SigningAuthority;

/// What happens to capabilities when a signer key is declared twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapabilityMerge {
    /// Last declaration wins; earlier capabilities for the key are dropped.
    #[default]
    Replace,
    /// Append capabilities the signer does not already grant.
    Accumulate,
}

/// Accumulates a command for one network.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    command: Command,
    context: Arc<NetworkContext>,
}

impl CommandBuilder {
    /// Builder for Pact code executed in one step.
    pub fn execution(context: Arc<NetworkContext>, code: impl Into<String>) -> Self {
        let payload = Payload::Exec(ExecPayload {
            code: code.into(),
            data: Default::default(),
        });
        Self::with_payload(context, payload)
    }

    /// Builder for the next (or rollback) step of a multi-step pact.
    pub fn continuation(context: Arc<NetworkContext>, cont: ContPayload) -> Self {
        Self::with_payload(context, Payload::Cont(cont))
    }

    fn with_payload(context: Arc<NetworkContext>, payload: Payload) -> Self {
        let command = Command::new(payload, context.network_id(), context.meta());
        Self { command, context }
    }

    /// Add a value to the payload's environment data.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.command.payload.data_mut().insert(key.into(), value.into());
        self
    }

    /// Add a named keyset to the payload data.
    ///
    /// A keyset guards an account that someone has to fund, so the command
    /// must already name its gas payer.
    pub fn with_keyset(mut self, name: impl Into<String>, keyset: Keyset) -> PactResult<Self> {
        let name = name.into();
        if self.command.meta.sender.is_empty() {
            return Err(PactError::Config(format!(
                "keyset '{}' requires a sender; call with_sender or with_meta first",
                name
            )));
        }
        let value = serde_json::to_value(keyset)?;
        self.command.payload.data_mut().insert(name, value);
        Ok(self)
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<ChainId>) -> Self {
        self.command.meta.chain_id = chain_id.into();
        self
    }

    /// Overwrite the metadata fields set in `patch`.
    pub fn with_meta(mut self, patch: MetaPatch) -> Self {
        patch.apply(&mut self.command.meta);
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.command.meta.sender = sender.into();
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.command.meta.gas_limit = gas_limit;
        self
    }

    pub fn with_gas_price(mut self, gas_price: f64) -> Self {
        self.command.meta.gas_price = gas_price;
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.command.meta.ttl = ttl;
        self
    }

    pub fn with_creation_time(mut self, creation_time: u64) -> Self {
        self.command.meta.creation_time = creation_time;
        self
    }

    /// Declare a signer and the capabilities it grants.
    ///
    /// Re-declaring a key replaces its capability list.
    pub fn with_signer<F>(self, key: impl Into<SignerKey>, declare: F) -> Self
    where
        F: FnOnce(&CapabilityFactory) -> Vec<Capability>,
    {
        self.with_signer_merged(key, CapabilityMerge::Replace, declare)
    }

    /// Declare a signer whose signature is not scoped to any capability.
    pub fn with_unrestricted_signer(self, key: impl Into<SignerKey>) -> Self {
        self.with_signer(key, |_| Vec::new())
    }

    /// Declare a signer with an explicit policy for an already declared key.
    pub fn with_signer_merged<F>(
        mut self,
        key: impl Into<SignerKey>,
        merge: CapabilityMerge,
        declare: F,
    ) -> Self
    where
        F: FnOnce(&CapabilityFactory) -> Vec<Capability>,
    {
        let key = key.into();
        let capabilities = declare(&CapabilityFactory);

        let Some(index) = self.command.signer_index(&key.pub_key) else {
            self.command.signers.push(Signer {
                pub_key: key.pub_key,
                scheme: key.scheme,
                address: key.address,
                clist: capabilities,
            });
            return self;
        };

        let signer = &mut self.command.signers[index];
        if key.scheme.is_some() {
            signer.scheme = key.scheme;
        }
        if key.address.is_some() {
            signer.address = key.address;
        }

        match merge {
            CapabilityMerge::Replace => {
                let dropped = signer
                    .clist
                    .iter()
                    .filter(|c| !capabilities.contains(c))
                    .count();
                if dropped > 0 {
                    tracing::warn!(
                        pub_key = %signer.pub_key,
                        dropped,
                        "Signer re-declared, previous capabilities replaced"
                    );
                }
                signer.clist = capabilities;
            }
            CapabilityMerge::Accumulate => {
                for capability in capabilities {
                    if !signer.clist.contains(&capability) {
                        signer.clist.push(capability);
                    }
                }
            }
        }
        self
    }

    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.command.verifiers.push(verifier);
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.command.nonce = nonce.into();
        self
    }

    pub fn with_network_id(mut self, network_id: impl Into<String>) -> Self {
        self.command.network_id = network_id.into();
        self
    }

    /// The command as configured so far.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Dispatch without signing.
    pub fn build(self) -> Dispatcher {
        Dispatcher::new(self.command, self.context, Finalizer::Unsigned)
    }

    /// Dispatch signed by one authority.
    ///
    /// Without declared signers the authority's key is added as a GAS-only
    /// signer and, if unset, its address becomes the sender.
    pub fn sign(self, authority: Arc<dyn SigningAuthority>) -> Dispatcher {
        Dispatcher::new(self.command, self.context, Finalizer::Single(authority))
    }

    /// Dispatch signed by several independent authorities.
    pub fn multi_sign(self, authorities: Vec<Arc<dyn SigningAuthority>>) -> Dispatcher {
        Dispatcher::new(self.command, self.context, Finalizer::Multi(authorities))
    }
}
