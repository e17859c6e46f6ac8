//! Finalization strategies installed by the builder's terminal methods.

use std::sync::Arc;

use crate::command::capability::CapabilityFactory;
use crate::command::transaction::PartiallySignedTransaction;
use crate::command::types::{Command, Signer};
use crate::error::PactResult;
use crate::signing::coordinator::{collect_signatures, sign_with};
use crate::signing::wallet::SigningAuthority;

/// Turns a command into an envelope.
#[derive(Clone)]
pub enum Finalizer {
    /// Serialize only.
    Unsigned,
    /// Serialize and sign with one authority.
    Single(Arc<dyn SigningAuthority>),
    /// Serialize and collect signatures from every authority.
    Multi(Vec<Arc<dyn SigningAuthority>>),
}

impl Finalizer {
    pub async fn finalize(&self, command: Command) -> PactResult<PartiallySignedTransaction> {
        match self {
            Finalizer::Unsigned => PartiallySignedTransaction::from_command(&command),
            Finalizer::Single(authority) => {
                let mut command = command;
                if command.signers.is_empty() {
                    let account = authority.account().await?;
                    tracing::debug!(
                        address = %account.address,
                        "No signers declared, adding authority as gas payer"
                    );
                    let mut signer = Signer::new(account.public_key);
                    signer.clist.push(CapabilityFactory.gas());
                    command.signers.push(signer);
                    if command.meta.sender.is_empty() {
                        command.meta.sender = account.address;
                    }
                }
                let tx = PartiallySignedTransaction::from_command(&command)?;
                sign_with(authority.as_ref(), &tx).await
            }
            Finalizer::Multi(authorities) => {
                let tx = PartiallySignedTransaction::from_command(&command)?;
                Ok(collect_signatures(&tx, authorities).await?.into())
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Finalizer::Unsigned => "unsigned",
            Finalizer::Single(_) => "single",
            Finalizer::Multi(_) => "multi",
        }
    }
}

impl std::fmt::Debug for Finalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finalizer::Multi(authorities) => f
                .debug_struct("Finalizer")
                .field("kind", &self.label())
                .field("authorities", &authorities.len())
                .finish(),
            _ => f.debug_struct("Finalizer").field("kind", &self.label()).finish(),
        }
    }
}
