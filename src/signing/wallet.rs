//! Signing authorities and the ED25519 key-pair wallet.
//!
//! # Security
//! - Secret keys are loaded from environment variables, never from config files
//! - Keys are never logged or serialized

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};
use serde::{Deserialize, Serialize};

use crate::command::serializer::decode_hash;
use crate::command::transaction::PartiallySignedTransaction;
use crate::error::{PactError, PactResult};

/// Account an authority signs for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub address: String,
    pub public_key: String,
}

/// Anything able to produce signatures for declared signers.
///
/// `sign` must return an envelope whose `sigs` array is positionally aligned
/// with the input's; collection copies slots by index.
#[async_trait]
pub trait SigningAuthority: Send + Sync {
    async fn account(&self) -> PactResult<WalletAccount>;

    async fn sign(&self, tx: &PartiallySignedTransaction) -> PactResult<PartiallySignedTransaction>;
}

/// Wallet holding a single ED25519 key pair.
#[derive(Clone)]
pub struct KeyPairWallet {
    signing_key: SigningKey,
    public_key: String,
    address: String,
}

impl KeyPairWallet {
    /// Create a wallet from a 32-byte secret seed.
    ///
    /// Without an explicit address the principal `k:<public key>` is used.
    pub fn from_seed(seed: [u8; 32], address: Option<String>) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let public_key = hex::encode(signing_key.verifying_key().to_bytes());
        let address = address.unwrap_or_else(|| format!("k:{}", public_key));
        Self {
            signing_key,
            public_key,
            address,
        }
    }

    /// Create a wallet from a hex-encoded secret key.
    pub fn from_secret_key(secret_key_hex: &str, address: Option<String>) -> PactResult<Self> {
        let bytes = hex::decode(secret_key_hex.trim())
            .map_err(|e| PactError::Wallet(format!("Invalid secret key format: {}", e)))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            PactError::Wallet(format!("Invalid secret key length: expected 32 bytes, got {}", b.len()))
        })?;

        let wallet = Self::from_seed(seed, address);
        tracing::debug!(
            address = %wallet.address,
            public_key = %wallet.public_key,
            "Key pair wallet initialized"
        );
        Ok(wallet)
    }

    /// Load the secret key from the named environment variable.
    pub fn from_env(var: &str, address: Option<String>) -> PactResult<Self> {
        let secret = std::env::var(var)
            .map_err(|_| PactError::Wallet(format!("Environment variable {} not set", var)))?;
        Self::from_secret_key(&secret, address)
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Sign a base64url command hash; returns the hex signature.
    pub fn sign_hash(&self, hash: &str) -> PactResult<String> {
        let digest = decode_hash(hash)?;
        Ok(hex::encode(self.signing_key.sign(&digest).to_bytes()))
    }
}

#[async_trait]
impl SigningAuthority for KeyPairWallet {
    async fn account(&self) -> PactResult<WalletAccount> {
        Ok(WalletAccount {
            address: self.address.clone(),
            public_key: self.public_key.clone(),
        })
    }

    /// Fill every slot whose signer key is ours; other slots are left as they are.
    async fn sign(&self, tx: &PartiallySignedTransaction) -> PactResult<PartiallySignedTransaction> {
        let command = tx.command()?;
        let mut sigs = tx.sigs().to_vec();
        let mut signed = 0usize;

        for (i, signer) in command.signers.iter().enumerate() {
            if signer.pub_key != self.public_key {
                continue;
            }
            let slot = sigs.get_mut(i).ok_or_else(|| {
                PactError::InvalidTransaction(format!("no signature slot at index {}", i))
            })?;
            slot.sig = Some(self.sign_hash(tx.hash())?);
            slot.pub_key = Some(self.public_key.clone());
            signed += 1;
        }

        tracing::debug!(
            hash = %tx.hash(),
            public_key = %self.public_key,
            slots = signed,
            "Signed transaction"
        );
        tx.with_sigs(sigs)
    }
}

impl std::fmt::Debug for KeyPairWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairWallet")
            .field("address", &self.address)
            .field("public_key", &self.public_key)
            .finish()
    }
}
