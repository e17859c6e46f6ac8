//! Signature collection, merging and verification.
//!
//! Slot *i* of every signature array belongs to `signers[i]` of the command.
//! Everything here copies signatures by position and never reorders slots.

use std::sync::Arc;

use ed25519_dalek::{Signature as Ed25519Signature, Verifier as _, VerifyingKey};

use crate::command::serializer::decode_hash;
use crate::command::transaction::{PartiallySignedTransaction, SignatureSlot, Transaction};
use crate::error::{PactError, PactResult};
use crate::observability::metrics;
use crate::signing::wallet::SigningAuthority;

/// Single-authority signing. The returned signatures are trusted as they are;
/// any slots the authority could not fill stay empty.
pub async fn sign_with(
    authority: &dyn SigningAuthority,
    tx: &PartiallySignedTransaction,
) -> PactResult<PartiallySignedTransaction> {
    let signed = authority.sign(tx).await?;
    if signed.hash() != tx.hash() {
        return Err(PactError::HashMismatch {
            expected: tx.hash().to_string(),
            actual: signed.hash().to_string(),
        });
    }
    Ok(signed)
}

/// Collect signatures from independent authorities into a fully signed transaction.
///
/// Each authority signs the original envelope, and only the slots whose
/// signer key matches the authority's account key are taken from its answer.
/// Fails with [`PactError::MissingSignatures`] naming every slot left empty.
pub async fn collect_signatures(
    tx: &PartiallySignedTransaction,
    authorities: &[Arc<dyn SigningAuthority>],
) -> PactResult<Transaction> {
    let command = tx.command()?;
    let mut collected: Vec<SignatureSlot> = command
        .signers
        .iter()
        .map(|s| SignatureSlot::empty(s.pub_key.clone()))
        .collect();

    for authority in authorities {
        let account = authority.account().await?;
        let controlled: Vec<usize> = command
            .signers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.pub_key == account.public_key)
            .map(|(i, _)| i)
            .collect();

        if controlled.is_empty() {
            tracing::debug!(
                address = %account.address,
                hash = %tx.hash(),
                "Authority controls no signer slot, skipping"
            );
            continue;
        }

        let signed = sign_with(authority.as_ref(), tx).await?;
        if signed.sigs().len() != collected.len() {
            return Err(PactError::InvalidTransaction(format!(
                "authority {} returned {} signature slots, expected {}",
                account.address,
                signed.sigs().len(),
                collected.len()
            )));
        }

        for i in controlled {
            if let Some(sig) = signed.sigs()[i].sig.as_ref().filter(|s| !s.is_empty()) {
                collected[i].sig = Some(sig.clone());
            }
        }
    }

    let missing: Vec<usize> = collected
        .iter()
        .enumerate()
        .filter(|(_, slot)| !slot.is_signed())
        .map(|(i, _)| i)
        .collect();
    if !missing.is_empty() {
        tracing::warn!(hash = %tx.hash(), missing = ?missing, "Signature collection incomplete");
        metrics::record_signature_collection(false);
        return Err(PactError::MissingSignatures { indices: missing });
    }

    tracing::debug!(hash = %tx.hash(), signers = collected.len(), "Collected all signatures");
    metrics::record_signature_collection(true);
    Transaction::try_from(tx.with_sigs(collected)?)
}

/// Merge envelopes of the same command. The first signature seen for a slot wins.
pub fn merge_signatures(txs: &[PartiallySignedTransaction]) -> PactResult<PartiallySignedTransaction> {
    let first = txs.first().ok_or_else(|| {
        PactError::InvalidTransaction("at least one transaction is required to merge".to_string())
    })?;

    if let Some(other) = txs.iter().find(|t| t.hash() != first.hash()) {
        return Err(PactError::HashMismatch {
            expected: first.hash().to_string(),
            actual: other.hash().to_string(),
        });
    }

    let command = first.command()?;
    let mut merged: Vec<SignatureSlot> = command
        .signers
        .iter()
        .map(|s| SignatureSlot::empty(s.pub_key.clone()))
        .collect();

    for tx in txs {
        if tx.sigs().len() != merged.len() {
            return Err(PactError::InvalidTransaction(format!(
                "{} signature slots for {} signers",
                tx.sigs().len(),
                merged.len()
            )));
        }
        for (slot, incoming) in merged.iter_mut().zip(tx.sigs()) {
            if !slot.is_signed() && incoming.is_signed() {
                slot.sig = incoming.sig.clone();
            }
        }
    }

    first.with_sigs(merged)
}

/// Check every present signature against its signer's key and the command hash.
///
/// Empty slots are ignored; use [`PartiallySignedTransaction::is_fully_signed`]
/// to check completeness.
pub fn verify_signatures(tx: &PartiallySignedTransaction) -> PactResult<()> {
    let digest = decode_hash(tx.hash())?;
    let command = tx.command()?;

    for (index, (slot, signer)) in tx.sigs().iter().zip(&command.signers).enumerate() {
        let Some(sig_hex) = slot.sig.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        let invalid = |reason: String| PactError::InvalidSignature { index, reason };

        let key_bytes: [u8; 32] = hex::decode(&signer.pub_key)
            .map_err(|e| invalid(format!("bad public key: {}", e)))?
            .try_into()
            .map_err(|_| invalid("public key must be 32 bytes".to_string()))?;
        let key = VerifyingKey::from_bytes(&key_bytes).map_err(|e| invalid(e.to_string()))?;

        let sig_bytes: [u8; 64] = hex::decode(sig_hex)
            .map_err(|e| invalid(format!("bad signature encoding: {}", e)))?
            .try_into()
            .map_err(|_| invalid("signature must be 64 bytes".to_string()))?;
        let signature = Ed25519Signature::from_bytes(&sig_bytes);

        key.verify(&digest, &signature)
            .map_err(|e| invalid(e.to_string()))?;
    }
    Ok(())
}
