//! Transaction envelopes.
//!
//! A [`PartiallySignedTransaction`] is frozen once created: signing produces a
//! new envelope with more slots filled. A [`Transaction`] is the fully signed
//! form and the only one accepted for submission.

use serde::{Deserialize, Serialize};

use crate::command::serializer::{hash_command, serialize_command};
use crate::command::types::{ChainId, Command};
use crate::error::{PactError, PactResult};

/// One signature slot; `sig` is absent until the slot's signer has signed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_key: Option<String>,
}

impl SignatureSlot {
    pub fn empty(pub_key: impl Into<String>) -> Self {
        Self {
            sig: None,
            pub_key: Some(pub_key.into()),
        }
    }

    pub fn signed(sig: impl Into<String>, pub_key: impl Into<String>) -> Self {
        Self {
            sig: Some(sig.into()),
            pub_key: Some(pub_key.into()),
        }
    }

    pub fn is_signed(&self) -> bool {
        self.sig.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Wire form of an envelope before its hash and slots are checked.
#[derive(Deserialize)]
struct RawEnvelope {
    cmd: String,
    hash: String,
    #[serde(default)]
    sigs: Vec<SignatureSlot>,
}

/// Envelope with zero or more signature slots filled.
///
/// Deserializing goes through [`PartiallySignedTransaction::from_parts`], so a
/// decoded envelope always carries the hash of its `cmd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct PartiallySignedTransaction {
    cmd: String,
    hash: String,
    sigs: Vec<SignatureSlot>,
}

impl PartiallySignedTransaction {
    /// Freeze a command: serialize, hash, and open one empty slot per signer.
    pub fn from_command(command: &Command) -> PactResult<Self> {
        let cmd = serialize_command(command)?;
        let hash = hash_command(&cmd);
        let sigs = command
            .signers
            .iter()
            .map(|s| SignatureSlot::empty(s.pub_key.clone()))
            .collect();
        Ok(Self { cmd, hash, sigs })
    }

    /// Rebuild from raw parts, e.g. an envelope received from another party.
    ///
    /// The hash is recomputed and must match; the slot count must equal the
    /// number of declared signers.
    pub fn from_parts(cmd: String, hash: String, sigs: Vec<SignatureSlot>) -> PactResult<Self> {
        let computed = hash_command(&cmd);
        if computed != hash {
            return Err(PactError::HashMismatch {
                expected: computed,
                actual: hash,
            });
        }
        let tx = Self { cmd, hash, sigs };
        let signers = tx.command()?.signers.len();
        if signers != tx.sigs.len() {
            return Err(PactError::InvalidTransaction(format!(
                "{} signature slots for {} signers",
                tx.sigs.len(),
                signers
            )));
        }
        Ok(tx)
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn sigs(&self) -> &[SignatureSlot] {
        &self.sigs
    }

    /// Parse `cmd` back into a command.
    pub fn command(&self) -> PactResult<Command> {
        Ok(serde_json::from_str(&self.cmd)?)
    }

    pub fn chain_id(&self) -> PactResult<ChainId> {
        Ok(self.command()?.meta.chain_id)
    }

    /// New envelope with the same command and a replacement signature array.
    pub fn with_sigs(&self, sigs: Vec<SignatureSlot>) -> PactResult<Self> {
        if sigs.len() != self.sigs.len() {
            return Err(PactError::InvalidTransaction(format!(
                "expected {} signature slots, got {}",
                self.sigs.len(),
                sigs.len()
            )));
        }
        Ok(Self {
            cmd: self.cmd.clone(),
            hash: self.hash.clone(),
            sigs,
        })
    }

    /// New envelope with one slot filled.
    pub fn with_signature(&self, index: usize, sig: impl Into<String>) -> PactResult<Self> {
        let mut sigs = self.sigs.clone();
        let slot = sigs.get_mut(index).ok_or_else(|| {
            PactError::InvalidTransaction(format!("no signature slot at index {}", index))
        })?;
        slot.sig = Some(sig.into());
        Ok(Self {
            cmd: self.cmd.clone(),
            hash: self.hash.clone(),
            sigs,
        })
    }

    /// Indices whose slot carries no signature.
    pub fn unsigned_indices(&self) -> Vec<usize> {
        self.sigs
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_signed())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.unsigned_indices().is_empty()
    }
}

/// A filled signature slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub sig: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_key: Option<String>,
}

/// Fully signed envelope.
///
/// Decoding rejects a forged hash, a slot count that differs from the signer
/// count and any empty signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope")]
pub struct Transaction {
    cmd: String,
    hash: String,
    sigs: Vec<Signature>,
}

impl Transaction {
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn sigs(&self) -> &[Signature] {
        &self.sigs
    }

    pub fn command(&self) -> PactResult<Command> {
        Ok(serde_json::from_str(&self.cmd)?)
    }

    pub fn chain_id(&self) -> PactResult<ChainId> {
        Ok(self.command()?.meta.chain_id)
    }
}

impl TryFrom<PartiallySignedTransaction> for Transaction {
    type Error = PactError;

    fn try_from(tx: PartiallySignedTransaction) -> PactResult<Self> {
        let indices = tx.unsigned_indices();
        if !indices.is_empty() {
            return Err(PactError::Unsigned { indices });
        }
        let sigs = tx
            .sigs
            .into_iter()
            .map(|slot| Signature {
                sig: slot.sig.unwrap_or_default(),
                pub_key: slot.pub_key,
            })
            .collect();
        Ok(Self {
            cmd: tx.cmd,
            hash: tx.hash,
            sigs,
        })
    }
}

impl TryFrom<RawEnvelope> for PartiallySignedTransaction {
    type Error = PactError;

    fn try_from(raw: RawEnvelope) -> PactResult<Self> {
        Self::from_parts(raw.cmd, raw.hash, raw.sigs)
    }
}

impl TryFrom<RawEnvelope> for Transaction {
    type Error = PactError;

    fn try_from(raw: RawEnvelope) -> PactResult<Self> {
        PartiallySignedTransaction::try_from(raw)?.try_into()
    }
}

impl From<Transaction> for PartiallySignedTransaction {
    fn from(tx: Transaction) -> Self {
        let sigs = tx
            .sigs
            .into_iter()
            .map(|s| SignatureSlot {
                sig: Some(s.sig),
                pub_key: s.pub_key,
            })
            .collect();
        Self {
            cmd: tx.cmd,
            hash: tx.hash,
            sigs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::types::{ExecPayload, Meta, Payload, Signer};

    fn two_signer_tx() -> PartiallySignedTransaction {
        let mut command = Command::new(
            Payload::Exec(ExecPayload {
                code: "(+ 1 2)".into(),
                data: Default::default(),
            }),
            "development",
            Meta::default(),
        );
        command.signers.push(Signer::new("aa"));
        command.signers.push(Signer::new("bb"));
        PartiallySignedTransaction::from_command(&command).unwrap()
    }

    #[test]
    fn test_slots_follow_signer_order() {
        let tx = two_signer_tx();
        assert_eq!(tx.sigs().len(), 2);
        assert_eq!(tx.sigs()[0].pub_key.as_deref(), Some("aa"));
        assert_eq!(tx.sigs()[1].pub_key.as_deref(), Some("bb"));
        assert_eq!(tx.unsigned_indices(), vec![0, 1]);
    }

    #[test]
    fn test_signing_produces_new_envelope() {
        let tx = two_signer_tx();
        let signed = tx.with_signature(1, "deadbeef").unwrap();
        assert!(!tx.sigs()[1].is_signed());
        assert!(signed.sigs()[1].is_signed());
        assert_eq!(signed.hash(), tx.hash());
        assert_eq!(signed.unsigned_indices(), vec![0]);
    }

    #[test]
    fn test_unsigned_conversion_fails_with_indices() {
        let tx = two_signer_tx().with_signature(0, "aa11").unwrap();
        match Transaction::try_from(tx) {
            Err(PactError::Unsigned { indices }) => assert_eq!(indices, vec![1]),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_full_conversion() {
        let tx = two_signer_tx()
            .with_signature(0, "s0")
            .unwrap()
            .with_signature(1, "s1")
            .unwrap();
        let full = Transaction::try_from(tx.clone()).unwrap();
        assert_eq!(full.sigs()[1].sig, "s1");
        assert_eq!(PartiallySignedTransaction::from(full), tx);
    }

    #[test]
    fn test_from_parts_rejects_tampered_hash() {
        let tx = two_signer_tx();
        let result = PartiallySignedTransaction::from_parts(
            tx.cmd().to_string(),
            "AAAA".into(),
            tx.sigs().to_vec(),
        );
        assert!(matches!(result, Err(PactError::HashMismatch { .. })));
    }

    #[test]
    fn test_from_parts_rejects_slot_count_mismatch() {
        let tx = two_signer_tx();
        let result = PartiallySignedTransaction::from_parts(
            tx.cmd().to_string(),
            tx.hash().to_string(),
            vec![SignatureSlot::default()],
        );
        assert!(matches!(result, Err(PactError::InvalidTransaction(_))));
    }

    #[test]
    fn test_envelope_wire_shape() {
        let tx = two_signer_tx().with_signature(0, "s0").unwrap();
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["sigs"][0]["sig"], "s0");
        assert!(value["sigs"][1].get("sig").is_none());
        assert_eq!(value["sigs"][1]["pubKey"], "bb");
        assert!(value["cmd"].is_string());
    }

    fn envelope_json(tx: &PartiallySignedTransaction, hash: &str, sigs: serde_json::Value) -> String {
        serde_json::json!({"cmd": tx.cmd(), "hash": hash, "sigs": sigs}).to_string()
    }

    #[test]
    fn test_decoding_round_trips_valid_envelopes() {
        let tx = two_signer_tx().with_signature(0, "s0").unwrap();
        let decoded: PartiallySignedTransaction =
            serde_json::from_str(&serde_json::to_string(&tx).unwrap()).unwrap();
        assert_eq!(decoded, tx);

        let full = Transaction::try_from(tx.with_signature(1, "s1").unwrap()).unwrap();
        let decoded: Transaction = serde_json::from_str(&serde_json::to_string(&full).unwrap()).unwrap();
        assert_eq!(decoded, full);
    }

    #[test]
    fn test_decoding_rejects_forged_hash() {
        let tx = two_signer_tx();
        let json = envelope_json(
            &tx,
            "AAAA",
            serde_json::json!([{"sig": "s0", "pubKey": "aa"}, {"sig": "s1", "pubKey": "bb"}]),
        );
        let err = serde_json::from_str::<PartiallySignedTransaction>(&json).unwrap_err();
        assert!(err.to_string().contains("Hash mismatch"));
        assert!(serde_json::from_str::<Transaction>(&json).is_err());
    }

    #[test]
    fn test_decoding_rejects_short_sigs() {
        let tx = two_signer_tx();
        let json = envelope_json(&tx, tx.hash(), serde_json::json!([{"sig": "s0", "pubKey": "aa"}]));
        assert!(serde_json::from_str::<PartiallySignedTransaction>(&json).is_err());
        assert!(serde_json::from_str::<Transaction>(&json).is_err());
    }

    #[test]
    fn test_decoding_rejects_empty_signature() {
        let tx = two_signer_tx();
        let json = envelope_json(
            &tx,
            tx.hash(),
            serde_json::json!([{"sig": "", "pubKey": "aa"}, {"sig": "s1", "pubKey": "bb"}]),
        );
        let partial: PartiallySignedTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(partial.unsigned_indices(), vec![0]);

        let err = serde_json::from_str::<Transaction>(&json).unwrap_err();
        assert!(err.to_string().contains("unsigned signer indices: 0"));
    }
}
