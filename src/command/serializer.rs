//! Canonical serialization and hashing.
//!
//! `cmd` is compact JSON with object keys sorted at every depth. Independent
//! parties that serialize the same command therefore produce the same bytes
//! and the same hash, which is what lets them exchange signatures.
//!
//! The hash is BLAKE2b-256 over the UTF-8 bytes of `cmd`, base64url encoded
//! without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::Serialize;

use crate::command::types::Command;
use crate::error::{PactError, PactResult};

type Blake2b256 = Blake2b<U32>;

/// Serialize any value with sorted keys and no insignificant whitespace.
///
/// Going through `serde_json::Value` sorts keys: its `Map` is a `BTreeMap`
/// unless the `preserve_order` feature is enabled, which this crate never does.
pub fn canonical_json<T: Serialize>(value: &T) -> PactResult<String> {
    let tree = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&tree)?)
}

/// Canonical `cmd` string of a command.
pub fn serialize_command(command: &Command) -> PactResult<String> {
    canonical_json(command)
}

/// Raw 32-byte BLAKE2b-256 digest of `cmd`.
pub fn hash_bytes(cmd: &str) -> [u8; 32] {
    let digest = Blake2b256::digest(cmd.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// base64url (unpadded) BLAKE2b-256 hash of `cmd`.
pub fn hash_command(cmd: &str) -> String {
    URL_SAFE_NO_PAD.encode(hash_bytes(cmd))
}

/// Decode a base64url hash back into its digest bytes.
pub fn decode_hash(hash: &str) -> PactResult<[u8; 32]> {
    let bytes = URL_SAFE_NO_PAD
        .decode(hash)
        .map_err(|e| PactError::InvalidTransaction(format!("Invalid hash encoding: {}", e)))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| PactError::InvalidTransaction(format!("Hash must be 32 bytes, got {}", b.len())))
}
