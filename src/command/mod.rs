//! Command model, serialization and transaction envelopes.
//!
//! # Data Flow
//! ```text
//! CommandBuilder (owns Command, mutated by with_* calls)
//!     → serializer.rs (canonical JSON `cmd`, BLAKE2b-256 `hash`)
//!     → PartiallySignedTransaction (one empty slot per signer)
//!     → signing (slots filled by position)
//!     → Transaction (every slot signed; the only submittable form)
//! ```
//!
//! # Design Decisions
//! - Object keys are sorted at every depth so independent parties hash identical bytes
//! - Envelopes are immutable; signing returns new values
//! - Signature slot *i* always belongs to `signers[i]`

pub mod builder;
pub mod capability;
pub mod serializer;
pub mod transaction;
pub mod types;

pub use builder::{CapabilityMerge, CommandBuilder};
pub use capability::{pact_decimal, pact_integer, CapabilityFactory};
pub use serializer::{canonical_json, hash_command, serialize_command};
pub use transaction::{PartiallySignedTransaction, Signature, SignatureSlot, Transaction};
pub use types::{
    Capability, ChainId, Command, ContPayload, ExecPayload, Keyset, Meta, MetaPatch, Payload,
    SignatureScheme, Signer, SignerKey, Verifier,
};
