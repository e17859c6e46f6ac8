//! Signing authorities and multi-party signature coordination.
//!
//! # Data Flow
//! ```text
//! PartiallySignedTransaction
//!     → SigningAuthority::sign (one authority, trusted as returned)
//!     → collect_signatures (N authorities, slots copied by index)
//!     → Transaction, or MissingSignatures naming the empty slots
//! ```

pub mod coordinator;
pub mod wallet;

pub use coordinator::{collect_signatures, merge_signatures, sign_with, verify_signatures};
pub use wallet::{KeyPairWallet, SigningAuthority, WalletAccount};
