//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TxkitConfig (validated, immutable)
//!     → NetworkContext::from_config (one network resolved, client built)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secret keys are referenced by environment variable name only

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ApiStyle, KeyPairConfig, LogFormat, LoggingConfig, MetaDefaults, NetworkConfig, TxkitConfig};
