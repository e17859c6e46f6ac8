//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (default network exists, default chain is enumerated)
//! - Validate value ranges (timeouts > 0, gas settings > 0)
//! - Validate key material references (hex public keys, unique accounts)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TxkitConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{NetworkConfig, TxkitConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &TxkitConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.networks.is_empty() {
        errors.push(ValidationError::new("networks", "at least one network is required"));
    } else if !config.networks.contains_key(&config.default_network) {
        errors.push(ValidationError::new(
            "default_network",
            format!("unknown network '{}'", config.default_network),
        ));
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "logging.level",
            format!("unsupported level '{}'", config.logging.level),
        ));
    }

    for (name, network) in &config.networks {
        validate_network(&format!("networks.{}", name), network, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_network(prefix: &str, network: &NetworkConfig, errors: &mut Vec<ValidationError>) {
    let field = |name: &str| format!("{}.{}", prefix, name);

    if network.network_id.trim().is_empty() {
        errors.push(ValidationError::new(field("network_id"), "must not be empty"));
    }

    for (i, raw) in std::iter::once(&network.rpc_url)
        .chain(network.failover_urls.iter())
        .enumerate()
    {
        let name = if i == 0 {
            field("rpc_url")
        } else {
            field(&format!("failover_urls[{}]", i - 1))
        };
        match url::Url::parse(raw) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::new(
                name,
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(name, format!("invalid URL '{}': {}", raw, e))),
        }
    }

    if network.chain_ids.is_empty() {
        errors.push(ValidationError::new(field("chain_ids"), "at least one chain is required"));
    }
    for chain in &network.chain_ids {
        if chain.parse::<u32>().is_err() {
            errors.push(ValidationError::new(
                field("chain_ids"),
                format!("'{}' is not a chain number", chain),
            ));
        }
    }
    if let Some(chain) = &network.meta.chain_id {
        if !network.chain_ids.contains(chain) {
            errors.push(ValidationError::new(
                field("meta.chain_id"),
                format!("chain '{}' is not listed in chain_ids", chain),
            ));
        }
    }

    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(field("rpc_timeout_secs"), "must be greater than zero"));
    }
    if network.listen_timeout_secs == 0 {
        errors.push(ValidationError::new(field("listen_timeout_secs"), "must be greater than zero"));
    }
    if network.meta.gas_limit == 0 {
        errors.push(ValidationError::new(field("meta.gas_limit"), "must be greater than zero"));
    }
    if !(network.meta.gas_price > 0.0) {
        errors.push(ValidationError::new(field("meta.gas_price"), "must be greater than zero"));
    }
    if network.meta.ttl == 0 {
        errors.push(ValidationError::new(field("meta.ttl"), "must be greater than zero"));
    }

    let mut accounts = HashSet::new();
    for (i, key_pair) in network.key_pairs.iter().enumerate() {
        let key_field = field(&format!("key_pairs[{}]", i));
        if key_pair.account.trim().is_empty() {
            errors.push(ValidationError::new(&key_field, "account must not be empty"));
        } else if !accounts.insert(key_pair.account.as_str()) {
            errors.push(ValidationError::new(
                &key_field,
                format!("duplicate account '{}'", key_pair.account),
            ));
        }
        let valid_key = key_pair.public_key.len() == 64
            && key_pair.public_key.chars().all(|c| c.is_ascii_hexdigit());
        if !valid_key {
            errors.push(ValidationError::new(
                &key_field,
                "public_key must be 64 hex characters",
            ));
        }
    }
}
