//! Capability declaration helpers.
//!
//! Signers declare their capabilities through a closure that receives a
//! [`CapabilityFactory`] and returns the list it authorizes:
//!
//! ```
//! use pact_txkit::command::{pact_decimal, CapabilityFactory};
//!
//! let declare = |f: &CapabilityFactory| {
//!     vec![
//!         f.gas(),
//!         f.transfer("alice", "bob", pact_decimal("1.0")),
//!     ]
//! };
//! assert_eq!(declare(&CapabilityFactory).len(), 2);
//! ```

use serde_json::{json, Value};

use crate::command::types::Capability;

/// Stateless constructor handed to capability-declaration closures.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityFactory;

impl CapabilityFactory {
    pub fn cap(&self, name: impl Into<String>, args: Vec<Value>) -> Capability {
        Capability::new(name, args)
    }

    /// `coin.GAS`, authorizing gas payment.
    pub fn gas(&self) -> Capability {
        Capability::new("coin.GAS", Vec::new())
    }

    /// `coin.TRANSFER` for a same-chain transfer.
    pub fn transfer(&self, from: &str, to: &str, amount: Value) -> Capability {
        Capability::new("coin.TRANSFER", vec![json!(from), json!(to), amount])
    }

    /// `coin.TRANSFER_XCHAIN` for a cross-chain transfer.
    pub fn transfer_xchain(&self, from: &str, to: &str, amount: Value, target_chain: &str) -> Capability {
        Capability::new(
            "coin.TRANSFER_XCHAIN",
            vec![json!(from), json!(to), amount, json!(target_chain)],
        )
    }
}

/// Pact decimal literal. Integers get a trailing `.0` so Pact does not read them as integers.
pub fn pact_decimal(amount: &str) -> Value {
    let literal = if amount.contains('.') {
        amount.to_string()
    } else {
        format!("{}.0", amount)
    };
    json!({ "decimal": literal })
}

/// Pact integer literal.
pub fn pact_integer(value: i64) -> Value {
    json!({ "int": value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_formatting() {
        assert_eq!(pact_decimal("1"), json!({"decimal": "1.0"}));
        assert_eq!(pact_decimal("0.25"), json!({"decimal": "0.25"}));
    }

    #[test]
    fn test_transfer_args_order() {
        let cap = CapabilityFactory.transfer("alice", "bob", pact_decimal("2"));
        assert_eq!(cap.name, "coin.TRANSFER");
        assert_eq!(cap.args[0], "alice");
        assert_eq!(cap.args[1], "bob");
        assert_eq!(cap.args[2], json!({"decimal": "2.0"}));
    }

    #[test]
    fn test_transfer_xchain_names_target_chain() {
        let cap = CapabilityFactory.transfer_xchain("alice", "bob", pact_decimal("0.5"), "2");
        assert_eq!(cap.name, "coin.TRANSFER_XCHAIN");
        assert_eq!(cap.args, vec![json!("alice"), json!("bob"), json!({"decimal": "0.5"}), json!("2")]);
    }

    #[test]
    fn test_integer_literal() {
        assert_eq!(pact_integer(-7), json!({"int": -7}));
    }
}
