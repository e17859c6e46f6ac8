//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! builder / signing / dispatch produce:
//!     → logging.rs (structured tracing events: chain_id, request_key, hash)
//!     → metrics.rs (counters and histograms through the `metrics` facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → whatever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a global subscriber or recorder on its own
//! - Secret keys and signatures are never logged

pub mod logging;
pub mod metrics;
