//! Pact REST API client with timeout and failover handling.
//!
//! # Responsibilities
//! - Build per-chain endpoint URLs (Chainweb or bare Pact server layout)
//! - POST JSON envelopes and decode command results
//! - Fail over to the next configured endpoint on connection errors and timeouts
//!
//! HTTP error statuses are answers from a reachable node (bad signature,
//! duplicate request key, ...) and are returned without trying other endpoints.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::client::rpc::PactRpc;
use crate::client::types::{
    ChainTarget, LocalOptions, LocalPactTransactionResult, TransactionDescriptor, TransactionResult,
};
use crate::command::transaction::{PartiallySignedTransaction, Transaction};
use crate::command::types::ChainId;
use crate::config::{ApiStyle, NetworkConfig};
use crate::error::{PactError, PactResult};

/// Pact API operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Local,
    Send,
    Listen,
    Poll,
    Spv,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Local => "api/v1/local",
            Endpoint::Send => "api/v1/send",
            Endpoint::Listen => "api/v1/listen",
            Endpoint::Poll => "api/v1/poll",
            Endpoint::Spv => "spv",
        }
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    cmds: &'a [Transaction],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestKeys {
    request_keys: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpvRequest<'a> {
    request_key: &'a str,
    target_chain_id: &'a ChainId,
}

/// HTTP implementation of [`PactRpc`].
#[derive(Clone)]
pub struct HttpPactClient {
    /// Base URLs (primary + failovers).
    endpoints: Vec<Url>,
    http: reqwest::Client,
    api_style: ApiStyle,
    rpc_timeout: Duration,
    listen_timeout: Duration,
}

impl HttpPactClient {
    /// Create a client for one network.
    ///
    /// The primary URL must parse; invalid failover URLs are skipped with a warning.
    pub fn new(config: &NetworkConfig) -> PactResult<Self> {
        let mut endpoints = Vec::new();

        let primary: Url = config.rpc_url.parse().map_err(|e| {
            PactError::Config(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        endpoints.push(primary);

        for url_str in &config.failover_urls {
            match url_str.parse() {
                Ok(url) => endpoints.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("pact-txkit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::debug!(
            rpc_url = %config.rpc_url,
            failovers = endpoints.len() - 1,
            network_id = %config.network_id,
            "Pact client initialized"
        );

        Ok(Self {
            endpoints,
            http,
            api_style: config.api_style,
            rpc_timeout: Duration::from_secs(config.rpc_timeout_secs),
            listen_timeout: Duration::from_secs(config.listen_timeout_secs),
        })
    }

    fn endpoint_url(&self, base: &Url, target: &ChainTarget, endpoint: Endpoint) -> PactResult<String> {
        let base = base.as_str().trim_end_matches('/');
        match self.api_style {
            ApiStyle::Chainweb => Ok(format!(
                "{}/chainweb/0.0/{}/chain/{}/pact/{}",
                base,
                target.network_id,
                target.chain_id,
                endpoint.path()
            )),
            ApiStyle::PactServer if endpoint == Endpoint::Spv => Err(PactError::Config(
                "SPV proofs require a chainweb node".to_string(),
            )),
            ApiStyle::PactServer => Ok(format!("{}/{}", base, endpoint.path())),
        }
    }

    /// POST `body` to `endpoint`, trying each base URL in order.
    async fn post_json<B, R>(
        &self,
        target: &ChainTarget,
        endpoint: Endpoint,
        query: &[(&str, String)],
        body: &B,
        deadline: Duration,
    ) -> PactResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut timed_out = false;

        for (i, base) in self.endpoints.iter().enumerate() {
            let url = self.endpoint_url(base, target, endpoint)?;
            let request = self.http.post(&url).query(query).json(body).send();

            let response = match timeout(deadline, request).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    tracing::warn!(endpoint_idx = i, url = %url, error = %e, "RPC error, trying next endpoint");
                    continue;
                }
                Err(_) => {
                    tracing::warn!(endpoint_idx = i, url = %url, "RPC timeout, trying next endpoint");
                    timed_out = true;
                    continue;
                }
            };

            let status = response.status();
            let text = match timeout(deadline, response.text()).await {
                Ok(result) => result?,
                Err(_) => return Err(PactError::Timeout(deadline.as_secs())),
            };
            if !status.is_success() {
                return Err(PactError::Transport(format!(
                    "{} returned status {}: {}",
                    endpoint.path(),
                    status,
                    text.trim()
                )));
            }
            return Ok(serde_json::from_str(&text)?);
        }

        if timed_out {
            Err(PactError::Timeout(deadline.as_secs()))
        } else {
            Err(PactError::Transport(format!(
                "All RPC endpoints failed for {}",
                endpoint.path()
            )))
        }
    }
}

#[async_trait]
impl PactRpc for HttpPactClient {
    async fn local(
        &self,
        target: &ChainTarget,
        tx: &PartiallySignedTransaction,
        options: LocalOptions,
    ) -> PactResult<LocalPactTransactionResult> {
        let query = [
            ("preflight", options.preflight.to_string()),
            ("signatureVerification", options.signature_verification.to_string()),
        ];
        let raw: Value = self
            .post_json(target, Endpoint::Local, &query, tx, self.rpc_timeout)
            .await?;
        parse_local_response(raw)
    }

    async fn send(&self, target: &ChainTarget, txs: &[Transaction]) -> PactResult<Vec<String>> {
        let response: RequestKeys = self
            .post_json(target, Endpoint::Send, &[], &SendRequest { cmds: txs }, self.rpc_timeout)
            .await?;
        if response.request_keys.len() != txs.len() {
            return Err(PactError::Transport(format!(
                "send returned {} request keys for {} transactions",
                response.request_keys.len(),
                txs.len()
            )));
        }
        Ok(response.request_keys)
    }

    async fn listen(&self, descriptor: &TransactionDescriptor) -> PactResult<TransactionResult> {
        let body = json!({ "listen": descriptor.request_key });
        self.post_json(
            &descriptor.target(),
            Endpoint::Listen,
            &[],
            &body,
            self.listen_timeout,
        )
        .await
    }

    async fn poll(
        &self,
        target: &ChainTarget,
        request_keys: &[String],
    ) -> PactResult<HashMap<String, TransactionResult>> {
        let body = json!({ "requestKeys": request_keys });
        self.post_json(target, Endpoint::Poll, &[], &body, self.rpc_timeout)
            .await
    }

    async fn spv(&self, descriptor: &TransactionDescriptor, target_chain: &ChainId) -> PactResult<String> {
        let body = SpvRequest {
            request_key: &descriptor.request_key,
            target_chain_id: target_chain,
        };
        self.post_json(&descriptor.target(), Endpoint::Spv, &[], &body, self.rpc_timeout)
            .await
    }
}

/// `/local` answers `{preflightResult, preflightWarnings}` for preflight calls
/// and a bare command result otherwise.
fn parse_local_response(mut raw: Value) -> PactResult<LocalPactTransactionResult> {
    match raw.get_mut("preflightResult").map(Value::take) {
        Some(result) => {
            let preflight_warnings = raw
                .get_mut("preflightWarnings")
                .map(Value::take)
                .map(serde_json::from_value)
                .transpose()?
                .unwrap_or_default();
            Ok(LocalPactTransactionResult {
                result: serde_json::from_value(result)?,
                preflight_warnings,
            })
        }
        None => Ok(LocalPactTransactionResult {
            result: serde_json::from_value(raw)?,
            preflight_warnings: Vec::new(),
        }),
    }
}

impl std::fmt::Debug for HttpPactClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPactClient")
            .field("endpoints", &self.endpoints.iter().map(Url::as_str).collect::<Vec<_>>())
            .field("api_style", &self.api_style)
            .field("rpc_timeout_secs", &self.rpc_timeout.as_secs())
            .finish()
    }
}
