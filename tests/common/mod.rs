//! Shared utilities for integration testing: an in-process mock Chainweb node
//! and a raw programmable HTTP backend.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use pact_txkit::config::{parse_config, TxkitConfig};
use pact_txkit::KeyPairWallet;

/// Recorded requests and stored results of the mock node.
#[derive(Default)]
pub struct MockNode {
    events: Mutex<Vec<String>>,
    results: Mutex<HashMap<String, Value>>,
}

impl MockNode {
    /// Requests seen so far, as `op:chain`.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.split(':').next() == Some(op))
            .count()
    }

    fn record(&self, op: &str, chain: &str) {
        self.events.lock().unwrap().push(format!("{}:{}", op, chain));
    }
}

type Node = Arc<MockNode>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalQuery {
    #[serde(default)]
    preflight: bool,
    #[serde(default)]
    signature_verification: bool,
}

/// Command result the way a node reports it: `(error` in the code fails,
/// anything else succeeds with the chain id as data.
fn command_result(envelope: &Value) -> Value {
    let hash = envelope["hash"].as_str().unwrap_or_default().to_string();
    let cmd: Value = envelope["cmd"]
        .as_str()
        .and_then(|c| serde_json::from_str(c).ok())
        .unwrap_or(Value::Null);
    let chain = cmd["meta"]["chainId"].clone();

    let (result, continuation) = if let Some(code) = cmd["payload"]["exec"]["code"].as_str() {
        let result = if code.contains("(error") {
            json!({"status": "failure", "error": {"message": "Mock failure", "type": "EvalError"}})
        } else {
            json!({"status": "success", "data": chain})
        };
        (result, json!({"pactId": hash, "step": 0, "stepCount": 2}))
    } else {
        let cont = &cmd["payload"]["cont"];
        let result = if cont["proof"].is_string() {
            json!({"status": "success", "data": "continued"})
        } else {
            json!({"status": "failure", "error": {"message": "Missing SPV proof"}})
        };
        (result, json!({"pactId": cont["pactId"], "step": cont["step"], "stepCount": 2}))
    };

    json!({
        "reqKey": hash,
        "txId": 1,
        "result": result,
        "gas": 73,
        "logs": null,
        "metaData": {"blockHeight": 1, "blockTime": 1700000000, "blockHash": "b", "prevBlockHash": "p"},
        "continuation": continuation,
        "events": []
    })
}

async fn local(
    State(node): State<Node>,
    Path((_network, chain)): Path<(String, String)>,
    Query(query): Query<LocalQuery>,
    Json(envelope): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let op = if query.preflight { "preflight" } else { "local" };
    node.record(op, &chain);

    if query.signature_verification {
        let unsigned = envelope["sigs"]
            .as_array()
            .map(|sigs| sigs.iter().any(|s| !s["sig"].is_string()))
            .unwrap_or(true);
        if unsigned {
            return Err((StatusCode::BAD_REQUEST, "Invalid command: missing signature".into()));
        }
    }

    let result = command_result(&envelope);
    if query.preflight {
        Ok(Json(json!({
            "preflightResult": result,
            "preflightWarnings": ["Gas price is above the recommended price"]
        })))
    } else {
        Ok(Json(result))
    }
}

async fn send(
    State(node): State<Node>,
    Path((_network, chain)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    node.record("send", &chain);
    let cmds = body["cmds"].as_array().cloned().unwrap_or_default();

    let mut keys = Vec::new();
    for envelope in &cmds {
        let result = command_result(envelope);
        let key = result["reqKey"].as_str().unwrap_or_default().to_string();
        node.results.lock().unwrap().insert(key.clone(), result);
        keys.push(key);
    }
    Ok(Json(json!({ "requestKeys": keys })))
}

async fn listen(
    State(node): State<Node>,
    Path((_network, chain)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    node.record("listen", &chain);
    let key = body["listen"].as_str().unwrap_or_default();
    node.results
        .lock()
        .unwrap()
        .get(key)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("Unknown request key {}", key)))
}

async fn poll(
    State(node): State<Node>,
    Path((_network, chain)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    node.record("poll", &chain);
    let results = node.results.lock().unwrap();
    let mut found = serde_json::Map::new();
    for key in body["requestKeys"].as_array().into_iter().flatten() {
        if let Some(result) = key.as_str().and_then(|k| results.get(k)) {
            found.insert(key.as_str().unwrap_or_default().to_string(), result.clone());
        }
    }
    Json(Value::Object(found))
}

async fn spv(
    State(node): State<Node>,
    Path((_network, chain)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    node.record("spv", &chain);
    let proof = format!(
        "proof:{}:{}",
        body["requestKey"].as_str().unwrap_or_default(),
        body["targetChainId"].as_str().unwrap_or_default()
    );
    Json(Value::String(proof))
}

/// Start a mock Chainweb node on an ephemeral port; returns its base URL.
pub async fn start_mock_node() -> (String, Node) {
    let node: Node = Arc::new(MockNode::default());
    let prefix = "/chainweb/0.0/{network}/chain/{chain}/pact";
    let app = Router::new()
        .route(&format!("{}/api/v1/local", prefix), post(local))
        .route(&format!("{}/api/v1/send", prefix), post(send))
        .route(&format!("{}/api/v1/listen", prefix), post(listen))
        .route(&format!("{}/api/v1/poll", prefix), post(poll))
        .route(&format!("{}/spv", prefix), post(spv))
        .with_state(node.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr), node)
}

/// Address nobody listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start a raw backend answering every connection with `f()`'s status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            503 => "503 Service Unavailable",
                            _ => "500 Internal Server Error",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Single-network configuration pointing at `rpc_url`, chains 0 and 1.
pub fn config_for(rpc_url: &str) -> TxkitConfig {
    parse_config(&format!(
        r#"
        default_network = "mock"

        [networks.mock]
        network_id = "development"
        rpc_url = "{}"
        chain_ids = ["0", "1"]
        rpc_timeout_secs = 5
        listen_timeout_secs = 5
        "#,
        rpc_url
    ))
    .unwrap()
}

pub fn wallet(n: u8) -> KeyPairWallet {
    KeyPairWallet::from_seed([n; 32], None)
}
