//! JSON-RPC 2.0 envelopes for the `eth_call` requests a chunk is sent as.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::BlockSelector;

pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request. Ids are numeric; the chunk executor numbers chunks from 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            method: method.into(),
            params,
        }
    }

    /// `eth_call` with a transaction object, evaluated at `block`.
    pub fn eth_call(id: u64, tx: Value, block: BlockSelector) -> Self {
        Self::new(id, "eth_call", vec![tx, block.to_rpc_param()])
    }
}

/// The `error` member of a response. Nodes put revert payloads in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node error {}: {}", self.code, self.message)
    }
}

/// Response envelope.
///
/// `id` is kept as raw JSON: a node that cannot parse a request answers
/// with `"id": null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: id.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: id.into(),
            result: None,
            error: Some(error),
        }
    }

    /// The `result` member, or the node's error object. A response with
    /// neither yields `null`.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
