//! The `RpcTransport` trait: how chunks reach a node.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Sends JSON-RPC requests to a node.
///
/// Retry, backoff and rate limiting belong to implementations; the multicall
/// layer issues each chunk request exactly once and shares one transport
/// between concurrent chunks as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Endpoint URL or mock name, for logs.
    fn url(&self) -> &str;

    /// Send `req` and return the raw `result` value.
    ///
    /// Node-side errors come back as [`TransportError::Rpc`].
    async fn call(&self, req: JsonRpcRequest) -> Result<Value, TransportError> {
        tracing::trace!(id = req.id, method = %req.method, url = self.url(), "sending request");
        let resp = self.send(req).await?;
        resp.into_result().map_err(TransportError::Rpc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockSelector;
    use crate::request::JsonRpcError;
    use std::sync::{Arc, Mutex};

    struct EchoTransport {
        seen: Mutex<Vec<String>>,
        reject: bool,
    }

    #[async_trait]
    impl RpcTransport for EchoTransport {
        async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
            self.seen.lock().unwrap().push(req.method.clone());
            if self.reject {
                return Ok(JsonRpcResponse::failure(
                    req.id,
                    JsonRpcError { code: 3, message: "execution reverted".into(), data: None },
                ));
            }
            Ok(JsonRpcResponse::success(req.id, Value::String(req.method)))
        }

        fn url(&self) -> &str {
            "echo"
        }
    }

    fn echo(reject: bool) -> Arc<dyn RpcTransport> {
        Arc::new(EchoTransport { seen: Mutex::new(vec![]), reject })
    }

    #[tokio::test]
    async fn call_returns_result_value() {
        let t = echo(false);
        let value = t.call(JsonRpcRequest::new(1, "eth_chainId", vec![])).await.unwrap();
        assert_eq!(value, Value::String("eth_chainId".into()));
    }

    #[tokio::test]
    async fn call_maps_node_error() {
        let t = echo(true);
        let req = JsonRpcRequest::eth_call(1, serde_json::json!({}), BlockSelector::default());
        let err = t.call(req).await.unwrap_err();
        assert!(matches!(err, TransportError::Rpc(ref e) if e.code == 3));
    }

    #[tokio::test]
    async fn call_sends_through_send() {
        let t = EchoTransport { seen: Mutex::new(vec![]), reject: false };
        t.call(JsonRpcRequest::new(1, "a", vec![])).await.unwrap();
        t.call(JsonRpcRequest::new(2, "b", vec![])).await.unwrap();
        assert_eq!(*t.seen.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
