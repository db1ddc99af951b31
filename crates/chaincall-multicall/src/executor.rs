//! Chunk executor: one chunk, one `eth_call`.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use chaincall_core::{BlockSelector, JsonRpcRequest, RpcTransport, TransportError};
use chaincall_evm::{decode_aggregate3, encode_aggregate3, AggregateResult, DeploylessEncoder, EncodedCall};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ChunkError;

/// Where `aggregate3` runs.
#[derive(Clone)]
pub enum AggregatorTarget {
    /// A deployed aggregator contract.
    Deployed(Address),
    /// Aggregator creation code run through a deployless wrapper; the
    /// `eth_call` carries no `to`.
    Deployless {
        encoder: Arc<dyn DeploylessEncoder>,
        bytecode: Bytes,
    },
}

impl fmt::Debug for AggregatorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployed(addr) => f.debug_tuple("Deployed").field(addr).finish(),
            Self::Deployless { bytecode, .. } => f
                .debug_struct("Deployless")
                .field("bytecode_len", &bytecode.len())
                .finish_non_exhaustive(),
        }
    }
}

impl AggregatorTarget {
    /// The `eth_call` transaction object for `aggregate3` calldata.
    fn call_object(&self, aggregate_data: Bytes) -> Result<Value, ChunkError> {
        match self {
            Self::Deployed(address) => Ok(json!({ "to": address, "data": aggregate_data })),
            Self::Deployless { encoder, bytecode } => {
                let data = encoder
                    .wrap_bytecode_call(bytecode, &aggregate_data)
                    .map_err(ChunkError::Encode)?;
                Ok(json!({ "data": data }))
            }
        }
    }

    pub fn is_deployless(&self) -> bool {
        matches!(self, Self::Deployless { .. })
    }
}

/// Sends chunks to the aggregator over an [`RpcTransport`].
///
/// Exactly one request per chunk; retries belong to the transport.
#[derive(Clone)]
pub struct ChunkExecutor {
    transport: Arc<dyn RpcTransport>,
}

impl ChunkExecutor {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Run one chunk and return one [`AggregateResult`] per call, in order.
    ///
    /// Any failure here fails the chunk as a whole: the request, the
    /// cancellation signal, an undecodable response, or a result count that
    /// differs from `calls.len()`.
    pub async fn execute_chunk(
        &self,
        id: u64,
        calls: &[EncodedCall],
        target: &AggregatorTarget,
        block: BlockSelector,
        cancel: &CancellationToken,
    ) -> Result<Vec<AggregateResult>, ChunkError> {
        let tx = target.call_object(encode_aggregate3(calls))?;
        debug!(
            chunk = id,
            calls = calls.len(),
            deployless = target.is_deployless(),
            %block,
            "executing chunk"
        );

        let req = JsonRpcRequest::eth_call(id, tx, block);
        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled.into()),
            res = self.transport.call(req) => res?,
        };

        let data: Bytes = serde_json::from_value(raw).map_err(|e| {
            TransportError::InvalidResponse(format!("eth_call result is not hex data: {e}"))
        })?;
        let results = decode_aggregate3(&data).map_err(ChunkError::Decode)?;
        if results.len() != calls.len() {
            return Err(ChunkError::CountMismatch {
                expected: calls.len(),
                got: results.len(),
            });
        }

        debug!(chunk = id, response_bytes = data.len(), "chunk complete");
        Ok(results)
    }
}
