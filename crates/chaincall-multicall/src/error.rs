//! Error types for the multicall engine.
//!
//! Three layers:
//! - [`ChunkError`]: one aggregate `eth_call` failed as a whole
//! - [`CallError`]: why a single call has a failure outcome
//! - [`MulticallError`]: the whole invocation failed

use std::sync::Arc;

use alloy_primitives::Address;
use chaincall_core::TransportError;
use chaincall_evm::{AbiError, RevertData};
use thiserror::Error;

/// A chunk-wide failure, shared by every call in the chunk.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("failed to build aggregate call: {0}")]
    Encode(AbiError),

    #[error("eth_call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to decode aggregate3 result: {0}")]
    Decode(AbiError),

    #[error("aggregator returned {got} results for {expected} calls")]
    CountMismatch { expected: usize, got: usize },
}

/// Why one call ended in a failure outcome.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// The ABI could not be parsed or the arguments could not be encoded.
    #[error("encode failed: {0}")]
    Encode(AbiError),

    /// The chunk carrying this call failed.
    #[error("{0}")]
    Chunk(Arc<ChunkError>),

    /// The aggregator reported `success = false`.
    #[error("{0}")]
    Reverted(RevertData),

    /// `success = true` with empty return data: almost always a revert the
    /// aggregator swallowed, or a call to an address without code.
    #[error("'{function}' returned no data")]
    ZeroData { function: String },

    /// Return data does not match the function's outputs.
    #[error("{0}")]
    Decode(AbiError),
}

impl CallError {
    /// Revert bytes, if the aggregator reported this call as reverted.
    pub fn revert_data(&self) -> Option<&RevertData> {
        match self {
            Self::Reverted(data) => Some(data),
            _ => None,
        }
    }
}

/// A failure of the multicall invocation as a whole.
#[derive(Debug, Error)]
pub enum MulticallError {
    #[error("no chain configured: set a chain id or an explicit multicall address")]
    ChainNotConfigured,

    #[error(
        "chain {chain_id} does not support the aggregator contract{}",
        floor_note(.block_number, .block_created)
    )]
    AggregatorUnavailable {
        chain_id: u64,
        block_number: Option<u64>,
        block_created: Option<u64>,
    },

    #[error("deployless execution requested but it is disabled on this client")]
    DeploylessUnavailable,

    #[error("call #{index} ({function} on {target}) failed: {source}")]
    CallFailed {
        index: usize,
        target: Address,
        function: String,
        #[source]
        source: CallError,
    },

    #[error("multicall produced {got} results for {expected} calls")]
    ResultCountMismatch { expected: usize, got: usize },
}

fn floor_note(block_number: &Option<u64>, block_created: &Option<u64>) -> String {
    match (block_number, block_created) {
        (Some(n), Some(created)) => {
            format!(" at block {n} (deployed at block {created})")
        }
        _ => String::new(),
    }
}
