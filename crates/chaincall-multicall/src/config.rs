//! Multicall configuration.

use alloy_primitives::Address;
use chaincall_core::BlockSelector;
use serde::{Deserialize, Serialize};

/// Options for one multicall invocation.
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticallConfig {
    /// Report failures per call (`true`) or abort on the first one (`false`).
    #[serde(default = "bool_true")]
    pub allow_failure: bool,
    /// Calldata byte budget per chunk; `0` sends everything in one chunk.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Run the aggregator from bytecode instead of a deployed contract.
    #[serde(default)]
    pub deployless: bool,
    /// Aggregator address override; wins over the chain registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multicall_address: Option<Address>,
    /// Block number or tag to read state at.
    #[serde(default)]
    pub block: BlockSelector,
    /// Chunks in flight at once; `0` means no limit.
    #[serde(default = "default_max_concurrent_chunks")]
    pub max_concurrent_chunks: usize,
}

fn bool_true() -> bool { true }
fn default_batch_size() -> usize { 1_024 }
fn default_max_concurrent_chunks() -> usize { 4 }

impl Default for MulticallConfig {
    fn default() -> Self {
        Self {
            allow_failure: true,
            batch_size: default_batch_size(),
            deployless: false,
            multicall_address: None,
            block: BlockSelector::default(),
            max_concurrent_chunks: default_max_concurrent_chunks(),
        }
    }
}

impl MulticallConfig {
    pub fn allow_failure(mut self, allow: bool) -> Self {
        self.allow_failure = allow;
        self
    }

    pub fn batch_size(mut self, bytes: usize) -> Self {
        self.batch_size = bytes;
        self
    }

    pub fn deployless(mut self, deployless: bool) -> Self {
        self.deployless = deployless;
        self
    }

    pub fn multicall_address(mut self, address: Address) -> Self {
        self.multicall_address = Some(address);
        self
    }

    pub fn block(mut self, block: impl Into<BlockSelector>) -> Self {
        self.block = block.into();
        self
    }

    pub fn max_concurrent_chunks(mut self, n: usize) -> Self {
        self.max_concurrent_chunks = n;
        self
    }
}
