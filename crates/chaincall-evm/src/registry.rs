//! Per-chain aggregator deployments.
//!
//! The registry is an explicit object handed to the client; there is no
//! process-wide table.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical Multicall3 address, identical on every chain it is deployed to.
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Where an aggregator lives on one chain, and since when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorContract {
    pub address: Address,
    /// Block the contract was created in; reads pinned to earlier blocks
    /// cannot use it.
    #[serde(default)]
    pub block_created: Option<u64>,
}

impl AggregatorContract {
    /// Whether the contract exists at `block`.
    pub fn is_deployed_at(&self, block: u64) -> bool {
        self.block_created.map_or(true, |created| block >= created)
    }
}

/// Lookup of aggregator deployments by chain id.
pub trait ChainRegistry: Send + Sync {
    fn aggregator_contract(&self, chain_id: u64) -> Option<AggregatorContract>;
}

/// In-memory registry seeded with well-known Multicall3 deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticChainRegistry {
    contracts: HashMap<u64, AggregatorContract>,
}

/// (chain id, Multicall3 creation block)
const KNOWN_DEPLOYMENTS: &[(u64, u64)] = &[
    (1, 14_353_601),        // Ethereum
    (10, 4_286_263),        // Optimism
    (56, 15_921_452),       // BNB Smart Chain
    (100, 21_022_491),      // Gnosis
    (137, 25_770_160),      // Polygon
    (8453, 5_022),          // Base
    (42161, 7_654_707),     // Arbitrum One
    (43114, 11_907_934),    // Avalanche C-Chain
    (11155111, 751_532),    // Sepolia
];

impl StaticChainRegistry {
    /// A registry with no deployments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the canonical Multicall3 deployment on well-known chains.
    pub fn with_known_chains() -> Self {
        let contracts = KNOWN_DEPLOYMENTS
            .iter()
            .map(|&(chain_id, block)| {
                (
                    chain_id,
                    AggregatorContract {
                        address: MULTICALL3_ADDRESS,
                        block_created: Some(block),
                    },
                )
            })
            .collect();
        Self { contracts }
    }

    /// Add or replace the deployment for `chain_id`.
    pub fn with_contract(mut self, chain_id: u64, contract: AggregatorContract) -> Self {
        self.contracts.insert(chain_id, contract);
        self
    }

    pub fn insert(&mut self, chain_id: u64, contract: AggregatorContract) {
        self.contracts.insert(chain_id, contract);
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl ChainRegistry for StaticChainRegistry {
    fn aggregator_contract(&self, chain_id: u64) -> Option<AggregatorContract> {
        self.contracts.get(&chain_id).copied()
    }
}
