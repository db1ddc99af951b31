//! # chaincall-evm
//!
//! EVM-side building blocks for ChainCall, built on `alloy-core`.
//!
//! - [`abi`]: parse contract ABIs, encode calls, decode return data
//! - [`aggregator`]: the `aggregate3` batched-call wire format (Multicall3)
//! - [`deployless`]: run aggregator bytecode without a deployed contract
//! - [`registry`]: per-chain aggregator deployments
//! - [`revert`]: interpret revert payloads (`Error(string)`, `Panic(uint256)`)
//! - [`normalizer`]: render decoded values as JSON

pub mod abi;
pub mod aggregator;
pub mod deployless;
pub mod error;
pub mod normalizer;
pub mod registry;
pub mod revert;

pub use abi::{AbiSource, CallArgs, ContractAbi, PreparedCall};
pub use aggregator::{decode_aggregate3, encode_aggregate3, AggregateResult, EncodedCall};
pub use deployless::{
    ConstructorDeployless, DeploylessEncoder, DEPLOYLESS_CALL_WRAPPER_BYTECODE, MULTICALL3_BYTECODE,
};
pub use error::AbiError;
pub use registry::{AggregatorContract, ChainRegistry, StaticChainRegistry, MULTICALL3_ADDRESS};
pub use revert::{RevertData, RevertReason};

pub use alloy_core::dyn_abi::{DynSolType, DynSolValue};
pub use alloy_primitives::{Address, Bytes};
