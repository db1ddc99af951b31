//! The JSON request file consumed by `chaincall multicall` and `chaincall plan`.
//!
//! ```json
//! {
//!   "calls": [
//!     {
//!       "address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
//!       "abi": ["function balanceOf(address) view returns (uint256)"],
//!       "function": "balanceOf",
//!       "args": ["0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"]
//!     }
//!   ],
//!   "config": { "batch_size": 1024, "block": "latest" },
//!   "deployless": { "wrapper": "0x...", "aggregator": "0x..." }
//! }
//! ```
//!
//! `abi` is a list of human-readable signatures, a standard ABI JSON array,
//! or a path to an ABI JSON file (relative to the request file).
//! `deployless` is optional and replaces the bundled wrapper and Multicall3
//! creation code.

use std::path::{Path, PathBuf};

use alloy_primitives::{Address, Bytes};
use anyhow::{Context, Result};
use chaincall_evm::{AbiSource, CallArgs};
use chaincall_multicall::{CallSpec, MulticallConfig};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RequestFile {
    pub calls: Vec<CallEntry>,
    #[serde(default)]
    pub config: MulticallConfig,
    #[serde(default)]
    pub deployless: Option<DeploylessEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CallEntry {
    pub address: Address,
    pub abi: Value,
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Creation code overrides for deployless execution.
#[derive(Debug, Deserialize)]
pub struct DeploylessEntry {
    /// Constructor wrapper that deploys and calls the aggregator.
    pub wrapper: Bytes,
    /// Aggregator creation code.
    pub aggregator: Bytes,
}

impl RequestFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading request file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing request file {}", path.display()))
    }

    /// Build call specs. ABI problems are left to the engine so they surface
    /// as per-call failures; only unreadable ABI files fail here.
    pub fn call_specs(&self, base_dir: &Path) -> Result<Vec<CallSpec>> {
        self.calls
            .iter()
            .map(|entry| {
                let abi = abi_source(&entry.abi, base_dir)?;
                Ok(CallSpec::new(entry.address, abi, entry.function.clone())
                    .args(CallArgs::Text(entry.args.iter().map(arg_text).collect())))
            })
            .collect()
    }
}

fn abi_source(abi: &Value, base_dir: &Path) -> Result<AbiSource> {
    match abi {
        Value::String(path) => {
            let full: PathBuf = base_dir.join(path);
            let bytes = std::fs::read(&full)
                .with_context(|| format!("reading ABI file {}", full.display()))?;
            Ok(AbiSource::JsonBytes(bytes))
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_string) => {
            let sigs = items.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect();
            Ok(AbiSource::Signatures(sigs))
        }
        other => Ok(AbiSource::Json(other.to_string())),
    }
}

/// Arguments are coerced against the ABI types, so numbers and nested arrays
/// are passed through as their JSON text.
fn arg_text(arg: &Value) -> String {
    match arg {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
