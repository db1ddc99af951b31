//! chaincall CLI: batch contract reads through Multicall3 from the terminal.
//!
//! Usage:
//! ```bash
//! # Run every call in a request file against a node
//! chaincall multicall --rpc-url https://cloudflare-eth.com --chain-id 1 --file calls.json
//!
//! # Show how the calls would be chunked, without sending anything
//! chaincall plan --file calls.json
//!
//! # List the built-in aggregator deployments
//! chaincall chains
//! ```

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chaincall_evm::{ChainRegistry, ConstructorDeployless, EncodedCall, StaticChainRegistry};
use chaincall_http::{HttpClientConfig, HttpRpcClient};
use chaincall_multicall::{call_cost, plan_chunk_ranges, CallOutcome, Multicall};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

mod logging;
mod request;

use logging::{init_tracing, LogConfig};
use request::RequestFile;

/// Chains whose Multicall3 deployment ships with the built-in registry.
const KNOWN_CHAINS: &[(u64, &str)] = &[
    (1, "Ethereum"),
    (10, "Optimism"),
    (56, "BNB Smart Chain"),
    (100, "Gnosis"),
    (137, "Polygon"),
    (8453, "Base"),
    (42161, "Arbitrum One"),
    (43114, "Avalanche C-Chain"),
    (11155111, "Sepolia"),
];

#[derive(Parser)]
#[command(
    name = "chaincall",
    about = "Batch read-only contract calls through an aggregate3 multicall",
    version
)]
struct Cli {
    /// Log level or EnvFilter directives (logs go to stderr)
    #[arg(long, global = true, env = "CHAINCALL_LOG", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the calls in a request file
    Multicall {
        /// JSON-RPC endpoint
        #[arg(long, env = "CHAINCALL_RPC_URL")]
        rpc_url: String,
        /// Chain id used to look up the aggregator deployment
        #[arg(long)]
        chain_id: Option<u64>,
        /// Request file (calls + config)
        #[arg(short, long)]
        file: PathBuf,
        /// Per-request timeout in milliseconds
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
        /// Retries per chunk request on transient errors
        #[arg(long, default_value_t = 3)]
        retries: u32,
    },

    /// Print the chunk layout for a request file without sending it
    Plan {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List built-in aggregator deployments
    Chains,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&LogConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
        ..Default::default()
    });

    match cli.command {
        Commands::Multicall { rpc_url, chain_id, file, timeout_ms, retries } => {
            cmd_multicall(&rpc_url, chain_id, &file, timeout_ms, retries).await
        }
        Commands::Plan { file } => cmd_plan(&file),
        Commands::Chains => {
            cmd_chains();
            Ok(())
        }
    }
}

fn base_dir(file: &Path) -> &Path {
    file.parent().unwrap_or_else(|| Path::new("."))
}

async fn cmd_multicall(
    rpc_url: &str,
    chain_id: Option<u64>,
    file: &Path,
    timeout_ms: u64,
    retries: u32,
) -> Result<()> {
    let req = RequestFile::load(file)?;
    let calls = req.call_specs(base_dir(file))?;

    let mut http = HttpClientConfig { request_timeout_ms: timeout_ms, ..Default::default() };
    http.retry.max_retries = retries;
    let transport = Arc::new(HttpRpcClient::new(rpc_url, http).context("building HTTP client")?);

    let mut multicall = Multicall::new(transport);
    if let Some(id) = chain_id {
        multicall = multicall.with_chain_id(id);
    }
    if let Some(d) = &req.deployless {
        multicall = multicall.with_deployless(Arc::new(ConstructorDeployless::new(d.wrapper.clone())), d.aggregator.clone());
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight chunks");
            on_ctrl_c.cancel();
        }
    });

    let outcomes = multicall.execute(&calls, &req.config, &cancel).await?;
    let report: Vec<Value> = outcomes.iter().enumerate().map(|(i, o)| outcome_json(i, o)).collect();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn outcome_json(index: usize, outcome: &CallOutcome) -> Value {
    match outcome {
        CallOutcome::Success(value) => json!({
            "index": index,
            "status": outcome.status(),
            "value": value.to_json(),
        }),
        CallOutcome::Failure(err) => {
            let mut entry = json!({
                "index": index,
                "status": outcome.status(),
                "error": err.to_string(),
            });
            if let Some(revert) = err.revert_data() {
                entry["revert_data"] = json!(revert.0);
            }
            entry
        }
    }
}

fn cmd_plan(file: &Path) -> Result<()> {
    let req = RequestFile::load(file)?;
    let calls = req.call_specs(base_dir(file))?;

    let encoded: Vec<EncodedCall> = calls
        .iter()
        .map(|call| {
            let data = call
                .abi
                .resolve()
                .and_then(|abi| abi.encode_call(&call.function_name, &call.args))
                .map(|p| p.call_data)
                .unwrap_or_else(|e| {
                    eprintln!("  warning: {} on {}: {e}", call.function_name, call.address);
                    Default::default()
                });
            EncodedCall::new(call.address, data)
        })
        .collect();

    let chunks = chunk_sizes(&encoded, req.config.batch_size);
    println!("{} calls, batch size {} bytes, {} chunk(s)", encoded.len(), req.config.batch_size, chunks.len());
    for (i, (range, bytes)) in chunks.iter().enumerate() {
        println!("  chunk {i}: calls {}..{} ({} calls, {bytes} bytes)", range.start, range.end, range.len());
    }
    Ok(())
}

/// Each planned chunk with the budget bytes the planner charged for it.
fn chunk_sizes(encoded: &[EncodedCall], batch_size: usize) -> Vec<(Range<usize>, usize)> {
    plan_chunk_ranges(encoded, batch_size)
        .into_iter()
        .map(|range| {
            let bytes = encoded[range.clone()].iter().map(call_cost).sum();
            (range, bytes)
        })
        .collect()
}

fn cmd_chains() {
    let registry = StaticChainRegistry::with_known_chains();
    println!("Built-in aggregator deployments:\n");
    for (chain_id, name) in KNOWN_CHAINS {
        if let Some(contract) = registry.aggregator_contract(*chain_id) {
            let since = contract
                .block_created
                .map(|b| format!("since block {b}"))
                .unwrap_or_else(|| "creation block unknown".into());
            println!("  {chain_id:<10} {name:<18} {} ({since})", contract.address);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chaincall_evm::{Bytes, DynSolValue, RevertData};
    use chaincall_multicall::{CallError, ReturnValue};

    #[test]
    fn success_json() {
        let outcome = CallOutcome::Success(ReturnValue::Single(DynSolValue::Bool(true)));
        assert_eq!(
            outcome_json(0, &outcome),
            json!({"index": 0, "status": "success", "value": true})
        );
    }

    #[test]
    fn revert_json_carries_data() {
        let outcome = CallOutcome::Failure(CallError::Reverted(RevertData(Bytes::from_static(&[0xde, 0xad]))));
        let v = outcome_json(3, &outcome);
        assert_eq!(v["status"], "failure");
        assert_eq!(v["revert_data"], "0xdead");
        assert_eq!(v["error"], "execution reverted with data 0xdead");
    }

    #[test]
    fn every_listed_chain_is_registered() {
        let registry = StaticChainRegistry::with_known_chains();
        for (id, _) in KNOWN_CHAINS {
            assert!(registry.aggregator_contract(*id).is_some(), "chain {id}");
        }
    }

    #[test]
    fn plan_reports_planner_cost() {
        let target = chaincall_evm::Address::repeat_byte(1);
        let encoded = vec![
            EncodedCall::new(target, Bytes::new()),
            EncodedCall::new(target, Bytes::from(vec![0u8; 4])),
            EncodedCall::new(target, Bytes::from(vec![0u8; 5])),
        ];
        // empty calldata still counts 2 bytes, so 2 + 4 fills a 6-byte budget
        assert_eq!(chunk_sizes(&encoded, 6), vec![(0..2, 6), (2..3, 5)]);
        assert_eq!(chunk_sizes(&encoded, 0), vec![(0..3, 11)]);
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from([
            "chaincall", "multicall", "--rpc-url", "http://localhost:8545", "--chain-id", "1", "--file", "calls.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Multicall { chain_id: Some(1), .. }));
    }
}
