//! # chaincall-multicall
//!
//! Batches many read-only contract calls into `aggregate3` invocations.
//!
//! ## Pipeline
//! ```text
//! CallSpec[] ──encode──▶ EncodedCall[] ──plan──▶ chunks ──execute (bounded)──▶ AggregateResult[]
//!                                                                                   │
//!                      CallOutcome[] (input order) ◀──────── reassemble + decode ◀──┘
//! ```
//!
//! - Calls are packed greedily into chunks bounded by `batch_size` bytes of calldata.
//! - Chunks run concurrently, at most `max_concurrent_chunks` at a time,
//!   one `eth_call` each; a failing chunk never cancels its siblings.
//! - Every input call gets exactly one outcome, in input order. With
//!   `allow_failure = false` the first failure in input order is returned instead.
//!
//! ## Usage
//! ```no_run
//! use std::sync::Arc;
//! use chaincall_evm::{AbiSource, CallArgs};
//! use chaincall_http::HttpRpcClient;
//! use chaincall_multicall::{CallSpec, Multicall, MulticallConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpRpcClient::default_for("https://rpc.example.com")?);
//! let multicall = Multicall::new(transport).with_chain_id(1);
//!
//! let abi = AbiSource::Signatures(vec!["function decimals() view returns (uint8)".into()]);
//! let calls = vec![CallSpec::new(
//!     "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse()?,
//!     abi,
//!     "decimals",
//! )];
//! let outcomes = multicall
//!     .execute(&calls, &MulticallConfig::default(), &CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod config;
pub mod error;
pub mod executor;
pub mod multicall;
pub mod planner;

pub use call::{CallOutcome, CallSpec, CallStatus, ReturnValue};
pub use config::MulticallConfig;
pub use error::{CallError, ChunkError, MulticallError};
pub use executor::{AggregatorTarget, ChunkExecutor};
pub use multicall::Multicall;
pub use planner::{call_cost, plan_chunk_ranges, plan_chunks};
