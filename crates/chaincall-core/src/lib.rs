//! chaincall-core: foundation traits and types for ChainCall.
//!
//! # Overview
//!
//! ChainCall batches read-only contract calls through an on-chain aggregator
//! contract. The core crate defines the pieces every other crate builds on:
//!
//! - [`RpcTransport`]: the async trait every JSON-RPC transport implements
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`TransportError`]: structured transport error type
//! - [`BlockSelector`]: block number or tag to read chain state at
//! - [`policy`] module: retry/backoff policy used by transports

pub mod block;
pub mod error;
pub mod policy;
pub mod request;
pub mod transport;

pub use block::{BlockSelector, BlockTag};
pub use error::TransportError;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use transport::RpcTransport;
