//! chaincall-http: `reqwest`-backed JSON-RPC transport.
//!
//! ```rust,no_run
//! use chaincall_http::HttpRpcClient;
//!
//! let client = HttpRpcClient::default_for("https://rpc.example.com").unwrap();
//! ```

pub mod client;

pub use client::{HttpClientConfig, HttpRpcClient};
