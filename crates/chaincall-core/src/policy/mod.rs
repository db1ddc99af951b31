//! Reliability policies applied by transports.
//!
//! Anything above the transport (the multicall engine included) issues each
//! request once and relies on these policies for transient failures.

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy};
