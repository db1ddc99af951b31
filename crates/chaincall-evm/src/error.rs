//! Error types for ABI parsing, encoding and decoding.

use thiserror::Error;

/// Errors from the ABI codec and the aggregator wire format.
#[derive(Debug, Clone, Error)]
pub enum AbiError {
    #[error("Invalid ABI: {reason}")]
    InvalidAbi { reason: String },

    #[error("Function '{name}' not found in ABI")]
    FunctionNotFound { name: String },

    #[error("No overload of '{name}' accepts {got} argument(s)")]
    ArgumentMismatch { name: String, got: usize },

    #[error("Failed to encode '{function}': {reason}")]
    Encode { function: String, reason: String },

    #[error("Failed to decode '{function}' output: {reason}")]
    Decode { function: String, reason: String },

    #[error("Deployless encoding failed: {reason}")]
    DeploylessEncode { reason: String },
}
