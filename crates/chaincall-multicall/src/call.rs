//! Call inputs and per-call outcomes.

use alloy_primitives::Address;
use chaincall_evm::normalizer::{value_to_json, values_to_json};
use chaincall_evm::{AbiSource, CallArgs, DynSolValue};
use serde::{Deserialize, Serialize};

use crate::error::CallError;

/// One read-only contract call requested by the caller.
#[derive(Debug, Clone)]
pub struct CallSpec {
    pub address: Address,
    pub abi: AbiSource,
    pub function_name: String,
    pub args: CallArgs,
}

impl CallSpec {
    /// A call with no arguments. Add them with [`CallSpec::args`].
    pub fn new(address: Address, abi: impl Into<AbiSource>, function_name: impl Into<String>) -> Self {
        Self {
            address,
            abi: abi.into(),
            function_name: function_name.into(),
            args: CallArgs::default(),
        }
    }

    pub fn args(mut self, args: impl Into<CallArgs>) -> Self {
        self.args = args.into();
        self
    }
}

/// Decoded return value of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    /// The function declares exactly one output.
    Single(DynSolValue),
    /// Zero or several outputs, in declaration order.
    Multiple(Vec<DynSolValue>),
}

impl ReturnValue {
    pub fn from_outputs(mut values: Vec<DynSolValue>) -> Self {
        if values.len() == 1 {
            if let Some(v) = values.pop() {
                return Self::Single(v);
            }
        }
        Self::Multiple(values)
    }

    pub fn as_single(&self) -> Option<&DynSolValue> {
        match self {
            Self::Single(v) => Some(v),
            Self::Multiple(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Single(v) => value_to_json(v),
            Self::Multiple(vs) => values_to_json(vs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Failure,
}

/// Final outcome of one call, in the caller's input order.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    Success(ReturnValue),
    Failure(CallError),
}

impl CallOutcome {
    pub fn status(&self) -> CallStatus {
        match self {
            Self::Success(_) => CallStatus::Success,
            Self::Failure(_) => CallStatus::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn value(&self) -> Option<&ReturnValue> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&CallError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<ReturnValue, CallError> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Failure(e) => Err(e),
        }
    }
}
