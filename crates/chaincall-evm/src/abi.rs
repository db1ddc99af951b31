//! Contract ABI handling: parse, encode function calls, decode return data.
//!
//! # Usage
//! ```ignore
//! let abi = ContractAbi::from_json(ERC20_ABI)?;
//! let call = abi.encode_call("balanceOf", &CallArgs::Text(vec![holder.into()]))?;
//! let values = call.decode_output(&return_data)?;
//! ```

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_dyn_abi::Specifier;
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::Bytes;
use std::sync::Arc;

use crate::error::AbiError;

/// Where a call's ABI comes from.
///
/// Parsing is deferred until the call is encoded, so a malformed ABI only
/// fails the call that carries it.
#[derive(Debug, Clone)]
pub enum AbiSource {
    /// Standard Ethereum ABI JSON text.
    Json(String),
    /// ABI JSON as raw bytes (e.g. read straight from an artifact file).
    JsonBytes(Vec<u8>),
    /// Human-readable signatures, e.g. `"function decimals() view returns (uint8)"`.
    Signatures(Vec<String>),
    /// An ABI parsed ahead of time, shared between calls.
    Parsed(Arc<ContractAbi>),
}

impl AbiSource {
    /// Parse (or share) the ABI behind this source.
    pub fn resolve(&self) -> Result<Arc<ContractAbi>, AbiError> {
        match self {
            Self::Json(s) => ContractAbi::from_json(s).map(Arc::new),
            Self::JsonBytes(b) => ContractAbi::from_slice(b).map(Arc::new),
            Self::Signatures(sigs) => ContractAbi::from_signatures(sigs).map(Arc::new),
            Self::Parsed(abi) => Ok(Arc::clone(abi)),
        }
    }
}

impl From<ContractAbi> for AbiSource {
    fn from(abi: ContractAbi) -> Self {
        Self::Parsed(Arc::new(abi))
    }
}

impl From<Arc<ContractAbi>> for AbiSource {
    fn from(abi: Arc<ContractAbi>) -> Self {
        Self::Parsed(abi)
    }
}

/// Arguments of a single contract call.
#[derive(Debug, Clone)]
pub enum CallArgs {
    /// Typed values; each must match the declared parameter type.
    Values(Vec<DynSolValue>),
    /// Text values coerced against the declared parameter types
    /// (`"0xd8dA..."`, `"1000000"`, `"true"`, `"[1,2]"`).
    Text(Vec<String>),
}

impl CallArgs {
    pub fn len(&self) -> usize {
        match self {
            Self::Values(v) => v.len(),
            Self::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CallArgs {
    fn default() -> Self {
        Self::Values(vec![])
    }
}

impl From<Vec<DynSolValue>> for CallArgs {
    fn from(values: Vec<DynSolValue>) -> Self {
        Self::Values(values)
    }
}

/// A call whose function has been resolved and whose calldata is ready.
#[derive(Debug, Clone)]
pub struct PreparedCall {
    /// The resolved overload; its outputs drive return-data decoding.
    pub function: Function,
    /// `selector ++ abi_encode_params(args)`.
    pub call_data: Bytes,
}

impl PreparedCall {
    /// Decode return data against the resolved function's outputs.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
        decode_output(&self.function, data)
    }
}

/// A parsed contract ABI.
#[derive(Debug, Clone)]
pub struct ContractAbi {
    abi: JsonAbi,
}

impl ContractAbi {
    /// Parse a standard Ethereum ABI JSON string.
    pub fn from_json(abi_json: &str) -> Result<Self, AbiError> {
        let abi: JsonAbi = serde_json::from_str(abi_json).map_err(|e| AbiError::InvalidAbi {
            reason: format!("invalid ABI JSON: {e}"),
        })?;
        Ok(Self { abi })
    }

    /// Parse ABI JSON from raw bytes.
    pub fn from_slice(abi_json: &[u8]) -> Result<Self, AbiError> {
        let abi: JsonAbi = serde_json::from_slice(abi_json).map_err(|e| AbiError::InvalidAbi {
            reason: format!("invalid ABI JSON: {e}"),
        })?;
        Ok(Self { abi })
    }

    /// Parse human-readable signatures.
    pub fn from_signatures<S: AsRef<str>>(signatures: &[S]) -> Result<Self, AbiError> {
        let abi = JsonAbi::parse(signatures.iter().map(|s| s.as_ref())).map_err(|e| {
            AbiError::InvalidAbi {
                reason: format!("invalid signature: {e}"),
            }
        })?;
        Ok(Self { abi })
    }

    /// Wrap an already parsed alloy ABI.
    pub fn from_json_abi(abi: JsonAbi) -> Self {
        Self { abi }
    }

    /// Returns all function names in this ABI.
    pub fn function_names(&self) -> Vec<&str> {
        self.abi.functions().map(|f| f.name.as_str()).collect()
    }

    /// Encode a call to `function_name`.
    ///
    /// Overloads are tried in declaration order; the first one with a
    /// matching arity that accepts the arguments wins.
    pub fn encode_call(&self, function_name: &str, args: &CallArgs) -> Result<PreparedCall, AbiError> {
        let overloads = self
            .abi
            .function(function_name)
            .ok_or_else(|| AbiError::FunctionNotFound {
                name: function_name.to_string(),
            })?;

        let mut last_err = None;
        for func in overloads.iter().filter(|f| f.inputs.len() == args.len()) {
            match encode_with(func, args) {
                Ok(call_data) => {
                    return Ok(PreparedCall {
                        function: func.clone(),
                        call_data,
                    })
                }
                Err(e) => {
                    tracing::trace!(overload = %func.signature(), error = %e, "overload rejected");
                    last_err = Some(e)
                }
            }
        }

        Err(last_err.unwrap_or_else(|| AbiError::ArgumentMismatch {
            name: function_name.to_string(),
            got: args.len(),
        }))
    }
}

fn encode_with(func: &Function, args: &CallArgs) -> Result<Bytes, AbiError> {
    let err = |reason: String| AbiError::Encode {
        function: func.signature(),
        reason,
    };

    let mut values = Vec::with_capacity(func.inputs.len());
    for (i, param) in func.inputs.iter().enumerate() {
        let ty: DynSolType = param.resolve().map_err(|e| err(format!("param {i}: {e}")))?;
        let value = match args {
            CallArgs::Values(given) => {
                let v = &given[i];
                if !ty.matches(v) {
                    return Err(err(format!(
                        "param {i}: value does not match type {}",
                        ty.sol_type_name()
                    )));
                }
                v.clone()
            }
            CallArgs::Text(given) => ty
                .coerce_str(&given[i])
                .map_err(|e| err(format!("param {i}: {e}")))?,
        };
        values.push(value);
    }

    let mut calldata = func.selector().to_vec();
    calldata.extend_from_slice(&DynSolValue::Tuple(values).abi_encode_params());
    Ok(calldata.into())
}

/// ABI-decode return data against a function's declared outputs.
pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>, AbiError> {
    let err = |reason: String| AbiError::Decode {
        function: function.signature(),
        reason,
    };

    let types = function
        .outputs
        .iter()
        .map(|p| p.resolve())
        .collect::<Result<Vec<DynSolType>, _>>()
        .map_err(|e| err(e.to_string()))?;

    match DynSolType::Tuple(types).abi_decode_params(data) {
        Ok(DynSolValue::Tuple(values)) => Ok(values),
        Ok(other) => Ok(vec![other]),
        Err(e) => Err(err(e.to_string())),
    }
}
