//! Converts alloy `DynSolValue` → `serde_json::Value` for display and export.
//!
//! Integers are rendered as decimal strings so 256-bit values survive JSON
//! consumers that parse numbers as doubles.

use alloy_core::dyn_abi::DynSolValue;
use serde_json::Value;

/// Render a decoded value as JSON.
pub fn value_to_json(val: &DynSolValue) -> Value {
    match val {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word[..*size])))
        }
        DynSolValue::Bytes(b) => Value::String(format!("0x{}", hex::encode(b))),
        DynSolValue::String(s) => Value::String(s.clone()),
        // EIP-55 checksum encoding
        DynSolValue::Address(a) => Value::String(a.to_checksum(None)),
        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) | DynSolValue::Tuple(vals) => {
            Value::Array(vals.iter().map(value_to_json).collect())
        }
        DynSolValue::Function(f) => Value::String(format!("0x{}", hex::encode(f.as_slice()))),
    }
}

/// Render a list of values, e.g. all outputs of a function.
pub fn values_to_json(vals: &[DynSolValue]) -> Value {
    Value::Array(vals.iter().map(value_to_json).collect())
}
