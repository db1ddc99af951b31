//! The `aggregate3` batched-call format of the Multicall3 aggregator.
//!
//! ```text
//! struct Call3  { address target; bool allowFailure; bytes callData; }
//! struct Result { bool success; bytes returnData; }
//! function aggregate3(Call3[] calls) payable returns (Result[] returnData);
//! ```
//!
//! Selector: `0x82ad56cb` == `keccak256("aggregate3((address,bool,bytes)[])")[..4]`

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, Bytes};

use crate::error::AbiError;

/// The 4-byte selector for `aggregate3((address,bool,bytes)[])`.
pub const AGGREGATE3_SELECTOR: [u8; 4] = [0x82, 0xad, 0x56, 0xcb];

const AGGREGATE3: &str = "aggregate3";

/// One sub-call of an aggregate3 batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    pub target: Address,
    pub allow_failure: bool,
    pub call_data: Bytes,
}

impl EncodedCall {
    /// A sub-call whose failure is reported in its result slot instead of
    /// reverting the whole batch.
    pub fn new(target: Address, call_data: Bytes) -> Self {
        Self {
            target,
            allow_failure: true,
            call_data,
        }
    }
}

/// Per-call outcome reported by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResult {
    pub success: bool,
    pub return_data: Bytes,
}

/// Encode `aggregate3(calls)` calldata.
pub fn encode_aggregate3(calls: &[EncodedCall]) -> Bytes {
    let tuples = calls
        .iter()
        .map(|c| {
            DynSolValue::Tuple(vec![
                DynSolValue::Address(c.target),
                DynSolValue::Bool(c.allow_failure),
                DynSolValue::Bytes(c.call_data.to_vec()),
            ])
        })
        .collect();

    let params = DynSolValue::Tuple(vec![DynSolValue::Array(tuples)]).abi_encode_params();
    let mut calldata = Vec::with_capacity(4 + params.len());
    calldata.extend_from_slice(&AGGREGATE3_SELECTOR);
    calldata.extend_from_slice(&params);
    calldata.into()
}

fn result_array_type() -> DynSolType {
    DynSolType::Array(Box::new(DynSolType::Tuple(vec![
        DynSolType::Bool,
        DynSolType::Bytes,
    ])))
}

/// Decode the return value of `aggregate3`.
///
/// The result order mirrors the request order; callers compare the length
/// against what they sent.
pub fn decode_aggregate3(data: &[u8]) -> Result<Vec<AggregateResult>, AbiError> {
    let err = |reason: String| AbiError::Decode {
        function: AGGREGATE3.into(),
        reason,
    };

    let decoded = DynSolType::Tuple(vec![result_array_type()])
        .abi_decode_params(data)
        .map_err(|e| err(e.to_string()))?;

    let items = match decoded {
        DynSolValue::Tuple(mut outer) if outer.len() == 1 => match outer.pop() {
            Some(DynSolValue::Array(items)) => items,
            _ => return Err(err("expected (bool,bytes)[]".into())),
        },
        _ => return Err(err("expected a single return value".into())),
    };

    items
        .into_iter()
        .map(|item| match item {
            DynSolValue::Tuple(fields) => match fields.as_slice() {
                [DynSolValue::Bool(success), DynSolValue::Bytes(data)] => Ok(AggregateResult {
                    success: *success,
                    return_data: Bytes::copy_from_slice(data),
                }),
                _ => Err(err("malformed (bool,bytes) entry".into())),
            },
            _ => Err(err("expected tuple entry".into())),
        })
        .collect()
}

/// Encode an `aggregate3` return value. Used to build node responses in tests
/// and mock transports.
pub fn encode_aggregate3_result(results: &[AggregateResult]) -> Bytes {
    let tuples = results
        .iter()
        .map(|r| {
            DynSolValue::Tuple(vec![
                DynSolValue::Bool(r.success),
                DynSolValue::Bytes(r.return_data.to_vec()),
            ])
        })
        .collect();
    DynSolValue::Tuple(vec![DynSolValue::Array(tuples)])
        .abi_encode_params()
        .into()
}

/// Decode `aggregate3` calldata back into its sub-calls. Mock transports use
/// this to answer requests per call.
pub fn decode_aggregate3_call(calldata: &[u8]) -> Result<Vec<EncodedCall>, AbiError> {
    let err = |reason: String| AbiError::Decode {
        function: AGGREGATE3.into(),
        reason,
    };
    if calldata.len() < 4 || calldata[..4] != AGGREGATE3_SELECTOR {
        return Err(err("missing aggregate3 selector".into()));
    }

    let call_ty = DynSolType::Array(Box::new(DynSolType::Tuple(vec![
        DynSolType::Address,
        DynSolType::Bool,
        DynSolType::Bytes,
    ])));
    let decoded = DynSolType::Tuple(vec![call_ty])
        .abi_decode_params(&calldata[4..])
        .map_err(|e| err(e.to_string()))?;

    let items = match decoded {
        DynSolValue::Tuple(mut outer) if outer.len() == 1 => match outer.pop() {
            Some(DynSolValue::Array(items)) => items,
            _ => return Err(err("expected (address,bool,bytes)[]".into())),
        },
        _ => return Err(err("expected a single parameter".into())),
    };

    items
        .into_iter()
        .map(|item| match item {
            DynSolValue::Tuple(fields) => match fields.as_slice() {
                [DynSolValue::Address(target), DynSolValue::Bool(allow_failure), DynSolValue::Bytes(data)] => {
                    Ok(EncodedCall {
                        target: *target,
                        allow_failure: *allow_failure,
                        call_data: Bytes::copy_from_slice(data),
                    })
                }
                _ => Err(err("malformed (address,bool,bytes) entry".into())),
            },
            _ => Err(err("expected tuple entry".into())),
        })
        .collect()
}
