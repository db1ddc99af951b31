//! A mock node that executes `aggregate3` in memory.
//!
//! Each request's calldata is decoded back into sub-calls and answered one
//! by one through a responder, so tests can script reverts, empty returns
//! and per-chunk transport failures.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chaincall_core::{JsonRpcRequest, JsonRpcResponse, RpcTransport, TransportError};
use chaincall_evm::aggregator::{decode_aggregate3_call, encode_aggregate3_result};
use chaincall_evm::{
    AbiSource, AggregateResult, CallArgs, ContractAbi, DynSolType, DynSolValue, EncodedCall,
    DEPLOYLESS_CALL_WRAPPER_BYTECODE, MULTICALL3_BYTECODE,
};
use alloy_primitives::{Address, Bytes, U256};
use chaincall_multicall::CallSpec;

pub const TOKEN_SIGNATURES: &[&str] = &[
    "function balanceOf(address owner) view returns (uint256)",
    "function getReserves() view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)",
];

/// Creation code of a custom deployless wrapper the mock also understands.
pub const WRAPPER_CODE: [u8; 4] = [0x60, 0x80, 0x60, 0x40];
/// Stand-in aggregator creation code.
pub const AGGREGATOR_CODE: [u8; 3] = [0xca, 0x11, 0x00];

type Responder = dyn Fn(&EncodedCall) -> AggregateResult + Send + Sync;

pub struct MockAggregator {
    responder: Box<Responder>,
    failing_targets: HashSet<Address>,
    delay: Box<dyn Fn(&[EncodedCall]) -> Duration + Send + Sync>,
    pub requests: Mutex<Vec<JsonRpcRequest>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockAggregator {
    pub fn new(responder: impl Fn(&EncodedCall) -> AggregateResult + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            failing_targets: HashSet::new(),
            delay: Box::new(|_| Duration::ZERO),
            requests: Mutex::new(vec![]),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Answer `balanceOf` with the target's leading address byte.
    pub fn balances() -> Self {
        Self::new(|call| ok_uint(call.target.0[0] as u64))
    }

    /// Fail with an HTTP error any chunk that contains `target`.
    pub fn failing_chunk_with(mut self, target: Address) -> Self {
        self.failing_targets.insert(target);
        self
    }

    pub fn with_delay(mut self, delay: impl Fn(&[EncodedCall]) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn answer(&self, tx: &serde_json::Value) -> Result<Bytes, TransportError> {
        let data: Bytes = serde_json::from_value(tx["data"].clone())?;
        let aggregate_data = if tx.get("to").is_some() {
            data
        } else {
            unwrap_deployless(&data)?
        };
        let calls = decode_aggregate3_call(&aggregate_data)
            .map_err(|e| TransportError::Other(e.to_string()))?;

        if calls.iter().any(|c| self.failing_targets.contains(&c.target)) {
            return Err(TransportError::Http("502 Bad Gateway".into()));
        }
        let results: Vec<_> = calls.iter().map(|c| (self.responder)(c)).collect();
        Ok(encode_aggregate3_result(&results))
    }
}

/// Strip a known wrapper and check it was asked to run the matching
/// aggregator code.
fn unwrap_deployless(data: &[u8]) -> Result<Bytes, TransportError> {
    let bad = |msg: &str| TransportError::Other(format!("bad deployless call: {msg}"));
    let (standard_wrapper, multicall3) = (DEPLOYLESS_CALL_WRAPPER_BYTECODE, MULTICALL3_BYTECODE);
    let known: [(&[u8], &[u8]); 2] = [
        (&standard_wrapper[..], &multicall3[..]),
        (&WRAPPER_CODE[..], &AGGREGATOR_CODE[..]),
    ];
    let (args, aggregator) = known
        .iter()
        .find_map(|(wrapper, code)| data.strip_prefix(*wrapper).map(|args| (args, *code)))
        .ok_or_else(|| bad("unknown wrapper"))?;
    let decoded = DynSolType::Tuple(vec![DynSolType::Bytes, DynSolType::Bytes])
        .abi_decode_params(args)
        .map_err(|e| bad(&e.to_string()))?;
    match decoded {
        DynSolValue::Tuple(fields) => match fields.as_slice() {
            [DynSolValue::Bytes(code), DynSolValue::Bytes(inner)] if code[..] == *aggregator => {
                Ok(Bytes::copy_from_slice(inner))
            }
            _ => Err(bad("unexpected constructor arguments")),
        },
        _ => Err(bad("expected (bytes,bytes)")),
    }
}

#[async_trait]
impl RpcTransport for MockAggregator {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        self.requests.lock().unwrap().push(req.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let tx = &req.params[0];
        let delay = serde_json::from_value::<Bytes>(tx["data"].clone())
            .ok()
            .filter(|_| tx.get("to").is_some())
            .and_then(|d| decode_aggregate3_call(&d).ok())
            .map(|calls| (self.delay)(&calls))
            .unwrap_or_default();
        tokio::time::sleep(delay).await;

        let answer = self.answer(tx);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let data = answer?;
        Ok(JsonRpcResponse::success(req.id, serde_json::Value::String(data.to_string())))
    }

    fn url(&self) -> &str {
        "mock://aggregator"
    }
}

// ─── Builders ─────────────────────────────────────────────────────────────────

pub fn token_abi() -> AbiSource {
    AbiSource::Parsed(Arc::new(ContractAbi::from_signatures(TOKEN_SIGNATURES).unwrap()))
}

pub fn word(n: u64) -> Vec<u8> {
    DynSolValue::Uint(U256::from(n), 256).abi_encode()
}

pub fn ok_uint(n: u64) -> AggregateResult {
    AggregateResult { success: true, return_data: word(n).into() }
}

/// Target `n` lives at `0xnnnn..nn`; the mock answers its balance as `n`.
pub fn token(n: u8) -> Address {
    Address::repeat_byte(n)
}

pub fn balance_of(n: u8) -> CallSpec {
    CallSpec::new(token(n), token_abi(), "balanceOf")
        .args(CallArgs::Values(vec![DynSolValue::Address(Address::repeat_byte(0xee))]))
}

pub fn balance_calls(count: u8) -> Vec<CallSpec> {
    (1..=count).map(balance_of).collect()
}

/// `Error(string)` revert payload.
pub fn revert_with(message: &str) -> Bytes {
    let mut data = vec![0x08, 0xc3, 0x79, 0xa0];
    data.extend(DynSolValue::String(message.into()).abi_encode());
    data.into()
}

pub fn uint_of(value: &DynSolValue) -> u64 {
    match value {
        DynSolValue::Uint(v, _) => v.to::<u64>(),
        other => panic!("expected uint, got {other:?}"),
    }
}
