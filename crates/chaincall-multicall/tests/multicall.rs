//! End-to-end multicall behaviour against an in-memory aggregator.

mod common;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use chaincall_core::{BlockTag, TransportError};
use chaincall_evm::{
    AbiError, AbiSource, AggregateResult, AggregatorContract, CallArgs, ConstructorDeployless,
    DynSolValue, RevertReason, StaticChainRegistry, DEPLOYLESS_CALL_WRAPPER_BYTECODE,
    MULTICALL3_ADDRESS,
};
use chaincall_multicall::{
    CallError, CallOutcome, CallSpec, CallStatus, ChunkError, Multicall, MulticallConfig,
    MulticallError, ReturnValue,
};
use common::*;
use tokio_util::sync::CancellationToken;

fn client(mock: &Arc<MockAggregator>) -> Multicall {
    Multicall::new(mock.clone()).with_chain_id(1)
}

fn balances(outcomes: &[CallOutcome]) -> Vec<Option<u64>> {
    outcomes
        .iter()
        .map(|o| o.value().and_then(ReturnValue::as_single).map(uint_of))
        .collect()
}

async fn run(mc: &Multicall, calls: &[CallSpec], cfg: MulticallConfig) -> Result<Vec<CallOutcome>, MulticallError> {
    mc.execute(calls, &cfg, &CancellationToken::new()).await
}

// ─── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn all_calls_succeed_in_one_round_trip() {
    let mock = Arc::new(MockAggregator::balances());
    let outcomes = run(&client(&mock), &balance_calls(3), MulticallConfig::default())
        .await
        .unwrap();

    assert_eq!(balances(&outcomes), vec![Some(1), Some(2), Some(3)]);
    assert!(outcomes.iter().all(|o| o.status() == CallStatus::Success));
    assert_eq!(mock.request_count(), 1);

    let req = &mock.requests.lock().unwrap()[0];
    assert_eq!(req.method, "eth_call");
    assert_eq!(
        req.params[0]["to"].as_str().unwrap().to_lowercase(),
        format!("{:#x}", MULTICALL3_ADDRESS)
    );
    assert_eq!(req.params[1], serde_json::json!("latest"));
}

#[tokio::test]
async fn unknown_function_is_isolated() {
    let mock = Arc::new(MockAggregator::balances());
    let mut calls = balance_calls(3);
    calls[1].function_name = "balanceOff".into();

    let outcomes = run(&client(&mock), &calls, MulticallConfig::default()).await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(balances(&outcomes), vec![Some(1), None, Some(3)]);
    assert!(matches!(
        outcomes[1].error(),
        Some(CallError::Encode(AbiError::FunctionNotFound { name })) if name == "balanceOff"
    ));
}

#[tokio::test]
async fn unknown_function_fails_fast() {
    let mock = Arc::new(MockAggregator::balances());
    let mut calls = balance_calls(3);
    calls[1].function_name = "balanceOff".into();

    let err = run(&client(&mock), &calls, MulticallConfig::default().allow_failure(false))
        .await
        .unwrap_err();
    match err {
        MulticallError::CallFailed { index, target, function, source } => {
            assert_eq!(index, 1);
            assert_eq!(target, token(2));
            assert_eq!(function, "balanceOff");
            assert!(matches!(source, CallError::Encode(_)));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn oversized_batch_is_chunked() {
    let mock = Arc::new(MockAggregator::balances());
    // balanceOf calldata is 36 bytes: two calls per 100-byte chunk
    let outcomes = run(&client(&mock), &balance_calls(5), MulticallConfig::default().batch_size(100))
        .await
        .unwrap();

    assert_eq!(mock.request_count(), 3);
    assert_eq!(balances(&outcomes), (1..=5).map(Some).collect::<Vec<_>>());
}

#[tokio::test]
async fn revert_keeps_raw_bytes() {
    let reason = revert_with("insufficient balance");
    let revert_bytes = reason.clone();
    let mock = Arc::new(MockAggregator::new(move |call| {
        if call.target == token(2) {
            AggregateResult { success: false, return_data: revert_bytes.clone() }
        } else {
            ok_uint(call.target.0[0] as u64)
        }
    }));

    let outcomes = run(&client(&mock), &balance_calls(3), MulticallConfig::default())
        .await
        .unwrap();
    assert_eq!(balances(&outcomes), vec![Some(1), None, Some(3)]);

    let revert = outcomes[1].error().and_then(CallError::revert_data).unwrap();
    assert_eq!(revert.0, reason);
    assert_eq!(revert.reason(), Some(RevertReason::Message("insufficient balance".into())));
}

#[tokio::test]
async fn failed_chunk_only_affects_its_calls() {
    // chunks: [1, 2] [3, 4]
    let mock = Arc::new(MockAggregator::balances().failing_chunk_with(token(3)));
    let outcomes = run(&client(&mock), &balance_calls(4), MulticallConfig::default().batch_size(100))
        .await
        .unwrap();

    assert_eq!(mock.request_count(), 2);
    assert_eq!(balances(&outcomes), vec![Some(1), Some(2), None, None]);
    for outcome in &outcomes[2..] {
        match outcome.error() {
            Some(CallError::Chunk(err)) => {
                assert!(matches!(**err, ChunkError::Transport(TransportError::Http(_))))
            }
            other => panic!("expected chunk error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn unregistered_chain_makes_no_requests() {
    let mock = Arc::new(MockAggregator::balances());
    let mc = Multicall::new(mock.clone()).with_chain_id(31337);

    let err = run(&mc, &balance_calls(2), MulticallConfig::default()).await.unwrap_err();
    assert!(matches!(err, MulticallError::AggregatorUnavailable { chain_id: 31337, .. }));
    assert_eq!(mock.request_count(), 0);
}

// ─── Ordering and concurrency ─────────────────────────────────────────────────

#[tokio::test]
async fn order_survives_out_of_order_completion() {
    // later chunks answer first
    let mock = Arc::new(
        MockAggregator::balances()
            .with_delay(|calls| Duration::from_millis(40 - calls[0].target.0[0] as u64 * 2)),
    );
    let mc = client(&mock);
    let calls = balance_calls(17);
    let expected: Vec<_> = (1..=17).map(Some).collect();

    for (batch, concurrency) in [(36, 0), (36, 3), (100, 1), (250, 2), (0, 4)] {
        let cfg = MulticallConfig::default().batch_size(batch).max_concurrent_chunks(concurrency);
        let outcomes = run(&mc, &calls, cfg).await.unwrap();
        assert_eq!(balances(&outcomes), expected, "batch={batch} concurrency={concurrency}");
    }
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let mock = Arc::new(MockAggregator::balances().with_delay(|_| Duration::from_millis(20)));
    let cfg = MulticallConfig::default().batch_size(36).max_concurrent_chunks(2);

    let outcomes = run(&client(&mock), &balance_calls(10), cfg).await.unwrap();
    assert_eq!(outcomes.len(), 10);
    assert_eq!(mock.request_count(), 10);
    assert_eq!(mock.max_in_flight(), 2);
}

#[tokio::test]
async fn zero_limit_runs_every_chunk_at_once() {
    let mock = Arc::new(MockAggregator::balances().with_delay(|_| Duration::from_millis(20)));
    let cfg = MulticallConfig::default().batch_size(36).max_concurrent_chunks(0);

    run(&client(&mock), &balance_calls(5), cfg).await.unwrap();
    assert_eq!(mock.max_in_flight(), 5);
}

#[tokio::test]
async fn empty_input() {
    let mock = Arc::new(MockAggregator::balances());
    let outcomes = run(&client(&mock), &[], MulticallConfig::default()).await.unwrap();
    assert!(outcomes.is_empty());
    assert_eq!(mock.request_count(), 0);
}

// ─── Aggregator resolution ────────────────────────────────────────────────────

#[tokio::test]
async fn explicit_address_needs_no_chain() {
    let mock = Arc::new(MockAggregator::balances());
    let custom = Address::repeat_byte(0xab);
    let mc = Multicall::new(mock.clone());

    let outcomes = run(&mc, &balance_calls(2), MulticallConfig::default().multicall_address(custom))
        .await
        .unwrap();
    assert_eq!(balances(&outcomes), vec![Some(1), Some(2)]);

    let req = &mock.requests.lock().unwrap()[0];
    assert_eq!(req.params[0]["to"].as_str().unwrap().to_lowercase(), format!("{custom:#x}"));
}

#[tokio::test]
async fn block_below_deployment_is_rejected() {
    let mock = Arc::new(MockAggregator::balances());
    let cfg = MulticallConfig::default().block(14_000_000u64);

    let err = run(&client(&mock), &balance_calls(1), cfg).await.unwrap_err();
    assert!(matches!(
        err,
        MulticallError::AggregatorUnavailable {
            chain_id: 1,
            block_number: Some(14_000_000),
            block_created: Some(14_353_601),
        }
    ));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn pinned_block_is_forwarded() {
    let mock = Arc::new(MockAggregator::balances());
    let cfg = MulticallConfig::default().block(20_000_000u64);

    run(&client(&mock), &balance_calls(1), cfg).await.unwrap();
    let req = &mock.requests.lock().unwrap()[0];
    assert_eq!(req.params[1], serde_json::json!("0x1312d00"));
}

#[tokio::test]
async fn custom_registry() {
    let mock = Arc::new(MockAggregator::balances());
    let local = Address::repeat_byte(0x31);
    let registry = StaticChainRegistry::empty()
        .with_contract(31337, AggregatorContract { address: local, block_created: None });
    let mc = Multicall::new(mock.clone())
        .with_chain_id(31337)
        .with_registry(Arc::new(registry));

    let cfg = MulticallConfig::default().block(BlockTag::Pending);
    run(&mc, &balance_calls(1), cfg).await.unwrap();
    let req = &mock.requests.lock().unwrap()[0];
    assert_eq!(req.params[0]["to"].as_str().unwrap().to_lowercase(), format!("{local:#x}"));
    assert_eq!(req.params[1], serde_json::json!("pending"));
}

#[tokio::test]
async fn deployless_on_chain_without_aggregator() {
    let mock = Arc::new(MockAggregator::balances());
    let mc = Multicall::new(mock.clone()).with_chain_id(31337);

    let outcomes = run(&mc, &balance_calls(2), MulticallConfig::default().deployless(true))
        .await
        .unwrap();
    assert_eq!(balances(&outcomes), vec![Some(1), Some(2)]);

    let req = &mock.requests.lock().unwrap()[0];
    let tx = req.params[0].as_object().unwrap();
    assert!(!tx.contains_key("to"));
    let data: Bytes = serde_json::from_value(tx["data"].clone()).unwrap();
    assert!(data.starts_with(&DEPLOYLESS_CALL_WRAPPER_BYTECODE));
}

#[tokio::test]
async fn deployless_with_custom_wrapper() {
    let mock = Arc::new(MockAggregator::balances());
    let mc = Multicall::new(mock.clone())
        .with_deployless(Arc::new(ConstructorDeployless::new(WRAPPER_CODE.to_vec())), AGGREGATOR_CODE.to_vec());

    let outcomes = run(&mc, &balance_calls(3), MulticallConfig::default().deployless(true))
        .await
        .unwrap();
    assert_eq!(balances(&outcomes), vec![Some(1), Some(2), Some(3)]);

    let req = &mock.requests.lock().unwrap()[0];
    let tx = req.params[0].as_object().unwrap();
    assert!(!tx.contains_key("to"));
    assert!(tx["data"].as_str().unwrap().starts_with("0x60806040"));
}

#[tokio::test]
async fn deployless_switched_off() {
    let mock = Arc::new(MockAggregator::balances());
    let mc = client(&mock).without_deployless();
    let err = run(&mc, &balance_calls(1), MulticallConfig::default().deployless(true))
        .await
        .unwrap_err();
    assert!(matches!(err, MulticallError::DeploylessUnavailable));
    assert_eq!(mock.request_count(), 0);
}

// ─── Per-call failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_return_is_zero_data() {
    let mock = Arc::new(MockAggregator::new(|call| {
        if call.target == token(1) {
            AggregateResult { success: true, return_data: Bytes::new() }
        } else {
            ok_uint(7)
        }
    }));
    let outcomes = run(&client(&mock), &balance_calls(2), MulticallConfig::default())
        .await
        .unwrap();

    assert!(matches!(
        outcomes[0].error(),
        Some(CallError::ZeroData { function }) if function == "balanceOf"
    ));
    assert_eq!(balances(&outcomes)[1], Some(7));
}

#[tokio::test]
async fn short_return_is_decode_error() {
    let mock = Arc::new(MockAggregator::new(|_| AggregateResult {
        success: true,
        return_data: Bytes::from_static(&[0x01, 0x02, 0x03]),
    }));
    let outcomes = run(&client(&mock), &balance_calls(1), MulticallConfig::default())
        .await
        .unwrap();
    assert!(matches!(outcomes[0].error(), Some(CallError::Decode(AbiError::Decode { .. }))));
}

#[tokio::test]
async fn first_failure_in_input_order_wins() {
    // call 2 reverts, call 4's chunk fails; call 2 comes first
    let mock = Arc::new(
        MockAggregator::new(|call| {
            if call.target == token(2) {
                AggregateResult { success: false, return_data: Bytes::new() }
            } else {
                ok_uint(1)
            }
        })
        .failing_chunk_with(token(4)),
    );
    let cfg = MulticallConfig::default().batch_size(72).allow_failure(false);

    let err = run(&client(&mock), &balance_calls(4), cfg).await.unwrap_err();
    match err {
        MulticallError::CallFailed { index, source, .. } => {
            assert_eq!(index, 1);
            assert!(matches!(source, CallError::Reverted(_)));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn multiple_outputs() {
    let mock = Arc::new(MockAggregator::new(|_| {
        let mut data = word(1_000);
        data.extend(word(2_000));
        data.extend(word(1_700_000_000));
        AggregateResult { success: true, return_data: data.into() }
    }));
    let calls = vec![CallSpec::new(token(9), token_abi(), "getReserves")];

    let outcomes = run(&client(&mock), &calls, MulticallConfig::default()).await.unwrap();
    match outcomes[0].value() {
        Some(ReturnValue::Multiple(values)) => {
            assert_eq!(values.iter().map(uint_of).collect::<Vec<_>>(), vec![1_000, 2_000, 1_700_000_000]);
        }
        other => panic!("expected multiple outputs, got {other:?}"),
    }
}

#[tokio::test]
async fn json_abi_and_text_args() {
    let mock = Arc::new(MockAggregator::balances());
    let abi = AbiSource::Json(
        r#"[{"type":"function","name":"balanceOf","stateMutability":"view",
             "inputs":[{"name":"owner","type":"address"}],
             "outputs":[{"name":"","type":"uint256"}]}]"#
            .into(),
    );
    let calls = vec![
        CallSpec::new(token(5), abi.clone(), "balanceOf")
            .args(CallArgs::Text(vec!["0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".into()])),
        CallSpec::new(token(6), AbiSource::Json("not json".into()), "balanceOf"),
        CallSpec::new(token(7), abi, "balanceOf").args(vec![DynSolValue::Bool(true)]),
    ];

    let outcomes = run(&client(&mock), &calls, MulticallConfig::default()).await.unwrap();
    assert_eq!(balances(&outcomes), vec![Some(5), None, None]);
    assert!(matches!(outcomes[1].error(), Some(CallError::Encode(AbiError::InvalidAbi { .. }))));
    assert!(matches!(outcomes[2].error(), Some(CallError::Encode(AbiError::Encode { .. }))));
}

#[tokio::test]
async fn execute_values_is_fail_fast() {
    let mock = Arc::new(MockAggregator::balances());
    let mc = client(&mock);
    let cancel = CancellationToken::new();

    let values = mc
        .execute_values(&balance_calls(2), &MulticallConfig::default(), &cancel)
        .await
        .unwrap();
    assert_eq!(values.iter().filter_map(ReturnValue::as_single).map(uint_of).collect::<Vec<_>>(), vec![1, 2]);

    let mut calls = balance_calls(2);
    calls[0].function_name = "missing".into();
    let err = mc.execute_values(&calls, &MulticallConfig::default(), &cancel).await.unwrap_err();
    assert!(matches!(err, MulticallError::CallFailed { index: 0, .. }));
}

// ─── Cancellation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancelled_before_start() {
    let mock = Arc::new(MockAggregator::balances());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcomes = client(&mock)
        .execute(&balance_calls(3), &MulticallConfig::default().batch_size(36), &cancel)
        .await
        .unwrap();
    assert_eq!(mock.request_count(), 0);
    for outcome in &outcomes {
        match outcome.error() {
            Some(CallError::Chunk(err)) => {
                assert!(matches!(**err, ChunkError::Transport(TransportError::Cancelled)))
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn cancelled_in_flight() {
    let mock = Arc::new(MockAggregator::balances().with_delay(|_| Duration::from_secs(30)));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = client(&mock)
        .execute(&balance_calls(2), &MulticallConfig::default().allow_failure(false), &cancel)
        .await
        .unwrap_err();
    assert_eq!(mock.request_count(), 1);
    match err {
        MulticallError::CallFailed { index: 0, source: CallError::Chunk(chunk), .. } => {
            assert!(matches!(*chunk, ChunkError::Transport(TransportError::Cancelled)));
        }
        other => panic!("unexpected error {other:?}"),
    }
}
