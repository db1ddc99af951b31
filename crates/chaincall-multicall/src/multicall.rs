//! The multicall orchestrator.

use std::ops::Range;
use std::sync::Arc;

use alloy_primitives::Bytes;
use chaincall_core::RpcTransport;
use chaincall_evm::{
    AbiError, AggregateResult, ChainRegistry, ConstructorDeployless, DeploylessEncoder,
    EncodedCall, PreparedCall, RevertData, StaticChainRegistry, MULTICALL3_BYTECODE,
};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::call::{CallOutcome, CallSpec, ReturnValue};
use crate::config::MulticallConfig;
use crate::error::{CallError, ChunkError, MulticallError};
use crate::executor::{AggregatorTarget, ChunkExecutor};
use crate::planner::plan_chunk_ranges;

type ChunkSlot = Option<Result<Vec<AggregateResult>, Arc<ChunkError>>>;

/// Batches read-only contract calls through an aggregator contract.
///
/// Holds no per-invocation state; one instance can serve concurrent
/// [`execute`](Self::execute) calls.
#[derive(Clone)]
pub struct Multicall {
    transport: Arc<dyn RpcTransport>,
    chain_id: Option<u64>,
    registry: Arc<dyn ChainRegistry>,
    deployless: Option<(Arc<dyn DeploylessEncoder>, Bytes)>,
}

impl Multicall {
    /// A client over `transport` using the well-known Multicall3 deployments.
    ///
    /// Deployless execution runs the bundled Multicall3 creation code through
    /// [`ConstructorDeployless::standard`].
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        let encoder: Arc<dyn DeploylessEncoder> = Arc::new(ConstructorDeployless::standard());
        Self {
            transport,
            chain_id: None,
            registry: Arc::new(StaticChainRegistry::with_known_chains()),
            deployless: Some((encoder, MULTICALL3_BYTECODE)),
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn ChainRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the deployless setup: `aggregator_bytecode` is run through
    /// `encoder` whenever a config sets `deployless`.
    pub fn with_deployless(
        mut self,
        encoder: Arc<dyn DeploylessEncoder>,
        aggregator_bytecode: impl Into<Bytes>,
    ) -> Self {
        self.deployless = Some((encoder, aggregator_bytecode.into()));
        self
    }

    /// Refuse deployless configs, for nodes that reject creation calls.
    pub fn without_deployless(mut self) -> Self {
        self.deployless = None;
        self
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    /// Run `calls` and return one outcome per call, in input order.
    ///
    /// With `allow_failure = false` the first failing call in input order is
    /// returned as [`MulticallError::CallFailed`] instead. Aggregator
    /// resolution errors are returned before any request is sent.
    pub async fn execute(
        &self,
        calls: &[CallSpec],
        config: &MulticallConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<CallOutcome>, MulticallError> {
        let target = self.resolve_target(config)?;

        let prepared: Vec<Result<PreparedCall, AbiError>> = calls
            .iter()
            .map(|call| {
                call.abi
                    .resolve()
                    .and_then(|abi| abi.encode_call(&call.function_name, &call.args))
            })
            .collect();
        // failed encodes still occupy a slot so chunk boundaries stay stable
        let encoded: Vec<EncodedCall> = calls
            .iter()
            .zip(&prepared)
            .map(|(call, p)| {
                let data = p.as_ref().map(|p| p.call_data.clone()).unwrap_or_default();
                EncodedCall::new(call.address, data)
            })
            .collect();

        let ranges = plan_chunk_ranges(&encoded, config.batch_size);
        let slots = self.run_chunks(&encoded, &ranges, &target, config, cancel).await;

        let mut outcomes = Vec::with_capacity(calls.len());
        let mut failures = 0usize;
        for (range, slot) in ranges.iter().zip(&slots) {
            let Some(chunk) = slot else { continue };
            for (offset, index) in range.clone().enumerate() {
                let outcome = settle(&prepared[index], chunk, offset, &calls[index].function_name);
                if let CallOutcome::Failure(err) = &outcome {
                    if !config.allow_failure {
                        return Err(MulticallError::CallFailed {
                            index,
                            target: calls[index].address,
                            function: calls[index].function_name.clone(),
                            source: err.clone(),
                        });
                    }
                    failures += 1;
                }
                outcomes.push(outcome);
            }
        }

        if outcomes.len() != calls.len() {
            return Err(MulticallError::ResultCountMismatch {
                expected: calls.len(),
                got: outcomes.len(),
            });
        }

        info!(
            calls = calls.len(),
            chunks = ranges.len(),
            failures,
            deployless = target.is_deployless(),
            "multicall complete"
        );
        Ok(outcomes)
    }

    /// Like [`execute`](Self::execute), but fails on the first failing call
    /// and returns bare values.
    pub async fn execute_values(
        &self,
        calls: &[CallSpec],
        config: &MulticallConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReturnValue>, MulticallError> {
        let config = config.clone().allow_failure(false);
        let outcomes = self.execute(calls, &config, cancel).await?;
        outcomes
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                outcome.into_result().map_err(|source| MulticallError::CallFailed {
                    index,
                    target: calls[index].address,
                    function: calls[index].function_name.clone(),
                    source,
                })
            })
            .collect()
    }

    fn resolve_target(&self, config: &MulticallConfig) -> Result<AggregatorTarget, MulticallError> {
        if let Some(address) = config.multicall_address {
            return Ok(AggregatorTarget::Deployed(address));
        }

        if config.deployless {
            let (encoder, bytecode) = self
                .deployless
                .as_ref()
                .ok_or(MulticallError::DeploylessUnavailable)?;
            return Ok(AggregatorTarget::Deployless {
                encoder: Arc::clone(encoder),
                bytecode: bytecode.clone(),
            });
        }

        let chain_id = self.chain_id.ok_or(MulticallError::ChainNotConfigured)?;
        let contract = self.registry.aggregator_contract(chain_id).ok_or(
            MulticallError::AggregatorUnavailable {
                chain_id,
                block_number: None,
                block_created: None,
            },
        )?;

        if let Some(block) = config.block.number() {
            if !contract.is_deployed_at(block) {
                return Err(MulticallError::AggregatorUnavailable {
                    chain_id,
                    block_number: Some(block),
                    block_created: contract.block_created,
                });
            }
        }
        Ok(AggregatorTarget::Deployed(contract.address))
    }

    /// Execute every chunk, at most `max_concurrent_chunks` at a time.
    ///
    /// All chunks run to completion; a failed chunk does not stop its
    /// siblings. Slots are indexed by chunk position, not completion order.
    async fn run_chunks(
        &self,
        encoded: &[EncodedCall],
        ranges: &[Range<usize>],
        target: &AggregatorTarget,
        config: &MulticallConfig,
        cancel: &CancellationToken,
    ) -> Vec<ChunkSlot> {
        let limit = match config.max_concurrent_chunks {
            0 => ranges.len().max(1),
            n => n,
        };
        let executor = ChunkExecutor::new(Arc::clone(&self.transport));
        let executor = &executor;
        let block = config.block;

        let mut slots: Vec<ChunkSlot> = (0..ranges.len()).map(|_| None).collect();
        let mut results = stream::iter(ranges.iter().cloned().enumerate())
            .map(|(i, range)| async move {
                let res = executor
                    .execute_chunk(i as u64 + 1, &encoded[range], target, block, cancel)
                    .await;
                (i, res)
            })
            .buffer_unordered(limit);

        while let Some((i, res)) = results.next().await {
            if let Err(e) = &res {
                warn!(chunk = i, calls = ranges[i].len(), error = %e, "chunk failed");
            }
            slots[i] = Some(res.map_err(Arc::new));
        }
        slots
    }
}

/// Fold the chunk result, the encode result and the aggregator's report for
/// one call into its outcome.
fn settle(
    prepared: &Result<PreparedCall, AbiError>,
    chunk: &Result<Vec<AggregateResult>, Arc<ChunkError>>,
    offset: usize,
    function: &str,
) -> CallOutcome {
    let results = match chunk {
        Ok(results) => results,
        Err(e) => return CallOutcome::Failure(CallError::Chunk(Arc::clone(e))),
    };
    let prepared = match prepared {
        Ok(p) => p,
        Err(e) => return CallOutcome::Failure(CallError::Encode(e.clone())),
    };
    // the executor checked the count, so offset is in bounds
    let Some(result) = results.get(offset) else {
        return CallOutcome::Failure(CallError::Chunk(Arc::new(ChunkError::CountMismatch {
            expected: offset + 1,
            got: results.len(),
        })));
    };

    if !result.success {
        return CallOutcome::Failure(CallError::Reverted(RevertData(result.return_data.clone())));
    }
    if result.return_data.is_empty() {
        return CallOutcome::Failure(CallError::ZeroData {
            function: function.to_string(),
        });
    }
    match prepared.decode_output(&result.return_data) {
        Ok(values) => CallOutcome::Success(ReturnValue::from_outputs(values)),
        Err(e) => CallOutcome::Failure(CallError::Decode(e)),
    }
}
