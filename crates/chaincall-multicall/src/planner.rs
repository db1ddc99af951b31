//! Chunk planner: split encoded calls into byte-budgeted chunks.
//!
//! Greedy and order-preserving. Each call costs `max(len(call_data), 2)`
//! bytes, the 2-byte floor standing in for the `"0x"` of an empty call on
//! the wire. This approximates payload size; it does not bound the final
//! JSON-RPC body, which also carries targets and framing.

use std::ops::Range;

use chaincall_evm::EncodedCall;

const MIN_CALL_COST: usize = 2;

/// Bytes a call counts against the chunk budget.
pub fn call_cost(call: &EncodedCall) -> usize {
    call.call_data.len().max(MIN_CALL_COST)
}

/// Partition `calls` into contiguous index ranges.
///
/// - `byte_budget == 0` disables chunking: one range covering everything.
/// - A call that alone exceeds the budget gets its own chunk.
/// - Empty input yields no chunks; otherwise no chunk is empty.
pub fn plan_chunk_ranges(calls: &[EncodedCall], byte_budget: usize) -> Vec<Range<usize>> {
    if calls.is_empty() {
        return vec![];
    }
    if byte_budget == 0 {
        return vec![0..calls.len()];
    }

    let mut ranges = Vec::new();
    let mut start = 0;
    let mut size = 0;
    for (i, call) in calls.iter().enumerate() {
        let cost = call_cost(call);
        if size + cost > byte_budget && i > start {
            ranges.push(start..i);
            start = i;
            size = 0;
        }
        size += cost;
    }
    ranges.push(start..calls.len());
    ranges
}

/// Partition `calls` into owned chunks. See [`plan_chunk_ranges`].
pub fn plan_chunks(calls: &[EncodedCall], byte_budget: usize) -> Vec<Vec<EncodedCall>> {
    plan_chunk_ranges(calls, byte_budget)
        .into_iter()
        .map(|r| calls[r].to_vec())
        .collect()
}
