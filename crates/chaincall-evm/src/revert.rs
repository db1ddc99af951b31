//! Revert payloads returned by failed sub-calls.
//!
//! The raw bytes are always kept. Two standard encodings are recognised for
//! display:
//! - `0x08c379a0` ++ ABI(string): `Error(string)` from `require`/`revert`
//! - `0x4e487b71` ++ ABI(uint256): `Panic(uint256)` from Solidity >= 0.8

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Bytes;
use std::fmt;

/// The 4-byte selector for `Error(string)`.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// The 4-byte selector for `Panic(uint256)`.
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// A recognised revert reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    Message(String),
    Panic { code: u64, meaning: &'static str },
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => write!(f, "{msg}"),
            Self::Panic { code, meaning } => write!(f, "panic {code:#04x} ({meaning})"),
        }
    }
}

/// Raw revert bytes of a sub-call that reported `success = false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertData(pub Bytes);

impl RevertData {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Interpret the payload as `Error(string)` or `Panic(uint256)`.
    pub fn reason(&self) -> Option<RevertReason> {
        let data = self.as_bytes();
        if data.len() < 4 {
            return None;
        }
        let (selector, payload) = data.split_at(4);
        if selector == ERROR_STRING_SELECTOR {
            match DynSolType::String.abi_decode(payload) {
                Ok(DynSolValue::String(s)) => Some(RevertReason::Message(s)),
                _ => None,
            }
        } else if selector == PANIC_SELECTOR {
            match DynSolType::Uint(256).abi_decode(payload) {
                Ok(DynSolValue::Uint(v, _)) => {
                    let code = v.saturating_to::<u64>();
                    Some(RevertReason::Panic {
                        code,
                        meaning: panic_meaning(code),
                    })
                }
                _ => None,
            }
        } else {
            None
        }
    }
}

impl fmt::Display for RevertData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "execution reverted: {reason}"),
            None if self.0.is_empty() => write!(f, "execution reverted"),
            None => write!(f, "execution reverted with data 0x{}", hex::encode(&self.0)),
        }
    }
}

/// Map a Solidity panic code to a human-readable description.
pub fn panic_meaning(code: u64) -> &'static str {
    match code {
        0x00 => "generic compiler-inserted panic",
        0x01 => "assert() called with false condition",
        0x11 => "arithmetic overflow or underflow",
        0x12 => "division or modulo by zero",
        0x21 => "invalid enum value",
        0x22 => "corrupted storage byte array",
        0x31 => ".pop() on empty array",
        0x32 => "out-of-bounds array access",
        0x41 => "too much memory allocated",
        0x51 => "called zero-initialized internal function pointer",
        _ => "unknown panic code",
    }
}
