//! Block selectors: which chain state a read is evaluated against.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Symbolic block tags understood by every Ethereum node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    #[default]
    Latest,
    Pending,
    Safe,
    Finalized,
    Earliest,
}

impl BlockTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Pending => "pending",
            Self::Safe => "safe",
            Self::Finalized => "finalized",
            Self::Earliest => "earliest",
        }
    }
}

/// Either a concrete block number or a symbolic tag, never both.
///
/// Deserializes from a JSON number (`19000000`) or a tag string (`"safe"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockSelector {
    Number(u64),
    Tag(BlockTag),
}

impl BlockSelector {
    /// The block number, if this selector pins a specific historical block.
    pub fn number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Tag(_) => None,
        }
    }

    /// Encode as the block parameter of `eth_call` (hex quantity or tag).
    pub fn to_rpc_param(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Default for BlockSelector {
    fn default() -> Self {
        Self::Tag(BlockTag::Latest)
    }
}

impl From<u64> for BlockSelector {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<BlockTag> for BlockSelector {
    fn from(tag: BlockTag) -> Self {
        Self::Tag(tag)
    }
}

impl fmt::Display for BlockSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n:#x}"),
            Self::Tag(tag) => f.write_str(tag.as_str()),
        }
    }
}
