use alloy_primitives::{Address, B256, Bytes};
use serde::{Deserialize, Serialize};

/// An event log
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// True if the log was removed by a reorg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
    /// Position of the log within the block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
    /// Position of the emitting transaction within the block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u64>,
    /// Hash of the emitting transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// Hash of the containing block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    /// Height of the containing block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Emitting contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Non-indexed event data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    /// Event signature hash (absent for anonymous events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic0: Option<B256>,
    /// First indexed argument
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic1: Option<B256>,
    /// Second indexed argument
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic2: Option<B256>,
    /// Third indexed argument
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic3: Option<B256>,
}

impl Log {
    /// Present topics in position order
    pub fn topics(&self) -> impl Iterator<Item = &B256> {
        [&self.topic0, &self.topic1, &self.topic2, &self.topic3]
            .into_iter()
            .flatten()
    }
}
