use alloy_primitives::{Address, B64, B256, Bloom, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A block header as returned by the archive
///
/// Fields are populated only for the columns requested in
/// [`FieldSelection::block`](crate::types::FieldSelection::block).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    /// Keccak-256 hash of the header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<B256>,
    /// Hash of the parent header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<B256>,
    /// Proof-of-work nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<B64>,
    /// Hash of the ommers list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha3_uncles: Option<B256>,
    /// Bloom filter over the logs of every transaction in the block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_bloom: Option<Bloom>,
    /// Root of the transactions trie
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions_root: Option<B256>,
    /// Root of the state trie after execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_root: Option<B256>,
    /// Root of the receipts trie
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipts_root: Option<B256>,
    /// Fee recipient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miner: Option<Address>,
    /// Proof-of-work difficulty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<U256>,
    /// Cumulative difficulty up to and including this block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_difficulty: Option<U256>,
    /// Arbitrary producer data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Bytes>,
    /// Encoded block size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<U256>,
    /// Gas limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<U256>,
    /// Gas used by all transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,
    /// Unix timestamp in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<U256>,
    /// Ommer hashes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncles: Option<Vec<B256>>,
    /// EIP-1559 base fee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    /// EIP-4844 blob gas consumed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U256>,
    /// EIP-4844 running excess blob gas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<U256>,
    /// EIP-4788 parent beacon block root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<B256>,
    /// EIP-4895 withdrawals trie root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals_root: Option<B256>,
    /// EIP-4895 validator withdrawals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<Withdrawal>>,
    /// Arbitrum: L1 block number seen by `block.number`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_block_number: Option<u64>,
    /// Arbitrum: L2-to-L1 message count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_count: Option<U256>,
    /// Arbitrum: outbox merkle root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_root: Option<B256>,
    /// Proof-of-work mix hash (prevrandao after the merge)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_hash: Option<B256>,
}

/// A validator withdrawal from the consensus layer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Monotonic withdrawal index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Validator index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_index: Option<u64>,
    /// Recipient address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Amount in gwei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<U256>,
}
