use alloy_primitives::{Address, B256, Bloom, Bytes, FixedBytes, U256};
use serde::{Deserialize, Serialize};

/// A transaction joined with its receipt fields
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hash of the containing block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    /// Height of the containing block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Gas limit supplied by the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    /// Legacy gas price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// First four bytes of the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sighash: Option<FixedBytes<4>>,
    /// Transaction hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<B256>,
    /// Call data or init code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Bytes>,
    /// Sender nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    /// Recipient (`None` for contract creation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Position within the block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u64>,
    /// Value transferred in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Signature recovery value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<U256>,
    /// Signature R
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<U256>,
    /// Signature S
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<U256>,
    /// Signature Y parity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_parity: Option<U256>,
    /// EIP-1559 tip cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// EIP-1559 fee cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    /// EIP-155 chain id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U256>,
    /// EIP-2930 access list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListItem>>,
    /// EIP-4844 blob fee cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_blob_gas: Option<U256>,
    /// EIP-4844 blob versioned hashes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<B256>>,
    /// Gas used in the block up to and including this transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative_gas_used: Option<U256>,
    /// Base fee plus tip actually paid per gas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_gas_price: Option<U256>,
    /// Gas used by this transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,
    /// Address of the contract created, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// Bloom filter over this transaction's logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_bloom: Option<Bloom>,
    /// Envelope type (0 legacy, 1 EIP-2930, 2 EIP-1559, 3 EIP-4844)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
    /// Pre-Byzantium state root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<B256>,
    /// Receipt status (1 success, 0 failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
    /// Optimism: L1 data fee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_fee: Option<U256>,
    /// Optimism: L1 gas price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_gas_price: Option<U256>,
    /// Optimism: L1 gas used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_gas_used: Option<U256>,
    /// Optimism: L1 fee scalar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_fee_scalar: Option<f64>,
    /// Arbitrum: L2 gas spent on L1 calldata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used_for_l1: Option<U256>,
}

/// One entry of an EIP-2930 access list
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessListItem {
    /// Accessed account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Accessed storage slots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_keys: Option<Vec<B256>>,
}
