use alloy_primitives::{Address, B256, Bytes, FixedBytes, U256};
use serde::{Deserialize, Serialize};

/// A parity-style execution trace
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    /// Caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Callee (`None` for creations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// `call`, `delegatecall`, `staticcall` or `callcode`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    /// Gas supplied to the frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    /// Call data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Bytes>,
    /// Creation init code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Bytes>,
    /// Value transferred in wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Reward beneficiary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Address>,
    /// `block` or `uncle`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<String>,
    /// Hash of the containing block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    /// Height of the containing block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Created or destroyed contract
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Deployed code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,
    /// Gas consumed by the frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,
    /// Return data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Bytes>,
    /// Number of child frames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtraces: Option<u64>,
    /// Path of this frame in the call tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_address: Option<Vec<u64>>,
    /// Hash of the transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    /// Position of the transaction within the block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_position: Option<u64>,
    /// `call`, `create`, `suicide` or `reward`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Error message if the frame reverted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// First four bytes of the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sighash: Option<FixedBytes<4>>,
}
