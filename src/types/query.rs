use alloy_primitives::{Address, B256, FixedBytes};
use serde::{Deserialize, Serialize};

/// A logical block-range query
///
/// `from_block` is inclusive and `to_block` exclusive. When `to_block` is `None` the
/// stream resolves it from the archive height before dispatching.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// First block to scan (inclusive)
    pub from_block: u64,

    /// Block to stop at (exclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_block: Option<u64>,

    /// Log filters; a log matching any selection is returned
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogSelection>,

    /// Transaction filters; a transaction matching any selection is returned
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TransactionSelection>,

    /// Trace filters; a trace matching any selection is returned
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<TraceSelection>,

    /// Return every block in range, not only those joined to a matching record
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_all_blocks: bool,

    /// Columns to return per category
    #[serde(default)]
    pub field_selection: FieldSelection,

    /// Server-side cap on blocks per response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_blocks: Option<u64>,

    /// Server-side cap on transactions per response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_transactions: Option<u64>,

    /// Server-side cap on logs per response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_logs: Option<u64>,

    /// Server-side cap on traces per response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_num_traces: Option<u64>,

    /// How matched records pull in related records
    #[serde(default)]
    pub join_mode: JoinMode,
}

impl Query {
    /// Copy of this query narrowed to `[from, to)`
    pub fn with_range(&self, from: u64, to: u64) -> Self {
        Self {
            from_block: from,
            to_block: Some(to),
            ..self.clone()
        }
    }

    /// True if no filter and no `include_all_blocks` is set, so the server would
    /// return nothing
    pub fn selects_nothing(&self) -> bool {
        self.logs.is_empty()
            && self.transactions.is_empty()
            && self.traces.is_empty()
            && !self.include_all_blocks
    }
}

/// Column names to return per category
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelection {
    /// Block columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block: Vec<String>,
    /// Transaction columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transaction: Vec<String>,
    /// Log columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<String>,
    /// Trace columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
}

/// Join behaviour between categories
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinMode {
    /// Join transactions to matched logs and blocks to everything
    #[default]
    Default,
    /// Join every related record in every direction
    JoinAll,
    /// Return only the directly matched records
    JoinNothing,
}

/// Log filter: an empty list matches anything
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSelection {
    /// Emitting contract addresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
    /// Per-position topic filters (topic0..topic3)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<Vec<B256>>,
}

/// Transaction filter: an empty list matches anything
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSelection {
    /// Sender addresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<Address>,
    /// Recipient addresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<Address>,
    /// First four bytes of the call input
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sighash: Vec<FixedBytes<4>>,
    /// Receipt status (1 = success, 0 = failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
    /// Transaction envelope types
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub kind: Vec<u8>,
    /// Addresses of contracts created by the transaction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contract_address: Vec<Address>,
}

/// Trace filter: an empty list matches anything
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSelection {
    /// Caller addresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<Address>,
    /// Callee addresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<Address>,
    /// Created or destroyed addresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
    /// `call`, `delegatecall`, `staticcall`, ...
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub call_type: Vec<String>,
    /// `block` or `uncle`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reward_type: Vec<String>,
    /// `call`, `create`, `suicide`, `reward`
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub kind: Vec<String>,
    /// First four bytes of the call input
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sighash: Vec<FixedBytes<4>>,
}
