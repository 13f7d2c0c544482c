use super::{Block, Log, Trace, Transaction};
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// One decoded response page (or several pages of one sub-range, merged)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Highest block the archive has indexed, if the server reported it
    pub archive_height: Option<u64>,
    /// Cursor: the first block not covered by this response
    pub next_block: u64,
    /// Server-side execution time in milliseconds
    pub total_execution_time: u64,
    /// Records, grouped by category
    pub data: DataResponse,
    /// Tip-of-chain metadata for reorg detection
    pub rollback_guard: Option<RollbackGuard>,
}

impl QueryResponse {
    /// True if this response covers its range up to `to_block`
    pub fn is_terminal_for(&self, to_block: u64) -> bool {
        self.next_block == to_block
    }

    /// Append a follow-up page for the same range
    ///
    /// Records are appended in page order, the cursor moves to the page's cursor and
    /// execution times add up. Height and rollback guard follow the newest page that
    /// carries them.
    pub fn absorb(&mut self, page: QueryResponse) {
        self.next_block = page.next_block;
        self.total_execution_time = self
            .total_execution_time
            .saturating_add(page.total_execution_time);
        if page.archive_height.is_some() {
            self.archive_height = page.archive_height;
        }
        if page.rollback_guard.is_some() {
            self.rollback_guard = page.rollback_guard;
        }
        self.data.extend(page.data);
    }
}

/// Records of one response, one vector per category
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    /// Block headers
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Transactions
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Event logs
    #[serde(default)]
    pub logs: Vec<Log>,
    /// Execution traces
    #[serde(default)]
    pub traces: Vec<Trace>,
}

impl DataResponse {
    /// True if every category is empty
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
            && self.transactions.is_empty()
            && self.logs.is_empty()
            && self.traces.is_empty()
    }

    /// Append another response's records after this one's
    pub fn extend(&mut self, other: DataResponse) {
        self.blocks.extend(other.blocks);
        self.transactions.extend(other.transactions);
        self.logs.extend(other.logs);
        self.traces.extend(other.traces);
    }
}

/// Chain-tip metadata the server attaches so callers can detect reorgs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackGuard {
    /// Last block scanned
    pub block_number: u64,
    /// Timestamp of the last block scanned
    pub timestamp: i64,
    /// Hash of the last block scanned
    pub hash: B256,
    /// First block scanned
    pub first_block_number: u64,
    /// Parent hash of the first block scanned
    pub first_parent_hash: B256,
}

/// Body of `GET /height`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveHeight {
    /// Highest block the archive has indexed
    pub height: u64,
}
