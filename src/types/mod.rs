//! Core types for hypersync-stream
//!
//! Queries go out as JSON; responses come back as typed records whose every field is
//! optional, since the server only returns the columns named in the field selection.

mod block;
mod log;
mod query;
mod response;
mod trace;
mod transaction;

pub use block::{Block, Withdrawal};
pub use log::Log;
pub use query::{
    FieldSelection, JoinMode, LogSelection, Query, TraceSelection, TransactionSelection,
};
pub use response::{ArchiveHeight, DataResponse, QueryResponse, RollbackGuard};
pub use trace::Trace;
pub use transaction::{AccessListItem, Transaction};

use serde::{Deserialize, Serialize};

/// One of the four record categories carried by a query response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    /// Block headers
    Blocks,
    /// Transactions and their receipts
    Transactions,
    /// Event logs
    Logs,
    /// Execution traces
    Traces,
}

impl DataCategory {
    /// All categories, in envelope order
    pub const ALL: [DataCategory; 4] = [
        DataCategory::Blocks,
        DataCategory::Transactions,
        DataCategory::Logs,
        DataCategory::Traces,
    ];

    /// Lowercase name as used in the envelope schema
    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::Blocks => "blocks",
            DataCategory::Transactions => "transactions",
            DataCategory::Logs => "logs",
            DataCategory::Traces => "traces",
        }
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
