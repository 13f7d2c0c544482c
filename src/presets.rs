//! Ready-made queries for common scans
//!
//! Every preset takes an inclusive `to_block`, matching how block ranges are usually
//! written, and converts it to the exclusive end the server expects. Results carry
//! enough columns to be useful without a custom [`FieldSelection`].

use crate::types::{FieldSelection, LogSelection, Query, TraceSelection, TransactionSelection};

const BLOCK_FIELDS: &[&str] = &["number", "hash", "parent_hash", "timestamp"];

const TRANSACTION_FIELDS: &[&str] = &[
    "block_number",
    "block_hash",
    "transaction_index",
    "hash",
    "from",
    "to",
    "value",
    "input",
    "sighash",
    "contract_address",
    "status",
];

const LOG_FIELDS: &[&str] = &[
    "block_number",
    "block_hash",
    "log_index",
    "transaction_index",
    "transaction_hash",
    "address",
    "data",
    "topic0",
    "topic1",
    "topic2",
    "topic3",
];

const TRACE_FIELDS: &[&str] = &[
    "block_number",
    "transaction_hash",
    "transaction_position",
    "trace_address",
    "type",
    "call_type",
    "from",
    "to",
    "value",
    "input",
    "output",
    "error",
];

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Skeleton query over `[from_block, to_block]`
fn in_range(from_block: u64, to_block: u64) -> Query {
    Query {
        from_block,
        to_block: Some(to_block.saturating_add(1)),
        ..Query::default()
    }
}

/// Every block header in `[from_block, to_block]`
pub fn blocks_in_range(from_block: u64, to_block: u64) -> Query {
    Query {
        include_all_blocks: true,
        field_selection: FieldSelection {
            block: fields(BLOCK_FIELDS),
            ..FieldSelection::default()
        },
        ..in_range(from_block, to_block)
    }
}

/// Transactions in `[from_block, to_block]` matching any of `selections`
///
/// An empty `TransactionSelection` matches every transaction.
pub fn transactions_in_range(
    from_block: u64,
    to_block: u64,
    selections: Vec<TransactionSelection>,
) -> Query {
    Query {
        transactions: selections,
        field_selection: FieldSelection {
            block: fields(&["number", "timestamp"]),
            transaction: fields(TRANSACTION_FIELDS),
            ..FieldSelection::default()
        },
        ..in_range(from_block, to_block)
    }
}

/// Logs in `[from_block, to_block]` matching any of `selections`
pub fn logs_in_range(from_block: u64, to_block: u64, selections: Vec<LogSelection>) -> Query {
    Query {
        logs: selections,
        field_selection: FieldSelection {
            block: fields(&["number", "timestamp"]),
            log: fields(LOG_FIELDS),
            ..FieldSelection::default()
        },
        ..in_range(from_block, to_block)
    }
}

/// Traces in `[from_block, to_block]` matching any of `selections`
pub fn traces_in_range(from_block: u64, to_block: u64, selections: Vec<TraceSelection>) -> Query {
    Query {
        traces: selections,
        field_selection: FieldSelection {
            block: fields(&["number", "timestamp"]),
            trace: fields(TRACE_FIELDS),
            ..FieldSelection::default()
        },
        ..in_range(from_block, to_block)
    }
}
