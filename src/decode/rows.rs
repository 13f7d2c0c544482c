//! Row-to-record mapping, one impl per category
//!
//! Each column is dispatched on its name. A column this client does not know is an
//! error rather than silently dropped, so schema drift on the server is caught. The
//! schema is checked once per batch, so an empty batch with unknown columns fails too.

use super::columns::Cell;
use super::payload;
use crate::error::DecodeError;
use crate::types::{Block, DataCategory, Log, Trace, Transaction};
use arrow::record_batch::RecordBatch;

/// A record type that can be assembled column by column
pub(crate) trait FromRow: Default {
    const CATEGORY: DataCategory;

    /// Every column name `set` accepts
    const COLUMNS: &'static [&'static str];

    /// Store `cell` in the matching field; `Ok(false)` if the column is unknown
    fn set(&mut self, cell: &Cell<'_>) -> Result<bool, DecodeError>;
}

/// Decode every row of `batch` and append the records to `out`
pub(crate) fn decode_batch<T: FromRow>(
    batch: &RecordBatch,
    out: &mut Vec<T>,
) -> Result<(), DecodeError> {
    let schema = batch.schema();
    if schema.fields().len() != batch.num_columns() {
        return Err(DecodeError::ColumnCountMismatch {
            schema: schema.fields().len(),
            batch: batch.num_columns(),
        });
    }

    if let Some(field) = schema
        .fields()
        .iter()
        .find(|field| !T::COLUMNS.contains(&field.name().as_str()))
    {
        return Err(DecodeError::UnknownColumn {
            category: T::CATEGORY,
            column: field.name().clone(),
        });
    }

    out.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        let mut record = T::default();
        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            let cell = Cell::new(field.name(), column.as_ref(), row);
            if !record.set(&cell)? {
                return Err(DecodeError::UnknownColumn {
                    category: T::CATEGORY,
                    column: field.name().clone(),
                });
            }
        }
        out.push(record);
    }
    Ok(())
}

impl FromRow for Block {
    const CATEGORY: DataCategory = DataCategory::Blocks;

    const COLUMNS: &'static [&'static str] = &[
        "number", "hash", "parent_hash", "nonce", "sha3_uncles", "logs_bloom",
        "transactions_root", "state_root", "receipts_root", "miner", "difficulty",
        "total_difficulty", "extra_data", "size", "gas_limit", "gas_used", "timestamp",
        "uncles", "base_fee_per_gas", "blob_gas_used", "excess_blob_gas",
        "parent_beacon_block_root", "withdrawals_root", "withdrawals", "l1_block_number",
        "send_count", "send_root", "mix_hash",
    ];

    fn set(&mut self, cell: &Cell<'_>) -> Result<bool, DecodeError> {
        match cell.column() {
            "number" => self.number = cell.u64()?,
            "hash" => self.hash = cell.hash()?,
            "parent_hash" => self.parent_hash = cell.hash()?,
            "nonce" => self.nonce = cell.fixed::<8>()?,
            "sha3_uncles" => self.sha3_uncles = cell.hash()?,
            "logs_bloom" => self.logs_bloom = cell.fixed::<256>()?.map(Into::into),
            "transactions_root" => self.transactions_root = cell.hash()?,
            "state_root" => self.state_root = cell.hash()?,
            "receipts_root" => self.receipts_root = cell.hash()?,
            "miner" => self.miner = cell.address()?,
            "difficulty" => self.difficulty = cell.quantity()?,
            "total_difficulty" => self.total_difficulty = cell.quantity()?,
            "extra_data" => self.extra_data = cell.bytes()?,
            "size" => self.size = cell.quantity()?,
            "gas_limit" => self.gas_limit = cell.quantity()?,
            "gas_used" => self.gas_used = cell.quantity()?,
            "timestamp" => self.timestamp = cell.quantity()?,
            "uncles" => self.uncles = cell.hash_list()?,
            "base_fee_per_gas" => self.base_fee_per_gas = cell.quantity()?,
            "blob_gas_used" => self.blob_gas_used = cell.quantity()?,
            "excess_blob_gas" => self.excess_blob_gas = cell.quantity()?,
            "parent_beacon_block_root" => self.parent_beacon_block_root = cell.hash()?,
            "withdrawals_root" => self.withdrawals_root = cell.hash()?,
            "withdrawals" => self.withdrawals = cell.payload(payload::withdrawals)?,
            "l1_block_number" => self.l1_block_number = cell.u64()?,
            "send_count" => self.send_count = cell.quantity()?,
            "send_root" => self.send_root = cell.hash()?,
            "mix_hash" => self.mix_hash = cell.hash()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl FromRow for Transaction {
    const CATEGORY: DataCategory = DataCategory::Transactions;

    const COLUMNS: &'static [&'static str] = &[
        "block_hash", "block_number", "from", "gas", "gas_price", "sighash", "hash",
        "input", "nonce", "to", "transaction_index", "value", "v", "r", "s", "y_parity",
        "max_priority_fee_per_gas", "max_fee_per_gas", "chain_id", "access_list",
        "max_fee_per_blob_gas", "blob_versioned_hashes", "cumulative_gas_used",
        "effective_gas_price", "gas_used", "contract_address", "logs_bloom", "type", "root",
        "status", "l1_fee", "l1_gas_price", "l1_gas_used", "l1_fee_scalar",
        "gas_used_for_l1",
    ];

    fn set(&mut self, cell: &Cell<'_>) -> Result<bool, DecodeError> {
        match cell.column() {
            "block_hash" => self.block_hash = cell.hash()?,
            "block_number" => self.block_number = cell.u64()?,
            "from" => self.from = cell.address()?,
            "gas" => self.gas = cell.quantity()?,
            "gas_price" => self.gas_price = cell.quantity()?,
            "sighash" => self.sighash = cell.fixed::<4>()?,
            "hash" => self.hash = cell.hash()?,
            "input" => self.input = cell.bytes()?,
            "nonce" => self.nonce = cell.quantity()?,
            "to" => self.to = cell.address()?,
            "transaction_index" => self.transaction_index = cell.u64()?,
            "value" => self.value = cell.quantity()?,
            "v" => self.v = cell.quantity()?,
            "r" => self.r = cell.quantity()?,
            "s" => self.s = cell.quantity()?,
            "y_parity" => self.y_parity = cell.quantity()?,
            "max_priority_fee_per_gas" => self.max_priority_fee_per_gas = cell.quantity()?,
            "max_fee_per_gas" => self.max_fee_per_gas = cell.quantity()?,
            "chain_id" => self.chain_id = cell.quantity()?,
            "access_list" => self.access_list = cell.payload(payload::access_list)?,
            "max_fee_per_blob_gas" => self.max_fee_per_blob_gas = cell.quantity()?,
            "blob_versioned_hashes" => self.blob_versioned_hashes = cell.hash_list()?,
            "cumulative_gas_used" => self.cumulative_gas_used = cell.quantity()?,
            "effective_gas_price" => self.effective_gas_price = cell.quantity()?,
            "gas_used" => self.gas_used = cell.quantity()?,
            "contract_address" => self.contract_address = cell.address()?,
            "logs_bloom" => self.logs_bloom = cell.fixed::<256>()?.map(Into::into),
            "type" => self.kind = cell.u8()?,
            "root" => self.root = cell.hash()?,
            "status" => self.status = cell.u8()?,
            "l1_fee" => self.l1_fee = cell.quantity()?,
            "l1_gas_price" => self.l1_gas_price = cell.quantity()?,
            "l1_gas_used" => self.l1_gas_used = cell.quantity()?,
            "l1_fee_scalar" => self.l1_fee_scalar = cell.f64()?,
            "gas_used_for_l1" => self.gas_used_for_l1 = cell.quantity()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl FromRow for Log {
    const CATEGORY: DataCategory = DataCategory::Logs;

    const COLUMNS: &'static [&'static str] = &[
        "removed", "log_index", "transaction_index", "transaction_hash", "block_hash",
        "block_number", "address", "data", "topic0", "topic1", "topic2", "topic3",
    ];

    fn set(&mut self, cell: &Cell<'_>) -> Result<bool, DecodeError> {
        match cell.column() {
            "removed" => self.removed = cell.bool()?,
            "log_index" => self.log_index = cell.u64()?,
            "transaction_index" => self.transaction_index = cell.u64()?,
            "transaction_hash" => self.transaction_hash = cell.hash()?,
            "block_hash" => self.block_hash = cell.hash()?,
            "block_number" => self.block_number = cell.u64()?,
            "address" => self.address = cell.address()?,
            "data" => self.data = cell.bytes()?,
            "topic0" => self.topic0 = cell.hash()?,
            "topic1" => self.topic1 = cell.hash()?,
            "topic2" => self.topic2 = cell.hash()?,
            "topic3" => self.topic3 = cell.hash()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl FromRow for Trace {
    const CATEGORY: DataCategory = DataCategory::Traces;

    const COLUMNS: &'static [&'static str] = &[
        "from", "to", "call_type", "gas", "input", "init", "value", "author", "reward_type",
        "block_hash", "block_number", "address", "code", "gas_used", "output", "subtraces",
        "trace_address", "transaction_hash", "transaction_position", "type", "error",
        "sighash",
    ];

    fn set(&mut self, cell: &Cell<'_>) -> Result<bool, DecodeError> {
        match cell.column() {
            "from" => self.from = cell.address()?,
            "to" => self.to = cell.address()?,
            "call_type" => self.call_type = cell.string()?,
            "gas" => self.gas = cell.quantity()?,
            "input" => self.input = cell.bytes()?,
            "init" => self.init = cell.bytes()?,
            "value" => self.value = cell.quantity()?,
            "author" => self.author = cell.address()?,
            "reward_type" => self.reward_type = cell.string()?,
            "block_hash" => self.block_hash = cell.hash()?,
            "block_number" => self.block_number = cell.u64()?,
            "address" => self.address = cell.address()?,
            "code" => self.code = cell.bytes()?,
            "gas_used" => self.gas_used = cell.quantity()?,
            "output" => self.output = cell.bytes()?,
            "subtraces" => self.subtraces = cell.u64()?,
            "trace_address" => self.trace_address = cell.payload(payload::trace_address)?,
            "transaction_hash" => self.transaction_hash = cell.hash()?,
            "transaction_position" => self.transaction_position = cell.u64()?,
            "type" => self.kind = cell.string()?,
            "error" => self.error = cell.string()?,
            "sighash" => self.sighash = cell.fixed::<4>()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
