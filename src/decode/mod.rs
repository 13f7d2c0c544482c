//! Response body decoder
//!
//! A query response is a packed Cap'n Proto `QueryResponse` frame (see
//! `schema/hypersync_net_types.capnp`) holding scalar metadata, an optional rollback
//! guard and one blob per record category. Each blob is an 8-byte reserved prefix
//! followed by an Arrow IPC stream, which is read batch by batch and mapped row by row
//! onto the typed records in [`crate::types`]. Nested list columns arrive packed into
//! single binary cells.

mod columns;
mod payload;
mod rows;


use crate::error::DecodeError;
use crate::hypersync_net_types_capnp::{query_response, query_response_data, rollback_guard};
use crate::types::{DataCategory, DataResponse, QueryResponse, RollbackGuard};
use arrow::ipc::reader::StreamReader;
use capnp::message::ReaderOptions;
use rows::{FromRow, decode_batch};

/// Bytes the server prepends to every category blob
const RESERVED_PREFIX: usize = 8;

/// Shortest blob that can hold the prefix and an IPC stream header
const MIN_PAYLOAD: usize = 16;

/// Decode one complete response body
pub fn decode_query_response(body: &[u8]) -> Result<QueryResponse, DecodeError> {
    let mut options = ReaderOptions::new();
    // Large responses exceed the default traversal budget
    options.traversal_limit_in_words(None);
    let message = capnp::serialize_packed::read_message(body, options)?;
    let root = message.get_root::<query_response::Reader<'_>>()?;

    let archive_height = match root.get_archive_height() {
        -1 => None,
        h if h < 0 => return Err(DecodeError::InvalidArchiveHeight(h)),
        h => Some(h as u64),
    };

    let rollback_guard = if root.has_rollback_guard() {
        Some(read_rollback_guard(root.get_rollback_guard()?)?)
    } else {
        None
    };

    let mut data = DataResponse::default();
    if root.has_data() {
        let blobs = root.get_data()?;
        for category in DataCategory::ALL {
            if let Some(blob) = category_blob(blobs, category)? {
                read_category(category, blob, &mut data)?;
            }
        }
    }

    Ok(QueryResponse {
        archive_height,
        next_block: root.get_next_block(),
        total_execution_time: root.get_total_execution_time(),
        data,
        rollback_guard,
    })
}

/// The blob of `category`; `None` when the server left the pointer unset
fn category_blob<'a>(
    blobs: query_response_data::Reader<'a>,
    category: DataCategory,
) -> capnp::Result<Option<&'a [u8]>> {
    let (present, blob) = match category {
        DataCategory::Blocks => (blobs.has_blocks(), blobs.get_blocks()),
        DataCategory::Transactions => (blobs.has_transactions(), blobs.get_transactions()),
        DataCategory::Logs => (blobs.has_logs(), blobs.get_logs()),
        DataCategory::Traces => (blobs.has_traces(), blobs.get_traces()),
    };
    if present {
        blob.map(Some)
    } else {
        Ok(None)
    }
}

fn read_rollback_guard(guard: rollback_guard::Reader<'_>) -> Result<RollbackGuard, DecodeError> {
    if !guard.has_hash() {
        return Err(DecodeError::MissingField("hash"));
    }
    if !guard.has_first_parent_hash() {
        return Err(DecodeError::MissingField("first_parent_hash"));
    }
    let hash = guard.get_hash()?;
    let first_parent_hash = guard.get_first_parent_hash()?;

    Ok(RollbackGuard {
        block_number: guard.get_block_number(),
        timestamp: guard.get_timestamp(),
        hash: columns::fixed_from_slice("hash", hash)
            .map_err(|_| DecodeError::MissingField("hash"))?,
        first_block_number: guard.get_first_block_number(),
        first_parent_hash: columns::fixed_from_slice("first_parent_hash", first_parent_hash)
            .map_err(|_| DecodeError::MissingField("first_parent_hash"))?,
    })
}

fn read_category(
    category: DataCategory,
    blob: &[u8],
    data: &mut DataResponse,
) -> Result<(), DecodeError> {
    if blob.len() < MIN_PAYLOAD {
        return Err(DecodeError::TruncatedPayload {
            category,
            len: blob.len(),
        });
    }
    let payload = &blob[RESERVED_PREFIX..];

    match category {
        DataCategory::Blocks => read_batches(payload, &mut data.blocks),
        DataCategory::Transactions => read_batches(payload, &mut data.transactions),
        DataCategory::Logs => read_batches(payload, &mut data.logs),
        DataCategory::Traces => read_batches(payload, &mut data.traces),
    }
}

fn read_batches<T: FromRow>(payload: &[u8], out: &mut Vec<T>) -> Result<(), DecodeError> {
    let reader = StreamReader::try_new(payload, None)?;
    for batch in reader {
        decode_batch(&batch?, out)?;
    }
    Ok(())
}
