//! Shared test helpers: server-shaped frames and scripted query sources.

use crate::error::{Error, Result};
use crate::hypersync_net_types_capnp::query_response;
use crate::stream::QuerySource;
use crate::types::{DataCategory, DataResponse, Log, Query, QueryResponse};
use arrow::array::{ArrayRef, FixedSizeBinaryArray, UInt64Array};
use arrow::datatypes::{Field, Schema};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Rollback guard fields as written on the wire
pub(crate) struct GuardFrame {
    pub block_number: u64,
    pub timestamp: i64,
    pub hash: Vec<u8>,
    pub first_block_number: u64,
    pub first_parent_hash: Vec<u8>,
}

/// Everything needed to produce one response body
pub(crate) struct Frame {
    pub archive_height: i64,
    pub next_block: u64,
    pub total_execution_time: u64,
    pub categories: Vec<(DataCategory, Vec<u8>)>,
    pub guard: Option<GuardFrame>,
}

impl Frame {
    pub(crate) fn new(next_block: u64) -> Self {
        Self {
            archive_height: -1,
            next_block,
            total_execution_time: 0,
            categories: Vec::new(),
            guard: None,
        }
    }

    pub(crate) fn with(mut self, category: DataCategory, blob: Vec<u8>) -> Self {
        self.categories.push((category, blob));
        self
    }
}

/// Packed Cap'n Proto bytes for `frame`
pub(crate) fn encode_frame(frame: &Frame) -> Vec<u8> {
    let mut message = capnp::message::Builder::new_default();
    {
        let mut root = message.init_root::<query_response::Builder<'_>>();
        root.set_archive_height(frame.archive_height);
        root.set_next_block(frame.next_block);
        root.set_total_execution_time(frame.total_execution_time);

        if !frame.categories.is_empty() {
            let mut data = root.reborrow().init_data();
            for (category, blob) in &frame.categories {
                match category {
                    DataCategory::Blocks => data.set_blocks(blob),
                    DataCategory::Transactions => data.set_transactions(blob),
                    DataCategory::Logs => data.set_logs(blob),
                    DataCategory::Traces => data.set_traces(blob),
                }
            }
        }

        if let Some(guard) = &frame.guard {
            let mut g = root.init_rollback_guard();
            g.set_block_number(guard.block_number);
            g.set_timestamp(guard.timestamp);
            g.set_first_block_number(guard.first_block_number);
            if !guard.hash.is_empty() {
                g.set_hash(&guard.hash);
            }
            if !guard.first_parent_hash.is_empty() {
                g.set_first_parent_hash(&guard.first_parent_hash);
            }
        }
    }

    let mut out = Vec::new();
    capnp::serialize_packed::write_message(&mut out, &message).unwrap();
    out
}

/// Category blob: the 8 reserved bytes followed by an Arrow IPC stream of `batches`
pub(crate) fn ipc_blob(batches: &[RecordBatch]) -> Vec<u8> {
    let mut out = vec![0u8; 8];
    let schema = batches[0].schema();
    {
        let mut writer = StreamWriter::try_new(&mut out, &schema).unwrap();
        for batch in batches {
            writer.write(batch).unwrap();
        }
        writer.finish().unwrap();
    }
    out
}

/// Single-column-per-entry batch
pub(crate) fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, array)| array).collect();
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
}

/// Block batch with `number` and `hash` columns
pub(crate) fn block_batch(numbers: &[u64], hashes: &[[u8; 32]]) -> RecordBatch {
    let hashes = FixedSizeBinaryArray::try_from_iter(hashes.iter()).unwrap();
    batch(vec![
        ("number", Arc::new(UInt64Array::from(numbers.to_vec())) as ArrayRef),
        ("hash", Arc::new(hashes) as ArrayRef),
    ])
}

/// Response covering `[from, next_block)` with one log per block, each tagged with its
/// block number
pub(crate) fn logs_response(from: u64, next_block: u64) -> QueryResponse {
    QueryResponse {
        archive_height: Some(next_block),
        next_block,
        total_execution_time: 1,
        data: DataResponse {
            logs: (from..next_block)
                .map(|block| Log {
                    block_number: Some(block),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        },
        rollback_guard: None,
    }
}

type Handler = dyn Fn(Query) -> BoxFuture<'static, Result<QueryResponse>> + Send + Sync;

/// A [`QuerySource`] answering from a closure and recording every requested range
pub(crate) struct ScriptedSource {
    height: u64,
    handler: Box<Handler>,
    calls: Mutex<Vec<Range<u64>>>,
}

impl ScriptedSource {
    pub(crate) fn new<F>(height: u64, handler: F) -> Arc<Self>
    where
        F: Fn(Query) -> BoxFuture<'static, Result<QueryResponse>> + Send + Sync + 'static,
    {
        Arc::new(Self {
            height,
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Answers every query in full with [`logs_response`]
    pub(crate) fn complete(height: u64) -> Arc<Self> {
        Self::new(height, |query| {
            Box::pin(async move {
                let to = query.to_block.unwrap_or(query.from_block);
                Ok(logs_response(query.from_block, to))
            })
        })
    }

    /// Ranges requested so far, in request order
    pub(crate) fn calls(&self) -> Vec<Range<u64>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuerySource for ScriptedSource {
    async fn get(&self, query: &Query, cancel: &CancellationToken) -> Result<QueryResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(query.from_block..query.to_block.unwrap_or(u64::MAX));
        let fut = (self.handler)(query.clone());
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }

    async fn get_height(&self, _cancel: &CancellationToken) -> Result<u64> {
        Ok(self.height)
    }
}
