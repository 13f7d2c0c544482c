//! In-memory archive implementing `QuerySource`
//!
//! Every block carries exactly one log tagged with its block number, so a consumer can
//! check ordering and coverage by collecting block numbers.

use async_trait::async_trait;
use hypersync_stream::{
    DataResponse, Error, Log, Query, QueryResponse, QuerySource, Result, Stream,
};
use std::ops::Range;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Scripted archive with a page limit, optional latency and an optional poisoned block
pub struct ScriptedArchive {
    height: u64,
    page: u64,
    latency: Option<fn(u64) -> Duration>,
    poisoned: Option<u64>,
    calls: Mutex<Vec<Range<u64>>>,
}

impl ScriptedArchive {
    /// Archive of `height` blocks answering at most `page` blocks per request
    pub fn new(height: u64, page: u64) -> Self {
        Self {
            height,
            page,
            latency: None,
            poisoned: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delay each response by `latency(from_block)`
    pub fn with_latency(mut self, latency: fn(u64) -> Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail any request whose first block is `block`
    pub fn poisoned_at(mut self, block: u64) -> Self {
        self.poisoned = Some(block);
        self
    }

    /// Ranges requested so far
    pub fn calls(&self) -> Vec<Range<u64>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl QuerySource for ScriptedArchive {
    async fn get(&self, query: &Query, cancel: &CancellationToken) -> Result<QueryResponse> {
        let from = query.from_block;
        let to = query.to_block.unwrap_or(self.height).min(self.height);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(from..to);
        }

        if let Some(latency) = self.latency {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(latency(from)) => {}
            }
        }
        if self.poisoned == Some(from) {
            return Err(Error::Http {
                status: 400,
                body: format!("block {from} is not available"),
            });
        }

        let next_block = to.min(from.saturating_add(self.page));
        Ok(QueryResponse {
            archive_height: Some(self.height),
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
        })
    }

    async fn get_height(&self, _cancel: &CancellationToken) -> Result<u64> {
        Ok(self.height)
    }
}

/// Consume `stream` to the end, acknowledging each record
///
/// Returns the block numbers of every log in delivery order and the error, if the
/// stream failed.
pub async fn consume(stream: &mut Stream) -> (Vec<u64>, Option<Error>) {
    let mut blocks = Vec::new();
    while let Some(response) = stream.channel().recv().await {
        blocks.extend(response.data.logs.iter().filter_map(|log| log.block_number));
        stream.ack();
    }

    let done = stream.done_signal();
    let error = tokio::select! {
        biased;
        Some(e) = stream.err().recv() => Some(e),
        _ = done.wait() => None,
    };
    (blocks, error)
}
