//! Streaming query engine
//!
//! A [`Stream`] turns one logical block-range query into an ordered sequence of
//! [`QueryResponse`] records:
//!
//! 1. **Priming**: the unsplit query is sent once. Its response is published first and
//!    its cursor (`next_block`) tells the stream where to continue.
//! 2. **Dispatching**: the rest of the range is cut into sub-ranges by a
//!    [`BlockIterator`] and executed by a [`Worker`] with bounded concurrency. Results
//!    are republished in sub-range order regardless of completion order.
//! 3. **Teardown**: after the record that reaches `to_block` (possibly the priming one),
//!    the worker drains, waits for consumer acknowledgments (unless disabled) and fires
//!    the done signal.
//!
//! Failures of a sub-query are delivered on the error queue when the reassembler
//! reaches that position; records after it are never published.

mod iterator;
mod signal;
mod worker;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use iterator::BlockIterator;
pub use signal::{AckGate, DoneSignal};
pub use worker::{OrderedResult, Worker, WorkerOutcome, WorkerParams};

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::types::{Query, QueryResponse};
use async_trait::async_trait;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Capacity of the error queue; at most one error is ever sent
const ERROR_BUFFER: usize = 1;

/// Anything that can answer a single query and report the archive height
///
/// [`Client`](crate::Client) implements this over HTTP. Implementations must honour
/// `cancel` and return [`Error::Cancelled`] when it fires.
#[async_trait]
pub trait QuerySource: Send + Sync {
    /// Execute one query (one page)
    async fn get(&self, query: &Query, cancel: &CancellationToken) -> Result<QueryResponse>;

    /// Highest block the archive can serve
    async fn get_height(&self, cancel: &CancellationToken) -> Result<u64>;
}

/// Lifecycle of a [`Stream`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamState {
    /// Constructed, `start()` not yet called
    Created = 0,
    /// Running the priming fetch
    Priming = 1,
    /// Sub-queries in flight
    Dispatching = 2,
    /// Terminal record published; `done` fires once every record is acknowledged
    Completed = 3,
    /// The priming fetch or a sub-query failed
    Failed = 4,
    /// Unsubscribed or dropped
    Cancelled = 5,
}

impl StreamState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => StreamState::Created,
            1 => StreamState::Priming,
            2 => StreamState::Dispatching,
            3 => StreamState::Completed,
            4 => StreamState::Failed,
            _ => StreamState::Cancelled,
        }
    }

    /// True for `Completed`, `Failed` and `Cancelled`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamState::Completed | StreamState::Failed | StreamState::Cancelled
        )
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: StreamState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn get(&self) -> StreamState {
        StreamState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: StreamState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move to `state` unless already terminal; returns whether it moved
    fn finish(&self, state: StreamState) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (!StreamState::from_u8(current).is_terminal()).then_some(state as u8)
            })
            .is_ok()
    }
}

/// An ordered stream of responses for one block-range query
///
/// # Example
///
/// ```no_run
/// use hypersync_stream::{Client, ClientConfig, StreamConfig, presets};
///
/// # async fn example() -> hypersync_stream::Result<()> {
/// let client = Client::new(ClientConfig::default())?;
/// let query = presets::blocks_in_range(18_000_000, 18_001_000);
/// let mut stream = client.stream(query, StreamConfig::default()).await?;
/// let done = stream.done_signal();
///
/// loop {
///     let (records, errors) = stream.channels();
///     let response = tokio::select! {
///         Some(response) = records.recv() => response,
///         Some(e) = errors.recv() => return Err(e),
///         _ = done.wait() => break,
///     };
///     println!("{} blocks", response.data.blocks.len());
///     stream.ack();
/// }
/// # Ok(())
/// # }
/// ```
pub struct Stream {
    source: Arc<dyn QuerySource>,
    query: Query,
    config: StreamConfig,
    span: tracing::Span,
    cancel: CancellationToken,
    done: DoneSignal,
    acks: Arc<AckGate>,
    state: Arc<StateCell>,
    batch_size: Arc<AtomicU64>,
    output_tx: Option<mpsc::Sender<QueryResponse>>,
    output_rx: mpsc::Receiver<QueryResponse>,
    err_tx: Option<mpsc::Sender<Error>>,
    err_rx: mpsc::Receiver<Error>,
    worker: Option<Arc<Worker>>,
}

impl Stream {
    /// Prepare a stream; no request is sent until [`start`](Self::start)
    pub fn new(source: Arc<dyn QuerySource>, query: Query, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        if query.selects_nothing() {
            tracing::warn!(
                from_block = query.from_block,
                "Query selects nothing; every record will be empty"
            );
        }

        let (output_tx, output_rx) = mpsc::channel(config.concurrency);
        let (err_tx, err_rx) = mpsc::channel(ERROR_BUFFER);

        Ok(Self {
            source,
            query,
            batch_size: Arc::new(AtomicU64::new(config.batch_size)),
            acks: Arc::new(AckGate::new(!config.disable_ack)),
            config,
            span: tracing::Span::none(),
            cancel: CancellationToken::new(),
            done: DoneSignal::new(),
            state: Arc::new(StateCell::new(StreamState::Created)),
            output_tx: Some(output_tx),
            output_rx,
            err_tx: Some(err_tx),
            err_rx,
            worker: None,
        })
    }

    /// Run every task of this stream under `span`
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Prime the stream and start dispatching
    ///
    /// Resolves a missing `to_block` from the archive height, then sends the unsplit
    /// query once. If that response already reaches `to_block` the stream completes
    /// without dispatching; otherwise the remainder is split and handed to a worker.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyStarted`] on a second call, [`Error::InvalidQuery`] for an empty
    /// range, and any failure of the height lookup or the priming fetch. On error the
    /// stream is left in [`StreamState::Failed`].
    pub async fn start(&mut self) -> Result<()> {
        if self.state.get() != StreamState::Created {
            return Err(Error::AlreadyStarted);
        }
        self.state.set(StreamState::Priming);

        let span = self.span.clone();
        match self.prime_and_dispatch().instrument(span).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if matches!(e, Error::Cancelled) {
                    self.state.finish(StreamState::Cancelled);
                } else {
                    self.state.finish(StreamState::Failed);
                }
                Err(e)
            }
        }
    }

    async fn prime_and_dispatch(&mut self) -> Result<()> {
        let from = self.query.from_block;
        let to = match self.query.to_block {
            Some(to) => to,
            None => {
                let height = self.source.get_height(&self.cancel).await?;
                tracing::debug!(height, "Resolved stream end from archive height");
                height
            }
        };
        if to <= from {
            return Err(Error::InvalidQuery(format!(
                "empty block range: from_block {from} >= to_block {to}"
            )));
        }

        let base = self.sub_query_template(from, to);
        let first = self.source.get(&base, &self.cancel).await?;
        check_cursor(from, first.next_block, to)?;

        let cursor = first.next_block;
        let terminal = first.is_terminal_for(to);
        tracing::info!(from, to, cursor, terminal, "Stream primed");

        let output = self
            .output_tx
            .take()
            .ok_or_else(|| Error::Other("output queue already handed off".to_string()))?;
        if output.send(first).await.is_err() {
            return Err(Error::Cancelled);
        }
        self.acks.record_emitted();

        if terminal {
            drop(output);
            self.err_tx = None;
            self.state.finish(StreamState::Completed);
            tracing::info!("Stream completed");
            if self.acks.is_enabled() {
                self.spawn_finisher();
            } else {
                self.done.fire();
            }
            return Ok(());
        }

        self.state.set(StreamState::Dispatching);
        self.dispatch(base, cursor, to, output);
        Ok(())
    }

    /// The query every sub-range is cut from
    fn sub_query_template(&self, from: u64, to: u64) -> Query {
        let mut base = self.query.with_range(from, to);
        let limits = [
            (&mut base.max_num_blocks, self.config.max_num_blocks),
            (&mut base.max_num_transactions, self.config.max_num_transactions),
            (&mut base.max_num_logs, self.config.max_num_logs),
            (&mut base.max_num_traces, self.config.max_num_traces),
        ];
        for (field, limit) in limits {
            if limit.is_some() {
                *field = limit;
            }
        }
        base
    }

    /// Priming already reached the end: fire done once the consumer has acknowledged
    fn spawn_finisher(&self) {
        let acks = Arc::clone(&self.acks);
        let cancel = self.cancel.clone();
        let done = self.done.clone();

        tokio::spawn(
            async move {
                if !acks.wait_until_acked(&cancel).await {
                    tracing::debug!("Acknowledgment wait cancelled");
                }
                done.fire();
            }
            .instrument(self.span.clone()),
        );
    }

    fn dispatch(&mut self, base: Query, cursor: u64, to: u64, output: mpsc::Sender<QueryResponse>) {
        let worker = Worker::new(WorkerParams {
            concurrency: self.config.concurrency,
            end_block: to,
            cancel: self.cancel.clone(),
            done: self.done.clone(),
            acks: Arc::clone(&self.acks),
            span: self.span.clone(),
        });

        // Feeder: walks the iterator, blocking on the bounded descriptor queue
        let (desc_tx, desc_rx) = mpsc::channel::<Range<u64>>(self.config.concurrency);
        let iterator =
            BlockIterator::with_shared_batch_size(cursor, to, Arc::clone(&self.batch_size));
        let cancel = self.cancel.clone();
        tokio::spawn(
            async move {
                for range in iterator {
                    tracing::trace!(start = range.start, end = range.end, "Queueing sub-range");
                    let sent = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => false,
                        sent = desc_tx.send(range) => sent.is_ok(),
                    };
                    if !sent {
                        break;
                    }
                }
            }
            .instrument(self.span.clone()),
        );

        let source = Arc::clone(&self.source);
        let work = move |range: Range<u64>, cancel: CancellationToken| {
            let source = Arc::clone(&source);
            let query = base.with_range(range.start, range.end);
            async move { fetch_range(source.as_ref(), &query, &cancel).await }
        };
        let handle = worker.start(desc_rx, work, output);

        // Supervisor: maps the worker outcome onto state and the error queue
        let err_tx = self.err_tx.take();
        let state = Arc::clone(&self.state);
        let supervised = Arc::clone(&worker);
        tokio::spawn(
            async move {
                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => WorkerOutcome::Failed(Error::Other(format!("reassembler task failed: {e}"))),
                };
                match outcome {
                    WorkerOutcome::Completed { emitted } => {
                        state.finish(StreamState::Completed);
                        supervised.stop().await;
                        tracing::info!(emitted, "Stream completed");
                    }
                    WorkerOutcome::Failed(e) => {
                        state.finish(StreamState::Failed);
                        if let Some(err_tx) = &err_tx {
                            err_tx.send(e).await.ok();
                        }
                        supervised.abort().await;
                    }
                    WorkerOutcome::Cancelled => {
                        state.finish(StreamState::Cancelled);
                        supervised.abort().await;
                        tracing::info!("Stream cancelled");
                    }
                }
            }
            .instrument(self.span.clone()),
        );

        self.worker = Some(worker);
    }

    /// Ordered record queue
    pub fn channel(&mut self) -> &mut mpsc::Receiver<QueryResponse> {
        &mut self.output_rx
    }

    /// Error queue; receives at most one error, after which the stream is `Failed`
    pub fn err(&mut self) -> &mut mpsc::Receiver<Error> {
        &mut self.err_rx
    }

    /// Both queues at once, for use in `tokio::select!`
    pub fn channels(
        &mut self,
    ) -> (
        &mut mpsc::Receiver<QueryResponse>,
        &mut mpsc::Receiver<Error>,
    ) {
        (&mut self.output_rx, &mut self.err_rx)
    }

    /// Cloneable handle on the completion signal
    pub fn done_signal(&self) -> DoneSignal {
        self.done.clone()
    }

    /// Wait until the stream has finished (completed, failed or unsubscribed)
    pub async fn done(&self) {
        self.done.wait().await;
    }

    /// Acknowledge one received record
    pub fn ack(&self) {
        self.acks.ack();
    }

    /// Current lifecycle state
    pub fn state(&self) -> StreamState {
        self.state.get()
    }

    /// Change the sub-range size for sub-ranges not yet queued
    pub fn set_batch_size(&self, batch_size: u64) {
        self.batch_size.store(batch_size, Ordering::Relaxed);
    }

    /// Shared sub-range size cell, for resizing from another task
    pub fn batch_size_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.batch_size)
    }

    /// Cancel everything, fire done and close both queues
    ///
    /// Safe to call repeatedly and at any state.
    pub async fn unsubscribe(&mut self) {
        self.cancel.cancel();
        self.state.finish(StreamState::Cancelled);
        if let Some(worker) = &self.worker {
            worker.stop().await;
        }
        if self.done.fire() {
            tracing::info!("Stream unsubscribed");
        }
        self.output_tx = None;
        self.err_tx = None;
        self.output_rx.close();
        self.err_rx.close();
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Fetch `query`'s whole range, following the server cursor across pages
///
/// Pages are merged into a single response covering `[from_block, to_block)`.
pub async fn fetch_range(
    source: &dyn QuerySource,
    query: &Query,
    cancel: &CancellationToken,
) -> Result<QueryResponse> {
    let from = query.from_block;
    let to = query
        .to_block
        .ok_or_else(|| Error::InvalidQuery("sub-query without to_block".to_string()))?;

    let mut merged = source.get(query, cancel).await?;
    check_cursor(from, merged.next_block, to)?;

    while merged.next_block < to {
        let cursor = merged.next_block;
        tracing::trace!(cursor, to, "Following cursor within sub-range");
        let page = source.get(&query.with_range(cursor, to), cancel).await?;
        check_cursor(cursor, page.next_block, to)?;
        merged.absorb(page);
    }
    Ok(merged)
}

/// A response to `[from, to)` must move the cursor forward without passing `to`
fn check_cursor(from: u64, next_block: u64, to: u64) -> Result<()> {
    if next_block <= from {
        return Err(Error::Protocol(format!(
            "cursor did not advance: requested from {from}, server returned next_block {next_block}"
        )));
    }
    if next_block > to {
        return Err(Error::Protocol(format!(
            "cursor overshot range end {to}: server returned next_block {next_block}"
        )));
    }
    Ok(())
}
