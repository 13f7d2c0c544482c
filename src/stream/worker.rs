//! Bounded concurrent dispatcher with in-order reassembly

use super::signal::{AckGate, DoneSignal};
use crate::error::{Error, Result};
use crate::types::QueryResponse;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// Descriptors a task may run ahead of the next record to publish
pub(super) const RESULT_BUFFER_PER_TASK: usize = 10;

/// Parameters for constructing a [`Worker`]
pub struct WorkerParams {
    /// Number of descriptors processed at once
    pub concurrency: usize,
    /// Exclusive end of the whole stream; a response reaching it is terminal
    pub end_block: u64,
    /// Shared cancellation token
    pub cancel: CancellationToken,
    /// Fired once the worker has shut down
    pub done: DoneSignal,
    /// Emitted/acknowledged counters shared with the stream
    pub acks: Arc<AckGate>,
    /// Span all spawned tasks run under
    pub span: tracing::Span,
}

/// A work result tagged with the position its descriptor was pulled at
#[derive(Debug)]
pub struct OrderedResult {
    /// Dense pull-order index, starting at 0
    pub index: u64,
    /// Decoded response or the failure of this descriptor
    pub outcome: Result<QueryResponse>,
}

/// How the reassembler finished
#[derive(Debug)]
pub enum WorkerOutcome {
    /// The terminal record was published
    Completed {
        /// Records published by the worker
        emitted: u64,
    },
    /// The next record in order failed; nothing after it was published
    Failed(Error),
    /// Cancelled, or the consumer went away
    Cancelled,
}

/// Runs up to `concurrency` descriptors at a time and republishes their results in
/// the order the descriptors were pulled
pub struct Worker {
    concurrency: usize,
    end_block: u64,
    cancel: CancellationToken,
    intake: CancellationToken,
    tracker: TaskTracker,
    done: DoneSignal,
    acks: Arc<AckGate>,
    span: tracing::Span,
}

impl Worker {
    /// Create a worker; nothing runs until [`start`](Self::start)
    pub fn new(params: WorkerParams) -> Arc<Self> {
        let WorkerParams {
            concurrency,
            end_block,
            cancel,
            done,
            acks,
            span,
        } = params;
        let intake = cancel.child_token();
        Arc::new(Self {
            concurrency: concurrency.max(1),
            end_block,
            cancel,
            intake,
            tracker: TaskTracker::new(),
            done,
            acks,
            span,
        })
    }

    /// Spawn the worker tasks and the reassembler
    ///
    /// `work` runs once per descriptor. The returned handle resolves when the
    /// reassembler finishes. The record queue is closed by then, but `done` only fires
    /// once the caller runs [`stop`](Self::stop) or [`abort`](Self::abort).
    pub fn start<D, F, Fut>(
        self: &Arc<Self>,
        descriptors: mpsc::Receiver<D>,
        work: F,
        output: mpsc::Sender<QueryResponse>,
    ) -> JoinHandle<WorkerOutcome>
    where
        D: Send + 'static,
        F: Fn(D, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<QueryResponse>> + Send + 'static,
    {
        let window_size = self.concurrency * RESULT_BUFFER_PER_TASK;
        let (result_tx, result_rx) = mpsc::channel::<OrderedResult>(window_size);
        // One permit per descriptor pulled but not yet published, so the reorder
        // buffer stays bounded while an early sub-query lags
        let window = Arc::new(Semaphore::new(window_size));
        // Descriptor receiver and the next pull index, locked together so indices
        // follow pull order
        let intake_queue = Arc::new(Mutex::new((descriptors, 0u64)));
        let work = Arc::new(work);

        for task_id in 0..self.concurrency {
            let intake_queue = Arc::clone(&intake_queue);
            let window = Arc::clone(&window);
            let work = Arc::clone(&work);
            let result_tx = result_tx.clone();
            let intake = self.intake.clone();
            let cancel = self.cancel.clone();

            self.tracker.spawn(
                async move {
                    loop {
                        let permit = tokio::select! {
                            biased;
                            _ = intake.cancelled() => break,
                            permit = window.acquire() => match permit {
                                Ok(permit) => permit,
                                Err(_) => break,
                            },
                        };
                        let (index, descriptor) = {
                            let mut queue = tokio::select! {
                                biased;
                                _ = intake.cancelled() => break,
                                queue = intake_queue.lock() => queue,
                            };
                            let next = tokio::select! {
                                biased;
                                _ = intake.cancelled() => break,
                                next = queue.0.recv() => next,
                            };
                            let Some(descriptor) = next else { break };
                            let index = queue.1;
                            queue.1 += 1;
                            (index, descriptor)
                        };
                        // Returned by the reassembler once this index is published
                        permit.forget();

                        let outcome = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(Error::Cancelled),
                            outcome = (*work)(descriptor, cancel.clone()) => outcome,
                        };
                        if let Err(e) = &outcome {
                            if !matches!(e, Error::Cancelled) {
                                tracing::warn!(index, task_id, error = %e, "Sub-query failed");
                            }
                        }

                        if result_tx.send(OrderedResult { index, outcome }).await.is_err() {
                            // Reassembler is gone
                            break;
                        }
                    }
                }
                .instrument(self.span.clone()),
            );
        }
        drop(result_tx);

        let worker = Arc::clone(self);
        tokio::spawn(
            async move { worker.reassemble(result_rx, output, window).await }
                .instrument(self.span.clone()),
        )
    }

    async fn reassemble(
        &self,
        mut results: mpsc::Receiver<OrderedResult>,
        output: mpsc::Sender<QueryResponse>,
        window: Arc<Semaphore>,
    ) -> WorkerOutcome {
        let mut pending: BTreeMap<u64, Result<QueryResponse>> = BTreeMap::new();
        let mut next_index: u64 = 0;
        let mut emitted: u64 = 0;

        loop {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.stop_intake();
                    return WorkerOutcome::Cancelled;
                }
                received = results.recv() => received,
            };

            let Some(result) = received else {
                self.stop_intake();
                if self.cancel.is_cancelled() {
                    return WorkerOutcome::Cancelled;
                }
                return WorkerOutcome::Failed(Error::Protocol(format!(
                    "sub-queries ran out after {next_index} results without reaching block {}",
                    self.end_block
                )));
            };
            pending.insert(result.index, result.outcome);

            while let Some(outcome) = pending.remove(&next_index) {
                match outcome {
                    Err(e) => {
                        if matches!(e, Error::Cancelled) {
                            self.stop_intake();
                            return WorkerOutcome::Cancelled;
                        }
                        tracing::error!(index = next_index, error = %e, "Stream failed at sub-query");
                        self.stop_intake();
                        return WorkerOutcome::Failed(e);
                    }
                    Ok(response) => {
                        let terminal = response.is_terminal_for(self.end_block);
                        let next_block = response.next_block;

                        let sent = tokio::select! {
                            biased;
                            _ = self.cancel.cancelled() => false,
                            sent = output.send(response) => sent.is_ok(),
                        };
                        if !sent {
                            self.stop_intake();
                            return WorkerOutcome::Cancelled;
                        }
                        self.acks.record_emitted();
                        window.add_permits(1);
                        emitted += 1;
                        tracing::debug!(index = next_index, next_block, "Published record");

                        if terminal {
                            // Closing both queues unblocks any worker still sending
                            drop(results);
                            drop(output);
                            self.stop_intake();
                            return WorkerOutcome::Completed { emitted };
                        }
                        next_index += 1;
                    }
                }
            }
        }
    }

    /// Stop pulling new descriptors; in-flight work continues
    pub fn stop_intake(&self) {
        self.intake.cancel();
    }

    /// Shut down and fire `done`
    ///
    /// Closes intake, waits for every worker task to exit, then (with gating) waits
    /// until the consumer has acknowledged every emitted record. The acknowledgment
    /// wait gives up on cancellation. Safe to call more than once.
    pub async fn stop(&self) {
        self.stop_intake();
        self.tracker.close();
        self.tracker.wait().await;

        if !self.acks.wait_until_acked(&self.cancel).await {
            tracing::debug!(
                emitted = self.acks.emitted(),
                acked = self.acks.acked(),
                "Acknowledgment wait cancelled"
            );
        }

        if self.done.fire() {
            tracing::debug!("Worker stopped");
        }
    }

    /// Cancel in-flight work, then stop
    pub async fn abort(&self) {
        self.cancel.cancel();
        self.stop().await;
    }
}
