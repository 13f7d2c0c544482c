//! # hypersync-stream
//!
//! Streaming client for HyperSync blockchain archive queries.
//!
//! A HyperSync server answers a block-range query with one page of blocks,
//! transactions, logs and traces plus a cursor telling the client where the page
//! stopped. This crate turns a whole range into an ordered stream of those pages:
//!
//! - **Parallel** - the range is cut into sub-ranges fetched with bounded concurrency
//! - **Ordered** - pages are delivered in block order regardless of completion order
//! - **Resilient** - transient transport failures are retried with capped backoff
//! - **Back-pressured** - completion waits until the consumer acknowledged every page
//!
//! ## Quick Start
//!
//! ```no_run
//! use hypersync_stream::{Client, ClientConfig, StreamConfig, presets};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::default())?;
//!
//!     let query = presets::blocks_in_range(20_000_000, 20_000_999);
//!     let mut stream = client.stream(query, StreamConfig::with_batch_size(100)).await?;
//!
//!     while let Some(response) = stream.channel().recv().await {
//!         println!("{} blocks up to {}", response.data.blocks.len(), response.next_block);
//!         stream.ack();
//!     }
//!
//!     let done = stream.done_signal();
//!     tokio::select! {
//!         biased;
//!         Some(e) = stream.err().recv() => return Err(e.into()),
//!         _ = done.wait() => {}
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client for a HyperSync endpoint
pub mod client;
/// Configuration types
pub mod config;
/// Response body decoding
pub mod decode;
/// Error types
pub mod error;
/// Ready-made queries
pub mod presets;
/// Retry logic with capped linear backoff
pub mod retry;
/// Ordered streaming over block ranges
pub mod stream;
/// Query, response and record types
pub mod types;

// Readers and builders generated from schema/hypersync_net_types.capnp by build.rs
#[allow(
    dead_code,
    missing_docs,
    unused_qualifications,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
mod hypersync_net_types_capnp {
    include!(concat!(env!("OUT_DIR"), "/hypersync_net_types_capnp.rs"));
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use client::Client;
pub use config::{ClientConfig, RetryConfig, StreamConfig};
pub use decode::decode_query_response;
pub use error::{DecodeError, Error, Result};
pub use stream::{BlockIterator, DoneSignal, QuerySource, Stream, StreamState};
pub use types::{
    AccessListItem, ArchiveHeight, Block, DataCategory, DataResponse, FieldSelection, JoinMode,
    Log, LogSelection, Query, QueryResponse, RollbackGuard, Trace, TraceSelection, Transaction,
    TransactionSelection, Withdrawal,
};

/// Wait for a termination signal
///
/// Meant as a branch next to a stream's queues, so the consumer can call
/// [`Stream::unsubscribe`] on shutdown.
///
/// Resolves on Ctrl+C everywhere and additionally on SIGTERM on Unix.
///
/// # Example
///
/// ```no_run
/// use hypersync_stream::{Client, ClientConfig, StreamConfig, presets, shutdown_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new(ClientConfig::default())?;
///     let mut stream = client
///         .stream(presets::blocks_in_range(0, 1_000_000), StreamConfig::default())
///         .await?;
///
///     let shutdown = shutdown_signal();
///     tokio::pin!(shutdown);
///     loop {
///         let response = tokio::select! {
///             _ = &mut shutdown => break,
///             response = stream.channel().recv() => response,
///         };
///         let Some(response) = response else { break };
///         println!("next block {}", response.next_block);
///         stream.ack();
///     }
///     stream.unsubscribe().await;
///
///     Ok(())
/// }
/// ```
pub async fn shutdown_signal() {
    tokio::select! {
        _ = terminate() => tracing::info!("Received SIGTERM signal"),
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            Err(e) => {
                tracing::warn!(error = %e, "Could not listen for Ctrl+C, waiting for SIGTERM only");
                terminate().await;
            }
        },
    }
}

/// Resolves on SIGTERM; never resolves where SIGTERM is unavailable
async fn terminate() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                return;
            }
            Err(e) => tracing::warn!(error = %e, "Could not register SIGTERM handler"),
        }
    }
    std::future::pending::<()>().await;
}
