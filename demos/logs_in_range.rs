//! Stream ERC-20 `Transfer` logs over a block range
//!
//! ```bash
//! HYPERSYNC_BEARER_TOKEN=... RUST_LOG=info,hypersync_stream=debug \
//!     cargo run --example logs_in_range -- 20000000 20001000
//! ```

use alloy_primitives::b256;
use hypersync_stream::{
    Client, ClientConfig, LogSelection, StreamConfig, presets, shutdown_signal,
};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let from: u64 = args.next().map(|a| a.parse()).transpose()?.unwrap_or(20_000_000);
    let to: u64 = args.next().map(|a| a.parse()).transpose()?.unwrap_or(20_001_000);

    let config = ClientConfig {
        bearer_token: std::env::var("HYPERSYNC_BEARER_TOKEN").ok(),
        ..ClientConfig::default()
    };
    let client = Client::new(config)?.with_span(tracing::info_span!("hypersync", from, to));

    let transfers = LogSelection {
        topics: vec![vec![b256!(
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        )]],
        ..LogSelection::default()
    };
    let query = presets::logs_in_range(from, to, vec![transfers]);

    let started = Instant::now();
    let mut stream = client.stream(query, StreamConfig::with_batch_size(50)).await?;
    let done = stream.done_signal();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut total_logs = 0usize;
    let mut blocks = BTreeSet::new();
    let mut interrupted = false;

    loop {
        let (records, errors) = stream.channels();
        let next = tokio::select! {
            biased;
            Some(e) = errors.recv() => Err(e),
            Some(response) = records.recv() => Ok(Some(response)),
            _ = done.wait() => Ok(None),
            _ = &mut shutdown => {
                interrupted = true;
                Ok(None)
            }
        };
        let response = match next {
            Ok(Some(response)) => response,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Stream failed");
                return Err(e.into());
            }
        };

        total_logs += response.data.logs.len();
        blocks.extend(response.data.logs.iter().filter_map(|log| log.block_number));
        tracing::info!(
            current_sync_block = response.next_block,
            end_block = to,
            logs = response.data.logs.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Received logs"
        );
        stream.ack();
    }

    if interrupted {
        stream.unsubscribe().await;
    }

    tracing::info!(
        total_logs,
        blocks_with_transfers = blocks.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        state = ?stream.state(),
        "Done"
    );
    Ok(())
}
