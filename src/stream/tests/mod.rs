
use super::*;
use crate::test_helpers::{ScriptedSource, logs_response};
use std::time::Duration;

/// Source that serves at most `page` blocks per request, so sub-ranges span several
/// pages
fn paged_source(height: u64, page: u64) -> Arc<ScriptedSource> {
    ScriptedSource::new(height, move |query| {
        Box::pin(async move {
            let to = query.to_block.unwrap_or(height);
            let next = to.min(query.from_block + page);
            Ok(logs_response(query.from_block, next))
        })
    })
}

fn stream_config(concurrency: usize, batch_size: u64, disable_ack: bool) -> StreamConfig {
    StreamConfig {
        concurrency,
        batch_size,
        disable_ack,
        ..StreamConfig::default()
    }
}

fn range_query(from: u64, to: u64) -> Query {
    Query {
        from_block: from,
        to_block: Some(to),
        ..Query::default()
    }
}

/// Drain the record queue, acknowledging each record, and return the block numbers
/// of every log in delivery order
async fn drain_blocks(stream: &mut Stream) -> Vec<u64> {
    let mut blocks = Vec::new();
    while let Some(response) = stream.channel().recv().await {
        blocks.extend(response.data.logs.iter().filter_map(|log| log.block_number));
        stream.ack();
    }
    blocks
}

async fn wait_done(stream: &Stream) {
    tokio::time::timeout(Duration::from_secs(5), stream.done())
        .await
        .expect("done should fire");
}
