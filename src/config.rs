//! Configuration types for hypersync-stream

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Connection settings for a single HyperSync endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the HyperSync server (default: "https://eth.hypersync.xyz")
    #[serde(default = "default_url")]
    pub url: Url,

    /// Bearer token sent with every request (None = anonymous)
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Deadline for a single HTTP round trip (default: 30 seconds)
    #[serde(default = "default_http_req_timeout", with = "duration_ms_serde")]
    pub http_req_timeout: Duration,

    /// Retry policy applied to every request
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            bearer_token: None,
            http_req_timeout: default_http_req_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Config pointing at `url` with every other setting at its default
    pub fn with_url(url: Url) -> Self {
        Self {
            url,
            ..Self::default()
        }
    }

    /// Reject settings that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.url.cannot_be_a_base() {
            return Err(Error::config("url", format!("{} is not a base URL", self.url)));
        }
        if self.http_req_timeout.is_zero() {
            return Err(Error::config(
                "http_req_timeout",
                "request timeout must be greater than zero",
            ));
        }
        self.retry.validate()
    }
}

/// Retry policy for failed requests
///
/// The wait before retry `n` (zero-based) is
/// `min(retry_base_ms + retry_backoff_ms * n, retry_ceiling_ms)` plus a uniform
/// jitter in `[0, retry_backoff_ms)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Number of retries after the first attempt (default: 12)
    #[serde(default = "default_max_num_retries")]
    pub max_num_retries: u32,

    /// Initial wait before the first retry, in milliseconds (default: 200)
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Linear backoff step and jitter width, in milliseconds (default: 500)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound on the deterministic part of the wait, in milliseconds (default: 5000)
    #[serde(default = "default_retry_ceiling_ms")]
    pub retry_ceiling_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_num_retries: default_max_num_retries(),
            retry_base_ms: default_retry_base_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            retry_ceiling_ms: default_retry_ceiling_ms(),
        }
    }
}

impl RetryConfig {
    /// Ceiling must not sit below the base delay
    pub fn validate(&self) -> Result<()> {
        if self.retry_ceiling_ms < self.retry_base_ms {
            return Err(Error::config(
                "retry_ceiling_ms",
                format!(
                    "ceiling ({}ms) is below base delay ({}ms)",
                    self.retry_ceiling_ms, self.retry_base_ms
                ),
            ));
        }
        Ok(())
    }
}

/// Streaming behaviour: parallelism, sub-range size and consumer acknowledgment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Number of sub-queries in flight at once (default: 10)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of blocks covered by each sub-query (default: 1000)
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,

    /// Skip acknowledgment gating on teardown (default: false)
    ///
    /// When gating is on, the consumer must call `Stream::ack()` once per record
    /// received before the stream signals completion.
    #[serde(default)]
    pub disable_ack: bool,

    /// Per-request cap on returned blocks, applied to every sub-query
    #[serde(default)]
    pub max_num_blocks: Option<u64>,

    /// Per-request cap on returned transactions, applied to every sub-query
    #[serde(default)]
    pub max_num_transactions: Option<u64>,

    /// Per-request cap on returned logs, applied to every sub-query
    #[serde(default)]
    pub max_num_logs: Option<u64>,

    /// Per-request cap on returned traces, applied to every sub-query
    #[serde(default)]
    pub max_num_traces: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            batch_size: default_batch_size(),
            disable_ack: false,
            max_num_blocks: None,
            max_num_transactions: None,
            max_num_logs: None,
            max_num_traces: None,
        }
    }
}

impl StreamConfig {
    /// Default settings with a custom sub-range size
    pub fn with_batch_size(batch_size: u64) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    /// Fail fast on settings the stream engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::config("concurrency", "concurrency must be positive"));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size", "batch size must be positive"));
        }
        Ok(())
    }
}

#[allow(clippy::expect_used)]
fn default_url() -> Url {
    Url::parse("https://eth.hypersync.xyz").expect("static default URL parses")
}

fn default_http_req_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_num_retries() -> u32 {
    12
}

fn default_retry_base_ms() -> u64 {
    200
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_retry_ceiling_ms() -> u64 {
    5_000
}

fn default_concurrency() -> usize {
    10
}

fn default_batch_size() -> u64 {
    1_000
}

// Duration serialization helper (integer milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
