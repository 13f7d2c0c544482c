//! Error types for hypersync-stream
//!
//! This module provides the error taxonomy used across the crate:
//! - Transport failures (network, non-success HTTP status) which the retry layer may repeat
//! - Decode failures for the packed envelope and columnar batches, which are never retried
//! - Cancellation, configuration, and protocol violations

use crate::types::DataCategory;
use thiserror::Error;

/// Result type alias for hypersync-stream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hypersync-stream
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrency")
        key: Option<String>,
    },

    /// The query cannot be executed as given (empty range, missing bounds)
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Connection failure, timeout, or body read failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status; the body is carried verbatim
    #[error("unexpected status code: {status}, response: {body}")]
    Http {
        /// HTTP status code returned by the server
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The response body could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// JSON (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server violated the pagination contract
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The shared cancellation token fired
    #[error("operation cancelled")]
    Cancelled,

    /// Every attempt allowed by the retry policy failed
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Total number of attempts made
        attempts: u32,
        /// The failure observed on the last attempt
        #[source]
        source: Box<Error>,
    },

    /// `start()` was called on a stream that already left the `Created` state
    #[error("stream already started")]
    AlreadyStarted,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Failures while decoding a query response body
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The packed Cap'n Proto frame or one of its pointers is malformed
    #[error("malformed envelope: {0}")]
    Envelope(#[from] capnp::Error),

    /// A required field of the envelope is missing or has the wrong width
    #[error("missing or malformed field `{0}`")]
    MissingField(&'static str),

    /// Archive height was negative but not the `-1` "absent" sentinel
    #[error("invalid archive height {0}")]
    InvalidArchiveHeight(i64),

    /// A category blob is too short to hold the reserved prefix and a stream
    #[error("{category} payload is {len} bytes, too short for an IPC stream")]
    TruncatedPayload {
        /// Category the payload belongs to
        category: DataCategory,
        /// Length of the blob as received
        len: usize,
    },

    /// Arrow IPC stream could not be read
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A record batch carries a different number of columns than its schema
    #[error("record batch has {batch} columns but schema declares {schema}")]
    ColumnCountMismatch {
        /// Number of fields in the schema
        schema: usize,
        /// Number of columns in the batch
        batch: usize,
    },

    /// The server sent a column this client does not know
    #[error("unsupported {category} column `{column}`")]
    UnknownColumn {
        /// Category being decoded
        category: DataCategory,
        /// Column name as received
        column: String,
    },

    /// A known column arrived with an unexpected Arrow type
    #[error("column `{column}` has type {found}, expected {expected}")]
    ColumnType {
        /// Column name
        column: String,
        /// Description of the accepted types
        expected: &'static str,
        /// Arrow type actually received
        found: String,
    },

    /// A fixed-width value (hash, address, bloom) has the wrong length
    #[error("column `{column}` holds {found} bytes, expected {expected}")]
    InvalidWidth {
        /// Column name
        column: String,
        /// Required byte width
        expected: usize,
        /// Byte width received
        found: usize,
    },

    /// A packed list of fixed-width values is not a whole number of elements
    #[error("column `{column}` holds {len} bytes, not a multiple of {width}")]
    UnalignedList {
        /// Column name
        column: String,
        /// Width of one element
        width: usize,
        /// Byte length received
        len: usize,
    },

    /// A binary-encoded nested value could not be decoded
    #[error("column `{column}` holds a malformed payload: {message}")]
    Payload {
        /// Column name
        column: String,
        /// What went wrong
        message: String,
    },

    /// A numeric value does not fit the target integer type
    #[error("column `{column}` value does not fit in {target}")]
    Overflow {
        /// Column name
        column: String,
        /// Name of the target type
        target: &'static str,
    },
}
