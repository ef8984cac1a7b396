//! Error types for txbench.
//!
//! Only fatal conditions are errors. Per-frame problems (a failed write, an
//! undecodable reply, a rejected transaction) are recorded as
//! [`Failure`](crate::report::Failure) lines in the report instead.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Boxed error produced by a transaction source or serializer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all txbench operations.
#[derive(Debug, Error)]
pub enum BenchError {
    /// I/O error while reading input or talking to the node.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Websocket transport error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The node address could not be parsed.
    #[error("invalid node address: {0}")]
    Url(#[from] url::ParseError),

    /// The node address cannot be turned into a websocket endpoint.
    #[error("invalid endpoint {0:?}: {1}")]
    InvalidEndpoint(String, &'static str),

    /// The websocket connection could not be established.
    #[error("cannot create {url:?} websocket connection: {source}")]
    Connect {
        /// Endpoint that was dialed.
        url: String,
        /// Underlying transport error.
        #[source]
        source: tungstenite::Error,
    },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The transaction source failed before end of input.
    #[error("cannot read transaction #{index} from input: {source}")]
    Input {
        /// Position of the transaction in the input.
        index: usize,
        /// Error reported by the source.
        #[source]
        source: BoxError,
    },

    /// A transaction could not be serialized.
    #[error("cannot marshal transaction #{index}: {source}")]
    Marshal {
        /// Position of the transaction in the input.
        index: usize,
        /// Error reported by the serializer.
        #[source]
        source: BoxError,
    },

    /// A reply carried an id other than the one expected next.
    #[error("protocol desynchronized: expected response id {expected}, received {received}")]
    Desync {
        /// Id of the request the reply should answer.
        expected: i64,
        /// Id found in the reply.
        received: i64,
    },

    /// The node answered with something the protocol does not allow.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// The submission task panicked or was cancelled.
    #[error("submission task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Result type alias using BenchError.
pub type Result<T> = std::result::Result<T, BenchError>;
