//! JSON-RPC 2.0 envelopes spoken by the node's websocket endpoint.
//!
//! Requests are serialized once, ahead of the run. Responses are decoded in
//! two steps: first the envelope ([`RpcResponse`]), then the mode-specific
//! `result` payload ([`CommitResult`], [`TxResult`] or [`PendingCount`]).
//!
//! ```text
//! → {"jsonrpc":"2.0","id":7,"method":"broadcast_tx_commit","params":["<base64>"]}
//! ← {"jsonrpc":"2.0","id":7,"result":{"height":"12","check_tx":{..},"deliver_tx":{..}}}
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// JSON-RPC protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method that waits until the transaction is included in a block.
pub const METHOD_BROADCAST_COMMIT: &str = "broadcast_tx_commit";

/// Method that returns once the transaction passed the mempool check.
pub const METHOD_BROADCAST_SYNC: &str = "broadcast_tx_sync";

/// Method returning the number of transactions still in the mempool.
pub const METHOD_NUM_UNCONFIRMED: &str = "num_unconfirmed_txs";

/// Request id reserved for the pending-count query.
///
/// Transaction frames are numbered from 0 upwards, so a negative id can never
/// collide with one of them.
pub const PENDING_QUERY_ID: i64 = -1;

/// An outgoing JSON-RPC request.
///
/// Field order is fixed, so serializing the same request twice yields the
/// same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcRequest<P> {
    /// Always [`JSONRPC_VERSION`].
    pub jsonrpc: &'static str,
    /// Request id, echoed back by the node.
    pub id: i64,
    /// Method name.
    pub method: &'static str,
    /// Method parameters.
    pub params: P,
}

impl<P: Serialize> RpcRequest<P> {
    /// Create a request for `method` with the given id and parameters.
    pub fn new(id: i64, method: &'static str, params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }

    /// Serialize the request to its JSON text.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Serialize the request to a JSON string.
    pub fn encode_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Error object of a failed JSON-RPC call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RpcError {
    /// Error code; 0 means no error.
    #[serde(default)]
    pub code: i64,
    /// Short description.
    #[serde(default)]
    pub message: String,
    /// Extra detail, usually the node's internal error text.
    #[serde(default)]
    pub data: Option<String>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}", self.code, self.message)?;
        if let Some(data) = self.data.as_deref().filter(|d| !d.is_empty()) {
            write!(f, " ({})", data)?;
        }
        Ok(())
    }
}

/// A JSON-RPC response envelope.
///
/// `result` is kept as raw JSON and decoded separately with
/// [`RpcResponse::decode_result`], because its shape depends on the method.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcResponse {
    /// Protocol version reported by the node.
    #[serde(default)]
    pub jsonrpc: String,
    /// Id of the request this answers. `null` for parse errors.
    #[serde(default)]
    pub id: Option<i64>,
    /// Error object, present when the call failed.
    #[serde(default)]
    pub error: Option<RpcError>,
    /// Method-specific result.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Decode a response envelope from the raw message text.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The error object, if the node reported a non-zero error code.
    pub fn failure(&self) -> Option<&RpcError> {
        self.error.as_ref().filter(|e| e.code != 0)
    }

    /// Decode the `result` payload into a method-specific type.
    ///
    /// A missing result is decoded as JSON `null`, which fails for every
    /// result type this crate knows about.
    pub fn decode_result<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.result.clone().unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(value)?)
    }
}

/// Outcome of one ABCI phase (check or deliver).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxResult {
    /// Application result code; 0 means success.
    #[serde(default)]
    pub code: u32,
    /// Application log output.
    #[serde(default)]
    pub log: String,
    /// Application result data (base64).
    #[serde(default)]
    pub data: Option<String>,
}

impl TxResult {
    /// Whether the application accepted the transaction in this phase.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Result of `broadcast_tx_commit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommitResult {
    /// Block height; nodes encode it either as a string or a number.
    #[serde(default)]
    pub height: serde_json::Value,
    /// Mempool check outcome.
    pub check_tx: TxResult,
    /// Block execution outcome (`tx_result` in newer nodes). Absent when
    /// the transaction never got past the mempool check.
    #[serde(default, alias = "tx_result")]
    pub deliver_tx: Option<TxResult>,
}

/// Result of `num_unconfirmed_txs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PendingCount {
    /// Number of transactions returned by this call (decimal string).
    pub n_txs: String,
    /// Total number of transactions in the mempool (decimal string).
    #[serde(default)]
    pub total: String,
}

impl PendingCount {
    /// Whether the mempool has been drained.
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.n_txs == "0"
    }
}
