//! Precompiled wire frames.
//!
//! A [`WireFrame`] is one serialized JSON-RPC request, built once before the
//! run starts so that the submission loop does nothing but write bytes.
//! The text is kept as a websocket `Utf8Bytes`, so handing a frame to the
//! transport is a reference-count bump with no UTF-8 re-check.
//!
//! # Example
//!
//! ```
//! use txbench::protocol::{SubmitMode, WireFrame};
//!
//! let frame = WireFrame::transaction(0, SubmitMode::Commit, &[1, 2, 3]).unwrap();
//! assert_eq!(frame.seq(), 0);
//! assert_eq!(frame.request_id(), 0);
//! assert!(frame.as_str().contains("broadcast_tx_commit"));
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio_tungstenite::tungstenite::Utf8Bytes;

use super::jsonrpc::{RpcRequest, METHOD_NUM_UNCONFIRMED, PENDING_QUERY_ID};
use super::mode::SubmitMode;
use crate::error::Result;

/// An immutable, ready-to-send request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame {
    /// Position in the prepared batch (0-based).
    seq: usize,
    /// JSON-RPC id carried by the payload.
    request_id: i64,
    /// JSON text of the request.
    text: Utf8Bytes,
}

impl WireFrame {
    /// Build the frame submitting `raw_tx` as the `seq`-th transaction.
    ///
    /// The request id equals the sequence number. Transaction bytes travel
    /// base64-encoded inside a single-element params array.
    pub fn transaction(seq: usize, mode: SubmitMode, raw_tx: &[u8]) -> Result<Self> {
        let request_id = seq as i64;
        let params = [STANDARD.encode(raw_tx)];
        let text = RpcRequest::new(request_id, mode.method(), params).encode_text()?;
        Ok(Self {
            seq,
            request_id,
            text: Utf8Bytes::from(text),
        })
    }

    /// Build the pending-count query sent while waiting for the mempool to
    /// drain. It carries [`PENDING_QUERY_ID`] and no sequence position.
    pub fn pending_count_query() -> Result<Self> {
        let params = serde_json::Map::new();
        let text = RpcRequest::new(PENDING_QUERY_ID, METHOD_NUM_UNCONFIRMED, params).encode_text()?;
        Ok(Self {
            seq: 0,
            request_id: PENDING_QUERY_ID,
            text: Utf8Bytes::from(text),
        })
    }

    /// Position of this frame in the batch.
    #[inline]
    pub fn seq(&self) -> usize {
        self.seq
    }

    /// JSON-RPC id the node will echo back.
    #[inline]
    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    /// Message text, ready for a websocket text frame (zero-copy clone).
    #[inline]
    pub fn text(&self) -> Utf8Bytes {
        self.text.clone()
    }

    /// Payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Payload as text.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the payload is empty. Never true for frames built by this
    /// module.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_frame() {
        let frame = WireFrame::transaction(7, SubmitMode::Sync, b"\x01\x02\x03").unwrap();
        assert_eq!(frame.seq(), 7);
        assert_eq!(frame.request_id(), 7);
        assert_eq!(
            frame.as_str(),
            r#"{"jsonrpc":"2.0","id":7,"method":"broadcast_tx_sync","params":["AQID"]}"#
        );
        assert_eq!(frame.len(), frame.as_str().len());
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_pending_count_query() {
        let frame = WireFrame::pending_count_query().unwrap();
        assert_eq!(frame.request_id(), PENDING_QUERY_ID);
        assert_eq!(
            frame.as_str(),
            r#"{"jsonrpc":"2.0","id":-1,"method":"num_unconfirmed_txs","params":{}}"#
        );
    }

    #[test]
    fn test_empty_transaction() {
        let frame = WireFrame::transaction(0, SubmitMode::Commit, &[]).unwrap();
        assert!(frame.as_str().ends_with(r#""params":[""]}"#));
    }

    #[test]
    fn test_payload_is_shared() {
        let frame = WireFrame::transaction(1, SubmitMode::Commit, b"tx").unwrap();
        let a = frame.text();
        let b = frame.text();
        assert_eq!(a.as_str().as_ptr(), b.as_str().as_ptr());
        assert_eq!(frame.payload(), frame.as_str().as_bytes());
    }
}
