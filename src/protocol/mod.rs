//! Protocol module - JSON-RPC envelopes, submission modes and wire frames.
//!
//! This module implements everything that goes over the websocket:
//! - Request/response envelopes and mode-specific result payloads
//! - The commit/sync submission modes
//! - Precompiled frames

mod frame;
mod jsonrpc;
mod mode;

pub use frame::WireFrame;
pub use jsonrpc::{
    CommitResult, PendingCount, RpcError, RpcRequest, RpcResponse, TxResult, JSONRPC_VERSION,
    METHOD_BROADCAST_COMMIT, METHOD_BROADCAST_SYNC, METHOD_NUM_UNCONFIRMED, PENDING_QUERY_ID,
};
pub use mode::SubmitMode;
