//! Submission modes.

use std::fmt;
use std::str::FromStr;

use super::jsonrpc::{METHOD_BROADCAST_COMMIT, METHOD_BROADCAST_SYNC};
use crate::error::BenchError;

/// How transactions are submitted to the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    /// `broadcast_tx_commit`: each reply carries the final check and deliver
    /// outcome.
    #[default]
    Commit,
    /// `broadcast_tx_sync`: each reply only acknowledges mempool admission;
    /// completion is confirmed by polling the pending transaction count.
    Sync,
}

impl SubmitMode {
    /// JSON-RPC method used for transaction frames.
    #[inline]
    pub fn method(self) -> &'static str {
        match self {
            SubmitMode::Commit => METHOD_BROADCAST_COMMIT,
            SubmitMode::Sync => METHOD_BROADCAST_SYNC,
        }
    }

    /// Whether the run must wait for the mempool to drain after all replies
    /// were collected.
    #[inline]
    pub fn requires_confirmation(self) -> bool {
        matches!(self, SubmitMode::Sync)
    }
}

impl fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitMode::Commit => f.write_str("commit"),
            SubmitMode::Sync => f.write_str("sync"),
        }
    }
}

impl FromStr for SubmitMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commit" => Ok(SubmitMode::Commit),
            "sync" => Ok(SubmitMode::Sync),
            other => Err(BenchError::Config(format!(
                "unknown submit mode {:?}, expected \"commit\" or \"sync\"",
                other
            ))),
        }
    }
}
