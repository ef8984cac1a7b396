//! Response collector.
//!
//! Runs on the caller's task while the submission task is writing. For every
//! sequence number received over the handoff channel it reads exactly one
//! reply and classifies it:
//!
//! 1. Unreadable or not a JSON-RPC envelope → [`Failure::Read`]
//! 2. JSON-RPC error with a non-zero code → [`Failure::Rpc`]
//! 3. `result` not matching the mode's schema → [`Failure::MalformedResult`]
//! 4. Check code != 0 → [`Failure::Check`], then (commit mode) deliver code != 0 → [`Failure::Deliver`]
//! 5. Anything else is a silent success
//!
//! Replies arrive in write order over the single connection. Each decoded id
//! is still compared with the expected one, and a mismatch aborts the run.

use tokio::sync::mpsc;

use crate::error::{BenchError, Result};
use crate::protocol::{CommitResult, RpcResponse, SubmitMode, TxResult};
use crate::report::{Diagnostics, Failure};
use crate::transport::ReplyReader;

/// Counters kept by the collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Replies the collector tried to read.
    pub reads_attempted: usize,
    /// Replies classified as success.
    pub successes: usize,
}

/// Drain the handoff channel, reading and classifying one reply per entry.
///
/// Returns when the channel is closed. Only a protocol desynchronization is
/// returned as an error; every other problem is recorded in `diagnostics`.
pub async fn collect_responses<R: ReplyReader>(
    reader: &mut R,
    handoff: &mut mpsc::Receiver<usize>,
    mode: SubmitMode,
    diagnostics: &mut Diagnostics,
) -> Result<CollectStats> {
    let mut stats = CollectStats::default();

    while let Some(seq) = handoff.recv().await {
        stats.reads_attempted += 1;

        let reply = match reader.read_reply().await {
            Ok(reply) => reply,
            Err(e) => {
                record(diagnostics, Failure::Read {
                    seq,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let response = match RpcResponse::decode(&reply) {
            Ok(response) => response,
            Err(e) => {
                record(diagnostics, Failure::Read {
                    seq,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let expected = seq as i64;
        if let Some(received) = response.id.filter(|id| *id != expected) {
            tracing::error!(
                "Reply for frame #{} carries id {}, connection is out of sync",
                seq,
                received
            );
            return Err(BenchError::Desync { expected, received });
        }

        match classify(seq, mode, &response) {
            Some(failure) => record(diagnostics, failure),
            None => stats.successes += 1,
        }
    }

    Ok(stats)
}

fn record(diagnostics: &mut Diagnostics, failure: Failure) {
    tracing::debug!("{}", failure);
    diagnostics.failure(failure);
}

/// Classify a decoded reply. Returns `None` for success.
pub fn classify(seq: usize, mode: SubmitMode, response: &RpcResponse) -> Option<Failure> {
    if let Some(error) = response.failure() {
        return Some(Failure::Rpc {
            seq,
            error: error.clone(),
        });
    }

    match mode {
        SubmitMode::Commit => match response.decode_result::<CommitResult>() {
            Err(e) => Some(malformed(seq, e)),
            Ok(result) if !result.check_tx.is_ok() => Some(check_failed(seq, result.check_tx)),
            // A passed check must be followed by an execution outcome.
            Ok(CommitResult {
                deliver_tx: None, ..
            }) => Some(Failure::MalformedResult {
                seq,
                reason: "missing deliver_tx".to_string(),
            }),
            Ok(CommitResult {
                deliver_tx: Some(deliver),
                ..
            }) if !deliver.is_ok() => Some(Failure::Deliver {
                seq,
                code: deliver.code,
                log: deliver.log,
            }),
            Ok(_) => None,
        },
        SubmitMode::Sync => match response.decode_result::<TxResult>() {
            Err(e) => Some(malformed(seq, e)),
            Ok(result) if !result.is_ok() => Some(check_failed(seq, result)),
            Ok(_) => None,
        },
    }
}

fn malformed(seq: usize, e: BenchError) -> Failure {
    Failure::MalformedResult {
        seq,
        reason: e.to_string(),
    }
}

fn check_failed(seq: usize, check: TxResult) -> Failure {
    Failure::Check {
        seq,
        code: check.code,
        log: check.log,
    }
}
