//! Completion verifier for sync-mode runs.
//!
//! `broadcast_tx_sync` replies only say that a transaction entered the
//! mempool. To know when the node has actually processed the batch, the
//! verifier polls `num_unconfirmed_txs` until the mempool is empty:
//!
//! ```text
//!            n_txs != "0", deadline not reached
//!              ┌──────────────┐
//!              ▼              │ sleep(poll_interval)
//!  ──────► POLLING ───────────┘
//!              │
//!              ├── n_txs == "0" ──────────► DONE
//!              └── deadline reached ──────► GAVE UP
//! ```
//!
//! Every query carries [`PENDING_QUERY_ID`]. Any other id in the reply means
//! the connection is out of sync and the run is aborted.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::{BenchError, Result};
use crate::protocol::{PendingCount, RpcResponse, WireFrame, PENDING_QUERY_ID};
use crate::report::{Diagnostics, Failure};
use crate::transport::{FrameWriter, ReplyReader};

/// Default pause between two pending-count queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default upper bound on the confirmation wait.
pub const DEFAULT_MAX_CONFIRM_WAIT: Duration = Duration::from_secs(600);

/// Label of the confirmation timing line.
pub const CONFIRM_TIME_LABEL: &str = "confirm wait time";

/// How the confirmation wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The node reported an empty mempool.
    Drained {
        /// Pending-count queries sent.
        polls: u32,
        /// Time spent waiting.
        waited: Duration,
    },
    /// The deadline passed while transactions were still pending.
    GaveUp {
        /// Last pending count reported.
        pending: String,
        /// Pending-count queries sent.
        polls: u32,
        /// Time spent waiting.
        waited: Duration,
    },
}

impl Completion {
    /// Number of pending-count queries sent.
    pub fn polls(&self) -> u32 {
        match self {
            Completion::Drained { polls, .. } | Completion::GaveUp { polls, .. } => *polls,
        }
    }

    /// Time spent waiting.
    pub fn waited(&self) -> Duration {
        match self {
            Completion::Drained { waited, .. } | Completion::GaveUp { waited, .. } => *waited,
        }
    }

    /// Whether the mempool was seen empty.
    pub fn is_drained(&self) -> bool {
        matches!(self, Completion::Drained { .. })
    }
}

/// Polls the node until its mempool is empty or the deadline passes.
#[derive(Debug, Clone)]
pub struct CompletionVerifier {
    query: WireFrame,
    poll_interval: Duration,
    max_wait: Duration,
}

impl CompletionVerifier {
    /// Create a verifier.
    ///
    /// # Arguments
    ///
    /// * `poll_interval` - Pause between two queries
    /// * `max_wait` - Give up once this much time has passed
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Result<Self> {
        Ok(Self {
            query: WireFrame::pending_count_query()?,
            poll_interval,
            max_wait,
        })
    }

    /// Run the polling loop.
    ///
    /// Giving up records a [`Failure::Unconfirmed`] line in `diagnostics`.
    /// The wait duration is returned in the [`Completion`]; the caller
    /// appends it under [`CONFIRM_TIME_LABEL`] after its own timing line.
    ///
    /// # Errors
    ///
    /// Transport failures, malformed replies, JSON-RPC errors and unexpected
    /// ids are all fatal here.
    pub async fn wait<W, R>(
        &self,
        writer: &mut W,
        reader: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<Completion>
    where
        W: FrameWriter,
        R: ReplyReader,
    {
        let start = Instant::now();
        let mut polls = 0u32;

        let completion = loop {
            polls += 1;
            let count = self.query(writer, reader).await?;
            tracing::debug!("Poll #{}: {} unconfirmed transactions", polls, count.n_txs);

            if count.is_drained() {
                break Completion::Drained {
                    polls,
                    waited: start.elapsed(),
                };
            }

            if start.elapsed() >= self.max_wait {
                break Completion::GaveUp {
                    pending: count.n_txs,
                    polls,
                    waited: start.elapsed(),
                };
            }

            tokio::time::sleep(self.poll_interval).await;
        };

        match &completion {
            Completion::Drained { polls, waited } => {
                tracing::info!("Mempool drained after {} polls in {:?}", polls, waited);
            }
            Completion::GaveUp {
                pending,
                polls,
                waited,
            } => {
                tracing::warn!(
                    "Giving up after {:?}: {} transactions still unconfirmed",
                    waited,
                    pending
                );
                diagnostics.failure(Failure::Unconfirmed {
                    pending: pending.clone(),
                    polls: *polls,
                });
            }
        }

        Ok(completion)
    }

    /// Send one pending-count query and decode its reply.
    async fn query<W, R>(&self, writer: &mut W, reader: &mut R) -> Result<PendingCount>
    where
        W: FrameWriter,
        R: ReplyReader,
    {
        writer.write_frame(&self.query).await?;
        let reply = reader.read_reply().await?;
        let response = RpcResponse::decode(&reply)?;

        match response.id {
            Some(PENDING_QUERY_ID) => {}
            Some(received) => {
                return Err(BenchError::Desync {
                    expected: PENDING_QUERY_ID,
                    received,
                })
            }
            None => {
                return Err(BenchError::Protocol(
                    "pending count reply without id".to_string(),
                ))
            }
        }

        if let Some(error) = response.failure() {
            return Err(BenchError::Protocol(format!(
                "pending count query failed: {}",
                error
            )));
        }

        response.decode_result()
    }
}
