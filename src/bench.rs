//! Benchmark builder and run loop.
//!
//! The [`BenchmarkBuilder`] provides a fluent API over [`BenchConfig`]. The
//! [`Benchmark`] drives one run:
//! 1. Prepare frames (before connecting)
//! 2. Connect and split the websocket
//! 3. Spawn the submission task, collect replies on the caller's task
//! 4. In sync mode, wait for the mempool to drain
//! 5. Close the connection and assemble the [`Report`]
//!
//! # Example
//!
//! ```ignore
//! use txbench::{Benchmark, SubmitMode};
//! use txbench::codec::TxReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bench = Benchmark::builder()
//!         .node_addr("https://node.example:443")
//!         .mode(SubmitMode::Sync)
//!         .build()?;
//!
//!     let frames = bench.prepare(TxReader::new(std::io::stdin().lock()))?;
//!     let report = bench.run(frames).await?;
//!     report.write_to(&mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::codec::Marshal;
use crate::collector::collect_responses;
use crate::config::BenchConfig;
use crate::error::{BoxError, Result};
use crate::prepare::Preparer;
use crate::protocol::{SubmitMode, WireFrame};
use crate::report::{Diagnostics, Report, RunStats};
use crate::submit::spawn_submission_task;
use crate::transport::{connect, FrameWriter, ReplyReader};
use crate::verify::{CompletionVerifier, CONFIRM_TIME_LABEL};

/// Label of the commit-mode receive timing line.
pub const WORK_TIME_LABEL: &str = "work time";

/// Label of the sync-mode receive timing line.
pub const RECEIVE_TIME_LABEL: &str = "receive work time";

/// Builder for configuring and creating a [`Benchmark`].
#[derive(Debug, Clone, Default)]
pub struct BenchmarkBuilder {
    config: BenchConfig,
}

impl BenchmarkBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. [`BenchConfig::from_env`].
    pub fn config(mut self, config: BenchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the node's HTTP(S) RPC address.
    pub fn node_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.node_addr = addr.into();
        self
    }

    /// Set the submission mode.
    ///
    /// Default: commit
    pub fn mode(mut self, mode: SubmitMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the handoff channel capacity.
    ///
    /// Default: 256
    pub fn handoff_capacity(mut self, capacity: usize) -> Self {
        self.config.handoff_capacity = capacity;
        self
    }

    /// Set the pause between pending-count queries.
    ///
    /// Default: 100ms
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the upper bound on the confirmation wait.
    ///
    /// Default: 10 minutes
    pub fn max_confirm_wait(mut self, max_wait: Duration) -> Self {
        self.config.max_confirm_wait = max_wait;
        self
    }

    /// Validate the configuration and build the benchmark.
    pub fn build(self) -> Result<Benchmark> {
        Benchmark::new(self.config)
    }
}

/// A configured benchmark.
#[derive(Debug, Clone)]
pub struct Benchmark {
    config: BenchConfig,
    verifier: CompletionVerifier,
}

impl Benchmark {
    /// Create a new benchmark builder.
    pub fn builder() -> BenchmarkBuilder {
        BenchmarkBuilder::new()
    }

    /// Create a benchmark from a configuration.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let verifier = CompletionVerifier::new(config.poll_interval, config.max_confirm_wait)?;
        Ok(Self { config, verifier })
    }

    /// The configuration in use.
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Prepare frames for this benchmark's mode.
    ///
    /// See [`Preparer::prepare`].
    pub fn prepare<I, T, E>(&self, source: I) -> Result<Vec<WireFrame>>
    where
        I: IntoIterator<Item = std::result::Result<T, E>>,
        T: Marshal,
        E: Into<BoxError>,
    {
        Preparer::new(self.config.mode).prepare(source)
    }

    /// Connect to the configured node and submit `frames`.
    ///
    /// The connection is opened even when `frames` is empty.
    pub async fn run(&self, frames: Vec<WireFrame>) -> Result<Report> {
        let (writer, reader) = connect(&self.config.node_addr).await?.split();
        self.run_on(writer, reader, frames).await
    }

    /// Submit `frames` over an already open connection.
    ///
    /// The writer is closed before returning successfully. On a fatal error
    /// both halves are dropped.
    pub async fn run_on<W, R>(
        &self,
        writer: W,
        mut reader: R,
        frames: Vec<WireFrame>,
    ) -> Result<Report>
    where
        W: FrameWriter,
        R: ReplyReader,
    {
        let mode = self.config.mode;
        tracing::info!("Submitting {} frames in {} mode", frames.len(), mode);

        let start = Instant::now();
        let (handoff_tx, mut handoff_rx) = mpsc::channel(self.config.handoff_capacity);
        let submission = spawn_submission_task(writer, frames, handoff_tx);

        let mut receive = Diagnostics::new();
        let collected =
            match collect_responses(&mut reader, &mut handoff_rx, mode, &mut receive).await {
                Ok(collected) => collected,
                Err(e) => {
                    drop(handoff_rx);
                    submission.abort();
                    return Err(e);
                }
            };
        let outcome = submission.await?;
        let mut writer = outcome.writer;

        // Timing lines go last, after any give-up failure.
        let completion = if mode.requires_confirmation() {
            let received = start.elapsed();
            let completion = self
                .verifier
                .wait(&mut writer, &mut reader, &mut receive)
                .await?;
            receive.timing(RECEIVE_TIME_LABEL, received);
            receive.timing(CONFIRM_TIME_LABEL, completion.waited());
            Some(completion)
        } else {
            receive.timing(WORK_TIME_LABEL, start.elapsed());
            None
        };

        if let Err(e) = writer.close().await {
            tracing::warn!("Cannot close connection cleanly: {}", e);
        }

        let stats = RunStats {
            frames: outcome.frames,
            writes_succeeded: outcome.writes_succeeded,
            reads_attempted: collected.reads_attempted,
            successes: collected.successes,
        };
        let report = Report {
            send: outcome.diagnostics,
            receive,
            stats,
            completion,
        };
        tracing::info!(
            "Run finished: {}/{} successful, {} failures",
            stats.successes,
            stats.frames,
            report.failure_count()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let bench = Benchmark::builder().build().unwrap();
        assert_eq!(bench.config(), &BenchConfig::default());
    }

    #[test]
    fn test_builder_overrides() {
        let bench = Benchmark::builder()
            .node_addr("http://127.0.0.1:26657")
            .mode(SubmitMode::Sync)
            .handoff_capacity(8)
            .poll_interval(Duration::from_millis(5))
            .max_confirm_wait(Duration::from_secs(2))
            .build()
            .unwrap();

        let config = bench.config();
        assert_eq!(config.node_addr, "http://127.0.0.1:26657");
        assert_eq!(config.mode, SubmitMode::Sync);
        assert_eq!(config.handoff_capacity, 8);
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.max_confirm_wait, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        assert!(Benchmark::builder().handoff_capacity(0).build().is_err());
    }

    #[test]
    fn test_builder_rejects_zero_poll_interval() {
        let err = Benchmark::builder()
            .mode(SubmitMode::Sync)
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, crate::BenchError::Config(_)));
    }

    #[test]
    fn test_prepare_uses_configured_mode() {
        let bench = Benchmark::builder().mode(SubmitMode::Sync).build().unwrap();
        let frames = bench
            .prepare(vec![Ok::<_, std::convert::Infallible>(
                crate::codec::RawTx::from_slice(b"tx"),
            )])
            .unwrap();
        assert!(frames[0].as_str().contains("broadcast_tx_sync"));
    }
}
