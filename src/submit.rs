//! Dedicated submission task.
//!
//! The submission task owns the write half of the connection and the
//! prepared frames. It writes the frames in order and, for every frame that
//! made it onto the wire, passes its sequence number to the collector over a
//! bounded channel:
//!
//! ```text
//! frames ─► Submission Task ─► websocket
//!                 │
//!                 └─► mpsc::Sender<usize> (bounded) ─► Collector
//! ```
//!
//! The channel bound is the backpressure: the task cannot run more than
//! `capacity` replies ahead of the collector. Dropping the sender at the end
//! of the loop is the only signal the collector gets that no more replies are
//! coming.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::protocol::WireFrame;
use crate::report::{Diagnostics, Failure};
use crate::transport::FrameWriter;

/// Label of the send-phase timing line.
pub const SUBMIT_TIME_LABEL: &str = "submit work time";

/// What the submission task hands back when it is done.
pub struct SubmitOutcome<W> {
    /// The write half, returned for the confirmation queries and the final close.
    pub writer: W,
    /// Send-phase diagnostics.
    pub diagnostics: Diagnostics,
    /// Frames the task was given.
    pub frames: usize,
    /// Frames written without error.
    pub writes_succeeded: usize,
}

/// Spawn the submission task.
///
/// # Arguments
///
/// * `writer` - Write half of the connection
/// * `frames` - Prepared frames, written in order
/// * `handoff` - Sender side of the handoff channel
///
/// # Returns
///
/// A `JoinHandle` resolving to the task's [`SubmitOutcome`].
pub fn spawn_submission_task<W>(
    writer: W,
    frames: Vec<WireFrame>,
    handoff: mpsc::Sender<usize>,
) -> JoinHandle<SubmitOutcome<W>>
where
    W: FrameWriter,
{
    tokio::spawn(submit_loop(writer, frames, handoff))
}

/// Main submission loop - writes frames and signals the collector.
async fn submit_loop<W>(
    mut writer: W,
    frames: Vec<WireFrame>,
    handoff: mpsc::Sender<usize>,
) -> SubmitOutcome<W>
where
    W: FrameWriter,
{
    let mut diagnostics = Diagnostics::new();
    let mut writes_succeeded = 0;
    let total = frames.len();

    let start = Instant::now();
    for frame in &frames {
        let seq = frame.seq();

        if let Err(e) = writer.write_frame(frame).await {
            tracing::warn!("Cannot write frame #{}: {}", seq, e);
            diagnostics.failure(Failure::Write {
                seq,
                reason: e.to_string(),
            });
            continue;
        }
        writes_succeeded += 1;

        if handoff.send(seq).await.is_err() {
            // The collector hit a fatal error and is gone.
            tracing::error!("Collector stopped, abandoning submission at frame #{}", seq);
            break;
        }
    }
    drop(handoff);

    let elapsed = start.elapsed();
    diagnostics.timing(SUBMIT_TIME_LABEL, elapsed);
    tracing::info!(
        "Submitted {}/{} frames in {:?}",
        writes_succeeded,
        total,
        elapsed
    );

    SubmitOutcome {
        writer,
        diagnostics,
        frames: total,
        writes_succeeded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BenchError, Result};
    use crate::protocol::SubmitMode;
    use std::collections::HashSet;

    /// Records written frames, failing on the configured positions.
    #[derive(Default)]
    struct RecordingWriter {
        fail_at: HashSet<usize>,
        written: Vec<usize>,
    }

    impl FrameWriter for RecordingWriter {
        async fn write_frame(&mut self, frame: &WireFrame) -> Result<()> {
            if self.fail_at.contains(&frame.seq()) {
                return Err(BenchError::ConnectionClosed);
            }
            self.written.push(frame.seq());
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn frames(n: usize) -> Vec<WireFrame> {
        (0..n)
            .map(|i| WireFrame::transaction(i, SubmitMode::Commit, b"tx").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_all_frames_forwarded() {
        let (tx, mut rx) = mpsc::channel(16);
        let task = spawn_submission_task(RecordingWriter::default(), frames(5), tx);

        let mut received = Vec::new();
        while let Some(seq) = rx.recv().await {
            received.push(seq);
        }

        let outcome = task.await.unwrap();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
        assert_eq!(outcome.writer.written, vec![0, 1, 2, 3, 4]);
        assert_eq!(outcome.writes_succeeded, 5);
        assert_eq!(outcome.frames, 5);
        assert_eq!(outcome.diagnostics.failure_count(), 0);
        assert!(outcome.diagnostics.timing_of(SUBMIT_TIME_LABEL).is_some());
    }

    #[tokio::test]
    async fn test_failed_write_not_forwarded() {
        let writer = RecordingWriter {
            fail_at: [1, 3].into_iter().collect(),
            ..Default::default()
        };
        let (tx, mut rx) = mpsc::channel(16);
        let task = spawn_submission_task(writer, frames(5), tx);

        let mut received = Vec::new();
        while let Some(seq) = rx.recv().await {
            received.push(seq);
        }

        let outcome = task.await.unwrap();
        assert_eq!(received, vec![0, 2, 4]);
        assert_eq!(outcome.writes_succeeded, 3);

        let failed: Vec<_> = outcome
            .diagnostics
            .failures()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(
            failed,
            vec![
                "FAIL: #1: cannot write message: connection closed",
                "FAIL: #3: cannot write message: connection closed",
            ]
        );
        // The timing line comes last.
        assert!(matches!(
            outcome.diagnostics.entries().last(),
            Some(crate::report::Entry::Timing { .. })
        ));
    }

    #[tokio::test]
    async fn test_backpressure_bounds_lead() {
        let (tx, mut rx) = mpsc::channel(2);
        let task = spawn_submission_task(RecordingWriter::default(), frames(10), tx);

        // Nobody is reading yet: the task parks once the channel is full.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 10);
        assert_eq!(task.await.unwrap().writes_succeeded, 10);
    }

    #[tokio::test]
    async fn test_stops_when_collector_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let outcome = spawn_submission_task(RecordingWriter::default(), frames(10), tx)
            .await
            .unwrap();
        // The first write succeeds, then the closed channel stops the loop.
        assert_eq!(outcome.writer.written, vec![0]);
        assert!(outcome.diagnostics.timing_of(SUBMIT_TIME_LABEL).is_some());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (tx, mut rx) = mpsc::channel(1);
        let outcome = spawn_submission_task(RecordingWriter::default(), Vec::new(), tx)
            .await
            .unwrap();
        assert!(rx.recv().await.is_none());
        assert_eq!(outcome.writes_succeeded, 0);
        assert_eq!(outcome.diagnostics.entries().len(), 1);
    }
}
