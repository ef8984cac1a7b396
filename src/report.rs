//! Diagnostics and the final report.
//!
//! Each unit of the pipeline owns one [`Diagnostics`] collector: the
//! submission task fills the send-phase one, the collector and the completion
//! verifier fill the receive-phase one. Both are merged into a [`Report`] once
//! both units have finished, so no buffer is ever shared between tasks.
//!
//! Only failures and timings are recorded. A successful round trip leaves no
//! line behind; it is counted in [`RunStats`].

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use crate::protocol::RpcError;
use crate::verify::Completion;

/// A recorded, non-fatal problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The frame could not be written to the connection.
    Write {
        /// Frame sequence number.
        seq: usize,
        /// Transport error text.
        reason: String,
    },
    /// The reply could not be read or is not a JSON-RPC envelope.
    Read {
        /// Frame sequence number.
        seq: usize,
        /// Transport or decode error text.
        reason: String,
    },
    /// The node answered with a JSON-RPC error.
    Rpc {
        /// Frame sequence number.
        seq: usize,
        /// Error object returned by the node.
        error: RpcError,
    },
    /// The reply's `result` does not match the submission mode's schema.
    MalformedResult {
        /// Frame sequence number.
        seq: usize,
        /// Decode error text.
        reason: String,
    },
    /// The application rejected the transaction in the mempool check.
    Check {
        /// Frame sequence number.
        seq: usize,
        /// Application result code.
        code: u32,
        /// Application log.
        log: String,
    },
    /// The application rejected the transaction during block execution.
    Deliver {
        /// Frame sequence number.
        seq: usize,
        /// Application result code.
        code: u32,
        /// Application log.
        log: String,
    },
    /// The mempool did not drain before the confirmation deadline.
    Unconfirmed {
        /// Last pending count reported by the node.
        pending: String,
        /// Number of pending-count queries sent.
        polls: u32,
    },
}

impl Failure {
    /// Sequence number of the frame this failure belongs to, if any.
    pub fn seq(&self) -> Option<usize> {
        match self {
            Failure::Write { seq, .. }
            | Failure::Read { seq, .. }
            | Failure::Rpc { seq, .. }
            | Failure::MalformedResult { seq, .. }
            | Failure::Check { seq, .. }
            | Failure::Deliver { seq, .. } => Some(*seq),
            Failure::Unconfirmed { .. } => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Write { seq, reason } => {
                write!(f, "FAIL: #{}: cannot write message: {}", seq, reason)
            }
            Failure::Read { seq, reason } => {
                write!(f, "FAIL: #{}: cannot read response: {}", seq, reason)
            }
            Failure::Rpc { seq, error } => {
                write!(f, "FAIL: #{}: failed response received: {}", seq, error)
            }
            Failure::MalformedResult { seq, reason } => {
                write!(f, "FAIL: #{}: cannot decode result: {}", seq, reason)
            }
            Failure::Check { seq, code, log } => {
                write!(f, "FAIL: #{}: failed check: {}: {}", seq, code, log)
            }
            Failure::Deliver { seq, code, log } => {
                write!(f, "FAIL: #{}: failed deliver: {}: {}", seq, code, log)
            }
            Failure::Unconfirmed { pending, polls } => write!(
                f,
                "FAIL: gave up waiting for {} unconfirmed transactions after {} polls",
                pending, polls
            ),
        }
    }
}

/// One diagnostics line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A recorded failure.
    Failure(Failure),
    /// A phase duration, e.g. `submit work time: 1.2s`.
    Timing {
        /// Phase label.
        label: &'static str,
        /// Measured duration.
        elapsed: Duration,
    },
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Failure(failure) => fmt::Display::fmt(failure, f),
            Entry::Timing { label, elapsed } => write!(f, "{}: {:?}", label, elapsed),
        }
    }
}

/// Append-only diagnostics collector owned by a single unit of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Entry>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure.
    pub fn failure(&mut self, failure: Failure) {
        self.entries.push(Entry::Failure(failure));
    }

    /// Record a phase duration.
    pub fn timing(&mut self, label: &'static str, elapsed: Duration) {
        self.entries.push(Entry::Timing { label, elapsed });
    }

    /// All lines, in the order they were recorded.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Recorded failures, in order.
    pub fn failures(&self) -> impl Iterator<Item = &Failure> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Failure(f) => Some(f),
            Entry::Timing { .. } => None,
        })
    }

    /// Number of recorded failures.
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Duration recorded under `label`, if any.
    pub fn timing_of(&self, label: &str) -> Option<Duration> {
        self.entries.iter().find_map(|e| match e {
            Entry::Timing { label: l, elapsed } if *l == label => Some(*elapsed),
            _ => None,
        })
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every line followed by `\n`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for entry in &self.entries {
            writeln!(out, "{}", entry)?;
        }
        Ok(())
    }
}

/// Counters describing one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Frames handed to the submission task.
    pub frames: usize,
    /// Frames written without error.
    pub writes_succeeded: usize,
    /// Replies the collector tried to read.
    pub reads_attempted: usize,
    /// Round trips that ended without any failure.
    pub successes: usize,
}

impl RunStats {
    /// Frames whose write failed.
    pub fn writes_failed(&self) -> usize {
        self.frames - self.writes_succeeded
    }
}

/// Result of a benchmark run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Send-phase diagnostics.
    pub send: Diagnostics,
    /// Receive and confirmation diagnostics.
    pub receive: Diagnostics,
    /// Run counters.
    pub stats: RunStats,
    /// Outcome of the confirmation wait (sync mode only).
    pub completion: Option<Completion>,
}

impl Report {
    /// Total failures across both phases.
    pub fn failure_count(&self) -> usize {
        self.send.failure_count() + self.receive.failure_count()
    }

    /// Write the report: send diagnostics first, then receive diagnostics.
    ///
    /// # Errors
    ///
    /// Returns IO error if the sink fails.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.send.write_to(out)?;
        self.receive.write_to(out)?;
        out.flush()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.send.entries().iter().chain(self.receive.entries()) {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_lines() {
        let write = Failure::Write {
            seq: 3,
            reason: "broken pipe".to_string(),
        };
        assert_eq!(write.to_string(), "FAIL: #3: cannot write message: broken pipe");
        assert_eq!(write.seq(), Some(3));

        let check = Failure::Check {
            seq: 9,
            code: 12,
            log: "invalid signature".to_string(),
        };
        assert_eq!(check.to_string(), "FAIL: #9: failed check: 12: invalid signature");

        let deliver = Failure::Deliver {
            seq: 1,
            code: 4,
            log: "out of gas".to_string(),
        };
        assert_eq!(deliver.to_string(), "FAIL: #1: failed deliver: 4: out of gas");

        let rpc = Failure::Rpc {
            seq: 0,
            error: RpcError {
                code: -32603,
                message: "Internal error".to_string(),
                data: None,
            },
        };
        assert_eq!(
            rpc.to_string(),
            "FAIL: #0: failed response received: code -32603: Internal error"
        );

        let unconfirmed = Failure::Unconfirmed {
            pending: "5".to_string(),
            polls: 40,
        };
        assert_eq!(unconfirmed.seq(), None);
        assert_eq!(
            unconfirmed.to_string(),
            "FAIL: gave up waiting for 5 unconfirmed transactions after 40 polls"
        );
    }

    #[test]
    fn test_timing_line() {
        let entry = Entry::Timing {
            label: "submit work time",
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(entry.to_string(), "submit work time: 1.5s");
    }

    #[test]
    fn test_diagnostics_counts() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());

        diags.failure(Failure::Read {
            seq: 1,
            reason: "eof".to_string(),
        });
        diags.timing("work time", Duration::from_secs(2));

        assert_eq!(diags.failure_count(), 1);
        assert_eq!(diags.entries().len(), 2);
        assert_eq!(diags.timing_of("work time"), Some(Duration::from_secs(2)));
        assert_eq!(diags.timing_of("submit work time"), None);
    }

    #[test]
    fn test_report_order() {
        let mut report = Report::default();
        report.receive.timing("work time", Duration::from_millis(20));
        report.send.failure(Failure::Write {
            seq: 0,
            reason: "closed".to_string(),
        });
        report.send.timing("submit work time", Duration::from_millis(10));

        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "FAIL: #0: cannot write message: closed\nsubmit work time: 10ms\nwork time: 20ms\n"
        );
        assert_eq!(text, report.to_string());
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn test_stats_writes_failed() {
        let stats = RunStats {
            frames: 10,
            writes_succeeded: 8,
            reads_attempted: 8,
            successes: 7,
        };
        assert_eq!(stats.writes_failed(), 2);
    }
}
