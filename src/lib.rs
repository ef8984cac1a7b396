//! # txbench
//!
//! Throughput benchmark for JSON-RPC blockchain nodes.
//!
//! This crate submits a batch of pre-signed transactions to a node over a
//! single websocket connection and reports every failed round trip together
//! with the time each phase took.
//!
//! ## Architecture
//!
//! - **Preparation**: transactions are encoded into finished JSON-RPC frames
//!   before the connection is opened
//! - **Submission task**: writes frames in order and hands sequence numbers
//!   to the collector over a bounded channel
//! - **Collector**: reads and classifies one reply per sent frame
//! - **Completion verifier** (sync mode): polls the node until its mempool
//!   is empty
//!
//! ## Example
//!
//! ```ignore
//! use txbench::{BenchConfig, Benchmark};
//! use txbench::codec::TxReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bench = Benchmark::builder()
//!         .config(BenchConfig::from_env()?)
//!         .build()?;
//!
//!     let frames = bench.prepare(TxReader::new(std::io::stdin().lock()))?;
//!     let report = bench.run(frames).await?;
//!     print!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod collector;
pub mod config;
pub mod error;
pub mod prepare;
pub mod protocol;
pub mod report;
pub mod submit;
pub mod transport;
pub mod verify;

mod bench;

pub use bench::{Benchmark, BenchmarkBuilder, RECEIVE_TIME_LABEL, WORK_TIME_LABEL};
pub use config::BenchConfig;
pub use error::{BenchError, Result};
pub use protocol::SubmitMode;
pub use report::{Diagnostics, Failure, Report, RunStats};
pub use verify::{Completion, CompletionVerifier};
