//! Submit - benchmark a node with transactions read from stdin.
//!
//! Input is a stream of binary transactions, each prefixed with its length
//! as a big-endian `u32`. The report goes to stdout, logs go to stderr.
//!
//! # Running
//!
//! ```sh
//! TXBENCH_NODE_ADDR=http://127.0.0.1:26657 TXBENCH_MODE=sync RUST_LOG=txbench=debug \
//!     cargo run --example submit < signed_txs.bin
//! ```

use std::io;

use tracing_subscriber::EnvFilter;
use txbench::codec::TxReader;
use txbench::{BenchConfig, Benchmark};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let bench = Benchmark::builder()
        .config(BenchConfig::from_env()?)
        .build()?;

    // Everything is encoded before the connection opens.
    let frames = bench.prepare(TxReader::new(io::stdin().lock()))?;

    let report = bench.run(frames).await?;
    report.write_to(&mut io::stdout().lock())?;

    if report.failure_count() > 0 {
        std::process::exit(1);
    }
    Ok(())
}
