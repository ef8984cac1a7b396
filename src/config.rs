//! Benchmark configuration.
//!
//! Everything has a default, so a run only needs a node address. Values can
//! also come from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TXBENCH_NODE_ADDR` | `node_addr` |
//! | `TXBENCH_MODE` | `mode` (`commit` or `sync`) |
//! | `TXBENCH_POLL_INTERVAL_MS` | `poll_interval` |
//! | `TXBENCH_CONFIRM_TIMEOUT_SECS` | `max_confirm_wait` |

use std::str::FromStr;
use std::time::Duration;

use crate::error::{BenchError, Result};
use crate::protocol::SubmitMode;
use crate::verify::{DEFAULT_MAX_CONFIRM_WAIT, DEFAULT_POLL_INTERVAL};

/// Placeholder node address used when none is configured.
pub const DEFAULT_NODE_ADDR: &str = "https://node.NETWORK.example:443";

/// Default capacity of the handoff channel between the two pipeline units.
pub const DEFAULT_HANDOFF_CAPACITY: usize = 256;

/// Environment variable holding the node address.
pub const ENV_NODE_ADDR: &str = "TXBENCH_NODE_ADDR";
/// Environment variable holding the submission mode.
pub const ENV_MODE: &str = "TXBENCH_MODE";
/// Environment variable holding the poll interval in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "TXBENCH_POLL_INTERVAL_MS";
/// Environment variable holding the confirmation timeout in seconds.
pub const ENV_CONFIRM_TIMEOUT_SECS: &str = "TXBENCH_CONFIRM_TIMEOUT_SECS";

/// Configuration of a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// HTTP(S) address of the node's RPC endpoint.
    pub node_addr: String,
    /// Submission mode.
    pub mode: SubmitMode,
    /// How many sent frames the submission task may run ahead of the collector.
    pub handoff_capacity: usize,
    /// Pause between two pending-count queries (sync mode).
    pub poll_interval: Duration,
    /// Upper bound on the confirmation wait (sync mode).
    pub max_confirm_wait: Duration,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            node_addr: DEFAULT_NODE_ADDR.to_string(),
            mode: SubmitMode::default(),
            handoff_capacity: DEFAULT_HANDOFF_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_confirm_wait: DEFAULT_MAX_CONFIRM_WAIT,
        }
    }
}

impl BenchConfig {
    /// Defaults overridden by the `TXBENCH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `TXBENCH_*` keys.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = get(ENV_NODE_ADDR) {
            config.node_addr = addr.trim().to_string();
        }
        if let Some(mode) = get(ENV_MODE) {
            config.mode = mode.parse()?;
        }
        if let Some(ms) = get(ENV_POLL_INTERVAL_MS) {
            config.poll_interval = Duration::from_millis(parse_number(ENV_POLL_INTERVAL_MS, &ms)?);
        }
        if let Some(secs) = get(ENV_CONFIRM_TIMEOUT_SECS) {
            config.max_confirm_wait =
                Duration::from_secs(parse_number(ENV_CONFIRM_TIMEOUT_SECS, &secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make a run impossible.
    pub fn validate(&self) -> Result<()> {
        if self.node_addr.trim().is_empty() {
            return Err(BenchError::Config("node address is empty".to_string()));
        }
        if self.handoff_capacity == 0 {
            return Err(BenchError::Config(
                "handoff capacity must be at least 1".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(BenchError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BenchError::Config(format!("{} must be a number, got {:?}", key, value)))
}
