//! Runtime configuration for the `divvy-coordinator` binary.
//!
//! All values are parsed from CLI arguments or environment variables, with
//! defaults matching the reference deployment. Each field is independently
//! tunable, allowing the same binary to serve a laptop demo or a lab-scale
//! load test.

use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use divvy_core::wire::DEFAULT_PORT;

use crate::server::allocator::DEFAULT_INTERVAL_MAX;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "divvy-coordinator",
    version,
    about = "A TCP coordinator distributing unique numeric work intervals to peers"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Port 0 binds an ephemeral port, published on the coordinator's
    /// bound-address watch channel.
    ///
    /// Environment variable: `BIND_ADDR`
    #[arg(long, env = "BIND_ADDR", default_value_t = format!("127.0.0.1:{DEFAULT_PORT}"))]
    pub bind_addr: String,

    /// Maximum number of concurrently open peer sessions.
    ///
    /// Connections beyond the cap receive the protocol's denial line and are
    /// closed without being assigned a work interval.
    ///
    /// Environment variable: `MAX_CONNECTIONS`
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: usize,

    /// Number of worker tasks executing peer sessions.
    ///
    /// Each worker runs one session to completion before taking the next.
    /// Defaults to the available CPU parallelism.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = default_num_workers())]
    pub num_workers: usize,

    /// Inclusive upper bound for drawn work intervals.
    ///
    /// Every issued interval is `(0, hi)` with `hi` drawn uniformly from
    /// `[1, interval-max]`.
    ///
    /// Environment variable: `INTERVAL_MAX`
    #[arg(long, env = "INTERVAL_MAX", default_value_t = DEFAULT_INTERVAL_MAX)]
    pub interval_max: u64,

    /// Queue depth of each worker's session channel.
    ///
    /// Bounds how many admitted sessions can wait behind one busy worker
    /// before the accept loop awaits a slot.
    ///
    /// Environment variable: `SESSION_BUFFER_SIZE`
    #[arg(long, env = "SESSION_BUFFER_SIZE", default_value_t = 8)]
    pub session_buffer_size: usize,

    /// Milliseconds to wait before retrying a bind that failed with
    /// address-already-in-use.
    ///
    /// Environment variable: `BIND_BACKOFF_MS`
    #[arg(long, env = "BIND_BACKOFF_MS", default_value_t = 5_000)]
    pub bind_backoff_ms: u64,

    /// Seconds to wait for live sessions to finish during shutdown.
    ///
    /// Sessions are never interrupted; past this bound shutdown proceeds and
    /// stragglers finish on their own.
    ///
    /// Environment variable: `DRAIN_TIMEOUT_SECS`
    #[arg(long, env = "DRAIN_TIMEOUT_SECS", default_value_t = 3)]
    pub drain_timeout_secs: u64,

    /// Optional per-read timeout, in seconds, for peer sessions.
    ///
    /// Unset by default: a connected peer that never sends data holds its
    /// session slot indefinitely.
    ///
    /// Environment variable: `READ_TIMEOUT_SECS`
    #[arg(long, env = "READ_TIMEOUT_SECS")]
    pub read_timeout_secs: Option<u64>,
}

/// Worker-count default: the host's available parallelism.
pub fn default_num_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_connections: usize,
    pub num_workers: usize,
    pub interval_max: u64,
    pub session_buffer_size: usize,
    pub bind_backoff: Duration,
    pub drain_timeout: Duration,
    pub read_timeout: Option<Duration>,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_connections == 0 {
            bail!("MAX_CONNECTIONS must be greater than 0");
        }

        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.interval_max == 0 {
            bail!("INTERVAL_MAX must be greater than 0");
        }

        if args.session_buffer_size == 0 {
            bail!("SESSION_BUFFER_SIZE must be greater than 0");
        }

        Ok(Self {
            bind_addr: args.bind_addr,
            max_connections: args.max_connections,
            num_workers: args.num_workers,
            interval_max: args.interval_max,
            session_buffer_size: args.session_buffer_size,
            bind_backoff: Duration::from_millis(args.bind_backoff_ms),
            drain_timeout: Duration::from_secs(args.drain_timeout_secs),
            read_timeout: args.read_timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("divvy-coordinator").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_produce_a_valid_config() {
        let config = ServerConfig::try_from(args(&[])).unwrap();
        assert_eq!(config.bind_addr, format!("127.0.0.1:{DEFAULT_PORT}"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.interval_max, DEFAULT_INTERVAL_MAX);
        assert_eq!(config.bind_backoff, Duration::from_secs(5));
        assert!(config.read_timeout.is_none());
        assert!(config.num_workers >= 1);
    }

    #[test]
    fn zero_valued_limits_are_rejected() {
        for argv in [
            &["--max-connections", "0"],
            &["--num-workers", "0"],
            &["--interval-max", "0"],
            &["--session-buffer-size", "0"],
        ] {
            assert!(ServerConfig::try_from(args(argv)).is_err(), "{argv:?}");
        }
    }

    #[test]
    fn read_timeout_is_converted_to_a_duration() {
        let config = ServerConfig::try_from(args(&["--read-timeout-secs", "30"])).unwrap();
        assert_eq!(config.read_timeout, Some(Duration::from_secs(30)));
    }
}
