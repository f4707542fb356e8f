//! Protocol conformance: one full peer session against a coordinator.
//!
//! The exchange, from the peer's side:
//!
//! 1. Connect and read the first line. The denial line becomes
//!    [`Error::ConnectionDenied`]; anything else must parse as the
//!    assignment.
//! 2. Compute the reference aggregates over the assigned interval.
//! 3. Send one labeled result line per aggregate; after each, read one
//!    acknowledgment line from the coordinator.
//! 4. Close the write side to signal completion and let the coordinator
//!    close the connection.

use crate::compute;
use divvy_core::{Error, Result, WorkInterval, wire};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Everything one session produced, for callers that want to inspect or
/// display it.
#[derive(Debug)]
pub struct PeerReport {
    /// The interval the coordinator assigned.
    pub interval: WorkInterval,
    /// The result lines sent, in order.
    pub results: Vec<String>,
    /// The acknowledgment lines received, one per result line.
    pub acks: Vec<String>,
}

/// Runs one complete peer session against the coordinator at `addr`.
///
/// # Errors
///
/// - [`Error::ConnectionDenied`] if the coordinator's admission gate refused
///   the connection.
/// - [`Error::MalformedAssignment`] if the first line was neither the denial
///   notice nor a parseable interval.
/// - [`Error::ChannelError`] if the coordinator closed the connection
///   mid-exchange.
/// - [`Error::Io`] on connect or socket failures.
pub async fn run(addr: impl ToSocketAddrs) -> Result<PeerReport> {
    let stream = TcpStream::connect(addr).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let first = lines.next_line().await?.ok_or_else(|| Error::ChannelError {
        context: "coordinator closed before sending an assignment".to_string(),
    })?;

    if wire::is_denial(&first) {
        return Err(Error::ConnectionDenied);
    }

    let interval = wire::decode_assignment(&first)?;
    tracing::info!("Received interval: {interval}");

    let sum_evens = compute::sum_of_evens(interval);
    let sum_odds = compute::sum_of_odds(interval);
    let pi = compute::leibniz_pi(interval);

    let results = vec![
        format!("Sum of even numbers: {sum_evens}"),
        format!("Sum of odd numbers: {sum_odds}"),
        format!("Leibniz PI estimate: {pi}"),
    ];

    let mut acks = Vec::with_capacity(results.len());
    for line in &results {
        write_half.write_all(format!("{line}\n").as_bytes()).await?;

        let ack = lines.next_line().await?.ok_or_else(|| Error::ChannelError {
            context: "coordinator closed before acknowledging a result".to_string(),
        })?;
        acks.push(ack);
    }

    // Closing the write side tells the coordinator we are done; it closes
    // the connection in response.
    write_half.shutdown().await?;

    Ok(PeerReport {
        interval,
        results,
        acks,
    })
}
