//! Per-connection session handling.
//!
//! A [`Session`] owns one admitted connection end-to-end: it sends the
//! assigned work interval as the first protocol line, collects the result
//! lines the peer returns (acknowledging each), and on any terminal path
//! emits the accumulated results to the log sink as a single labeled block
//! before the socket closes.
//!
//! Failure semantics: every I/O error is handled at this boundary. A write
//! failure (assignment or acknowledgment) is logged and the session proceeds
//! straight to teardown; the peer is assumed gone. A read returning no data
//! is the normal end of collection, not an error. Nothing here can unwind
//! into the accept loop.

use crate::server::gate::AdmissionPermit;
use crate::server::sink::LogSink;
use core::time::Duration;
use divvy_core::{WorkInterval, wire};
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;

/// One admitted peer connection, from work assignment to close.
///
/// The session exclusively owns its socket and result buffer; the admission
/// permit travels with it so the gate slot is released exactly when the
/// session reaches its terminal state, on every path.
pub struct Session {
    stream: TcpStream,
    peer: SocketAddr,
    interval: WorkInterval,
    log: LogSink,
    read_timeout: Option<Duration>,
    _permit: AdmissionPermit,
}

impl Session {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        interval: WorkInterval,
        log: LogSink,
        read_timeout: Option<Duration>,
        permit: AdmissionPermit,
    ) -> Self {
        Self {
            stream,
            peer,
            interval,
            log,
            read_timeout,
            _permit: permit,
        }
    }

    /// Address of the remote peer.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Runs the session to its terminal state.
    ///
    /// Terminal on normal end-of-stream, on a read/write error, or on peer
    /// disconnect mid-stream; the connection is closed unconditionally when
    /// this returns and the admission slot is released.
    pub async fn run(self) {
        let Self {
            stream,
            peer,
            interval,
            log,
            read_timeout,
            _permit,
        } = self;

        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();
        let mut results: Vec<String> = Vec::new();

        let assignment = wire::encode_assignment(interval);
        match write_half.write_all(assignment.as_bytes()).await {
            Ok(()) => {
                tracing::debug!("Assigned interval {interval} to {peer}");

                loop {
                    match next_line(&mut lines, read_timeout).await {
                        Ok(Some(line)) => {
                            results.push(line);
                            let ack = format!("{}\n", wire::ACK_LINE);
                            if let Err(e) = write_half.write_all(ack.as_bytes()).await {
                                log.emit(format!(
                                    "Failed to acknowledge result from {peer}: {e}"
                                ));
                                break;
                            }
                        }
                        // End-of-stream: the peer is done sending.
                        Ok(None) => break,
                        Err(e) => {
                            log.emit(format!("Read error from {peer}: {e}"));
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                log.emit(format!("Failed to send assignment to {peer}: {e}"));
            }
        }

        let mut block = format!("Results received from peer {peer}:");
        for line in &results {
            block.push('\n');
            block.push_str(line);
        }
        log.emit(block);
        // Both socket halves drop here, closing the connection.
    }
}

/// Reads the next line, bounded by the configured read timeout when one is
/// set. A timeout surfaces as an I/O error so the caller tears down like any
/// other read failure.
async fn next_line(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
    read_timeout: Option<Duration>,
) -> io::Result<Option<String>> {
    match read_timeout {
        Some(limit) => match tokio::time::timeout(limit, lines.next_line()).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("peer idle for more than {limit:?}"),
            )),
        },
        None => lines.next_line().await,
    }
}
