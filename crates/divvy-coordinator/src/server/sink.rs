//! Log and connection sinks.
//!
//! Worker tasks and the accept loop produce events that a single external
//! consumer observes. The sinks are cloneable handles over unbounded
//! channels, so emission never blocks a session or the accept loop and the
//! core never assumes a single-threaded consumer. The binary forwards both
//! streams to `tracing`; tests hold the receivers directly.

use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Append-only sink for coordinator log lines (listening announcements,
/// denial notices, per-session result blocks, errors).
#[derive(Clone)]
pub struct LogSink {
    tx: mpsc::UnboundedSender<String>,
}

impl LogSink {
    /// Creates a sink and the receiver its consumer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emits one log line. A departed consumer is ignored; losing log lines
    /// must never take a session down.
    pub fn emit(&self, line: impl Into<String>) {
        let _ = self.tx.send(line.into());
    }
}

/// Sink notified once per admitted (never refused) connection.
#[derive(Clone)]
pub struct ConnectionSink {
    tx: mpsc::UnboundedSender<SocketAddr>,
}

impl ConnectionSink {
    /// Creates a sink and the receiver its consumer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SocketAddr>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Records one admitted connection.
    pub fn emit(&self, addr: SocketAddr) {
        let _ = self.tx.send(addr);
    }
}

/// Spawns consumer tasks that forward both event streams to `tracing`.
///
/// This is the binary's default consumer; alternative frontends build their
/// own via [`LogSink::channel`]/[`ConnectionSink::channel`].
pub fn spawn_tracing_sinks() -> (LogSink, ConnectionSink) {
    let (log, mut log_rx) = LogSink::channel();
    tokio::spawn(async move {
        while let Some(line) = log_rx.recv().await {
            tracing::info!(target: "divvy::coordinator", "{line}");
        }
    });

    let (connections, mut conn_rx) = ConnectionSink::channel();
    tokio::spawn(async move {
        while let Some(addr) = conn_rx.recv().await {
            tracing::info!(target: "divvy::connections", "New connection from: {addr}");
        }
    });

    (log, connections)
}
