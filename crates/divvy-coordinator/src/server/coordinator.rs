//! The listening coordinator.
//!
//! Owns the listening socket and the session worker pool. The listener moves
//! through Starting (bind + listen) → Serving (accept loop) and, on a
//! transient address-in-use failure, Backoff → Starting again. Any other
//! listener-level error is fatal: it is logged and propagated to the caller.
//! Per-connection failures never end the accept loop.
//!
//! On each accepted connection the admission gate is consulted first. A
//! refused connection receives the fixed denial line and is closed without
//! touching the allocator, the connection sink, or the session count. An
//! admitted connection gets a freshly allocated interval and its session is
//! dispatched onto the worker pool, carrying the admission permit so the
//! slot is released exactly at the session's terminal state.

use crate::server::{
    allocator::IntervalAllocator,
    config::ServerConfig,
    gate::AdmissionGate,
    pool::{WorkRequest, manager::WorkerPool, worker::worker_loop},
    session::Session,
    sink::{ConnectionSink, LogSink},
};
use divvy_core::{Error, Result, wire};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Outcome of one pass through the accept loop.
enum ServeExit {
    /// `stop()` was observed; do not rebind.
    Stopped,
    /// Listener-level failure; do not rebind.
    Fatal(Error),
}

/// Accepts peer connections and dispatches admitted sessions.
///
/// One coordinator instance owns all process-wide dispatch state (the
/// allocation registry and the admission count) for its lifetime; a fresh
/// instance is expected per run, and `start` after `stop` is not supported.
pub struct Coordinator {
    config: ServerConfig,
    allocator: Arc<IntervalAllocator>,
    gate: Arc<AdmissionGate>,
    pool: Arc<WorkerPool>,
    log: LogSink,
    connections: ConnectionSink,
    shutdown_token: CancellationToken,
    bound_addr: watch::Sender<Option<SocketAddr>>,
}

impl Coordinator {
    /// Creates the coordinator and spawns its session workers.
    pub fn new(config: ServerConfig, log: LogSink, connections: ConnectionSink) -> Self {
        let allocator = Arc::new(IntervalAllocator::new(config.interval_max));
        let gate = AdmissionGate::new(config.max_connections);
        let shutdown_token = CancellationToken::new();

        let mut workers = Vec::with_capacity(config.num_workers);
        for worker_id in 0..config.num_workers {
            // The channel depth bounds how many admitted sessions may queue
            // behind a busy worker before the accept loop awaits a slot. The
            // admission gate already bounds the number of live sessions, so
            // this only matters when max_connections exceeds the pool size.
            let (tx, rx) = mpsc::channel(config.session_buffer_size);
            workers.push(tx);
            tokio::spawn(worker_loop(worker_id, rx));
        }

        let pool = Arc::new(WorkerPool::new(
            workers,
            shutdown_token.clone(),
            config.drain_timeout,
            Arc::clone(&gate),
        ));

        let (bound_addr, _) = watch::channel(None);

        Self {
            config,
            allocator,
            gate,
            pool,
            log,
            connections,
            shutdown_token,
            bound_addr,
        }
    }

    /// Watches the address the listener is currently bound to.
    ///
    /// Holds `None` until the Starting state succeeds; with a port-0 bind
    /// this is how callers learn the ephemeral port.
    pub fn bound_addr(&self) -> watch::Receiver<Option<SocketAddr>> {
        self.bound_addr.subscribe()
    }

    /// The interval allocator (observability: issued/call counts).
    pub fn allocator(&self) -> &Arc<IntervalAllocator> {
        &self.allocator
    }

    /// The admission gate (observability: live session count).
    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    /// Runs the listener until `stop()` or a fatal listener error.
    ///
    /// A bind conflict (`AddrInUse`) is transient: it is logged and retried
    /// after the configured backoff. Every other bind or accept failure at
    /// the listener level is fatal and returned to the caller after logging.
    pub async fn run(&self) -> Result<()> {
        let result = self.bind_and_serve().await;
        self.log.emit("Coordinator stopped.");
        result
    }

    /// Signals the accept loop to exit and shuts down the worker pool.
    ///
    /// In-flight sessions are not interrupted; they run to their natural
    /// terminal state and release their slots independently.
    pub async fn stop(&self) {
        self.log.emit("Coordinator stopping...");
        self.shutdown_token.cancel();
        self.pool.shutdown().await;
    }

    async fn bind_and_serve(&self) -> Result<()> {
        loop {
            if self.shutdown_token.is_cancelled() {
                return Ok(());
            }

            let listener = match self.bind() {
                Ok(listener) => listener,
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                    self.log.emit(format!(
                        "Address and port already in use. Retrying in {:?}...",
                        self.config.bind_backoff
                    ));
                    tokio::select! {
                        () = self.shutdown_token.cancelled() => return Ok(()),
                        () = sleep(self.config.bind_backoff) => continue,
                    }
                }
                Err(e) => {
                    self.log.emit(format!("Coordinator error: {e}"));
                    return Err(e.into());
                }
            };

            let local_addr = listener.local_addr().map_err(Error::from)?;
            self.bound_addr.send_replace(Some(local_addr));
            self.log
                .emit(format!("Listening on {local_addr}. Waiting for peers..."));

            match self.serve(listener).await {
                ServeExit::Stopped => return Ok(()),
                ServeExit::Fatal(e) => {
                    self.log.emit(format!("Coordinator error: {e}"));
                    return Err(e);
                }
            }
        }
    }

    fn bind(&self) -> io::Result<TcpListener> {
        let addr: SocketAddr = self
            .config
            .bind_addr
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        socket.listen(1024)
    }

    async fn serve(&self, listener: TcpListener) -> ServeExit {
        loop {
            let (stream, addr) = tokio::select! {
                () = self.shutdown_token.cancelled() => return ServeExit::Stopped,
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) if is_transient_accept_error(&e) => {
                        tracing::debug!("Transient accept error: {e}");
                        continue;
                    }
                    Err(e) => return ServeExit::Fatal(e.into()),
                },
            };

            if let Err(e) = self.admit(stream, addr).await {
                // The pool refuses work only once it is gone or shutting
                // down; either way the listener has nothing left to serve.
                return match e {
                    Error::ServiceShutdown => ServeExit::Stopped,
                    other => ServeExit::Fatal(other),
                };
            }
        }
    }

    /// Applies the admission protocol to one accepted connection.
    ///
    /// The refusal path must not consume an allocator draw, touch the
    /// session count, or notify the connection sink.
    async fn admit(&self, mut stream: TcpStream, addr: SocketAddr) -> Result<()> {
        let Some(permit) = self.gate.try_admit() else {
            self.log
                .emit("Maximum concurrent connections reached. Denying new connection.");
            let denial = format!("{}\n", wire::DENIAL_LINE);
            if let Err(e) = stream.write_all(denial.as_bytes()).await {
                self.log
                    .emit(format!("Failed to send denial notice to {addr}: {e}"));
            }
            let _ = stream.shutdown().await;
            return Ok(());
        };

        let interval = self.allocator.allocate();
        let session = Session::new(
            stream,
            addr,
            interval,
            self.log.clone(),
            self.config.read_timeout,
            permit,
        );

        match self.pool.submit(WorkRequest::Run(session)).await {
            Ok(()) => {
                self.connections.emit(addr);
                Ok(())
            }
            Err(e) => {
                // Dropping the session closes the socket and releases the
                // admission slot through the permit.
                self.log
                    .emit(format!("Failed to dispatch session for {addr}: {e}"));
                Err(e)
            }
        }
    }
}

/// Accept failures that affect a single connection, not the listener.
fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
    )
}
