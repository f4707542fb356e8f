//! Worker pool for peer sessions.
//!
//! This module defines the [`WorkerPool`] struct, which manages the set of
//! session workers. Sessions are distributed round-robin over per-worker
//! bounded MPSC channels, and the pool supports coordinated shutdown via a
//! shared [`CancellationToken`]: once shutdown begins, submissions are
//! refused, live sessions are drained up to a bounded wait, and each worker
//! is asked to stop and acknowledges doing so.

use crate::server::gate::AdmissionGate;
use super::WorkRequest;
use core::time::Duration;
use divvy_core::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

/// Bound on how long shutdown waits for each worker's acknowledgment.
const WORKER_ACK_TIMEOUT: Duration = Duration::from_secs(3);

/// A pool of session workers fed over bounded MPSC channels.
///
/// Dispatch is round-robin; each worker executes one session at a time, so
/// the queue depth of a worker's channel bounds how many admitted sessions
/// can wait behind it.
pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    shutdown_token: CancellationToken,
    drain_timeout: Duration,
    gate: Arc<AdmissionGate>,
}

impl WorkerPool {
    /// Constructs a pool from initialized worker channels, the shared
    /// cancellation token, and the gate whose count is drained at shutdown.
    pub fn new(
        workers: Vec<mpsc::Sender<WorkRequest>>,
        shutdown_token: CancellationToken,
        drain_timeout: Duration,
        gate: Arc<AdmissionGate>,
    ) -> Self {
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            shutdown_token,
            drain_timeout,
            gate,
        }
    }

    /// Index of the next worker to receive work (round-robin, relaxed
    /// atomic increment to minimize contention).
    fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Submits a request to the next worker in round-robin order.
    ///
    /// # Errors
    ///
    /// - [`Error::ServiceShutdown`] once shutdown has begun.
    /// - [`Error::ChannelError`] if the chosen worker's channel is closed.
    pub async fn submit(&self, request: WorkRequest) -> Result<(), Error> {
        if self.shutdown_token.is_cancelled() {
            return Err(Error::ServiceShutdown);
        }

        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        match worker.send(request).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::ChannelError {
                context: format!("Worker {worker_idx} channel closed"),
            }),
        }
    }

    /// Gracefully shuts down the pool.
    ///
    /// - Cancels the shared token so no further submissions are accepted.
    /// - Waits up to the drain timeout for live sessions to reach their
    ///   terminal state (sessions are never interrupted).
    /// - Sends a [`WorkRequest::Shutdown`] to each worker and waits, with a
    ///   bounded timeout per worker, for acknowledgments.
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();

        tracing::info!("Draining live sessions ({} active)", self.gate.active());
        let drain_result = timeout(self.drain_timeout, async {
            while self.gate.active() > 0 {
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        match drain_result {
            Ok(()) => {
                tracing::debug!("All live sessions drained");
            }
            Err(_) => {
                tracing::warn!(
                    "Graceful drain timed out ({} sessions still active)",
                    self.gate.active()
                );
            }
        }

        tracing::debug!("Notifying all session workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.workers.len());

        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            if let Err(e) = worker.send(WorkRequest::Shutdown { response: tx }).await {
                tracing::error!("Failed to send shutdown to worker {i}: {e}");
            } else {
                shutdown_handles.push((i, rx));
            }
        }

        let ack_futures = shutdown_handles.into_iter().map(|(i, rx)| async move {
            match timeout(WORKER_ACK_TIMEOUT, rx).await {
                Ok(Ok(())) => {
                    tracing::trace!("Worker {i} shutdown acknowledged");
                }
                Ok(Err(e)) => {
                    tracing::error!("Worker {i} dropped its shutdown ack: {e}");
                }
                Err(_) => {
                    tracing::warn!("Worker {i} shutdown timed out");
                }
            }
        });

        futures::future::join_all(ack_futures).await;

        tracing::info!("Session worker pool shutdown complete");
    }
}
