use super::WorkRequest;
use tokio::sync::mpsc;

/// Worker task responsible for executing peer sessions.
///
/// Each worker listens on its own MPSC channel and runs at most one
/// [`Session`] to completion before taking the next request. The loop exits
/// on a [`WorkRequest::Shutdown`] message or when the channel closes;
/// whichever session is in flight at that point still runs to its natural
/// terminal state first.
///
/// [`Session`]: crate::server::session::Session
pub async fn worker_loop(worker_id: usize, mut rx: mpsc::Receiver<WorkRequest>) {
    tracing::trace!("Session worker {worker_id} started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Run(session) => {
                tracing::trace!("Worker {worker_id} picked up session for {}", session.peer());
                session.run().await;
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!("Session worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    tracing::error!("Session worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::trace!("Session worker {worker_id} stopped");
}
