pub mod manager;
pub mod worker;

use crate::server::session::Session;
use tokio::sync::oneshot;

/// A unit of work submitted to the session worker pool.
pub enum WorkRequest {
    /// Run one admitted peer session to completion.
    Run(Session),
    /// Stop the worker once in-flight work finishes, acknowledging on the
    /// provided channel.
    Shutdown { response: oneshot::Sender<()> },
}
