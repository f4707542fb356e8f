//! Error types shared across the work-dispatch system.
//!
//! This module defines the central `Error` enum, which captures the
//! recoverable and reportable error cases on both sides of the wire. The
//! coordinator logs these at the session boundary; the peer surfaces them to
//! its caller.
//!
//! ## Error Cases
//! - `ChannelError`: An internal communication failure between tasks or
//!   workers.
//! - `ConnectionDenied`: The coordinator refused the connection because its
//!   concurrent-session cap was reached.
//! - `MalformedAssignment`: The assignment line could not be parsed as a work
//!   interval.
//! - `ServiceShutdown`: Work arrived while the coordinator was shutting down.
//! - `Io`: An underlying socket read/write/bind failure.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the work-dispatch system.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Internal channel send/receive failure (e.g., closed or full channel).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The coordinator refused the connection at the admission gate.
    #[error("Connection denied: maximum concurrent connections reached")]
    ConnectionDenied,

    /// The assignment line was not two space-separated decimal integers, or
    /// the bounds were inverted.
    #[error("Malformed assignment line: {line:?}")]
    MalformedAssignment { line: String },

    /// The coordinator is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// Underlying socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
