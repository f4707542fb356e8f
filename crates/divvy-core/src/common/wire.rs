//! # Wire Protocol
//!
//! The coordinator and its peers speak a line-oriented text protocol over a
//! single TCP connection per peer:
//!
//! 1. On refusal the coordinator sends [`DENIAL_LINE`] and closes.
//! 2. On admission the coordinator sends one assignment line, `"<lo> <hi>"`.
//! 3. The peer sends zero or more free-form result lines. The coordinator
//!    does not parse these; they are stored and forwarded verbatim.
//! 4. After each received result line the coordinator replies with
//!    [`ACK_LINE`].
//! 5. The peer closes its write side to signal completion; the coordinator
//!    then closes the connection.
//!
//! The constants in this module are the deployment contract: peers match the
//! denial line and the acknowledgment line textually, so changing either is a
//! protocol break.

use crate::common::error::Result;
use crate::common::types::WorkInterval;

/// Sent (terminated by `\n`) when the admission gate refuses a connection.
pub const DENIAL_LINE: &str = "Connection denied: maximum concurrent connections reached.";

/// Sent (terminated by `\n`) after each result line received from a peer.
pub const ACK_LINE: &str = "200 - received";

/// Default TCP port the coordinator listens on.
pub const DEFAULT_PORT: u16 = 12345;

/// Encodes the assignment message, newline included, ready for a socket
/// write.
pub fn encode_assignment(interval: WorkInterval) -> String {
    format!("{interval}\n")
}

/// Decodes an assignment line received from the coordinator.
///
/// Trailing newlines and surrounding whitespace are ignored.
pub fn decode_assignment(line: &str) -> Result<WorkInterval> {
    line.trim().parse()
}

/// Returns `true` if a received line is the admission-denied notice.
pub fn is_denial(line: &str) -> bool {
    line.trim_end() == DENIAL_LINE
}
