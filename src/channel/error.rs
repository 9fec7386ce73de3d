use std::time::Duration;

use thiserror::Error;

use super::Message;

/// Errors returned by the channel operations. None of them is fatal for the channel itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The blocking wait was interrupted through the caller's cancel token.
    #[error("operation cancelled")]
    Cancelled,

    /// The first half of a pair went through, the second was cancelled.
    /// The caller still owns the gate and can retry the second half or abort.
    /// `pending` holds the half already received, when there is one to hand back.
    #[error("pair interrupted after its first half")]
    PartialPair { pending: Option<Message> },

    /// A half pair was left dangling by another thread for longer than the stall timeout.
    #[error("{gate} gate held mid-pair by {owner} past the stall timeout")]
    CapacityMisuse { gate: &'static str, owner: String },

    #[error("no message received within {0:?}")]
    Timeout(Duration),

    #[error("invalid queue capacity {0}, must be at least 1")]
    InvalidCapacity(usize),

    #[error("the END sentinel cannot be one half of a pair")]
    SentinelInPair,
}
