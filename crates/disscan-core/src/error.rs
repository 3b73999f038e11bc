use thiserror::Error;

use crate::domain::Identifier;

/// Lifecycle errors surfaced to whoever submits work to the pool.
///
/// Per-item problems (a failed lookup, a timeout, a resolver that blew up)
/// never show up here; those are recorded on the `Record` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Non-blocking submit against a full bounded queue.
    #[error("queue is full")]
    QueueFull,

    /// Submit after `drain` or `cancel` started.
    #[error("pool is closed")]
    Closed,
}

/// Failure to append to a sink destination.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("record {0} has no payload to write")]
    NotSuccess(Identifier),
}

/// Error raised by a resolver for setup or programming problems.
///
/// Ordinary lookup failures are `Resolution::Failed`, not this.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("transport setup failed: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid pool config: {0}")]
    InvalidConfig(String),

    #[error("identifier must not be empty")]
    EmptyIdentifier,

    #[error("record {0} was already resolved")]
    AlreadyResolved(Identifier),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("line source failed: {0}")]
    Io(#[from] std::io::Error),
}
