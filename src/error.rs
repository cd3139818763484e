// src/error.rs
use thiserror::Error;

/// Failures that end a whole `Batch::run` or `collect` call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("empty batch")]
    EmptyBatch,

    #[error("batch timed out: {collected} of {expected} ranges collected")]
    TimedOut { collected: usize, expected: usize },

    #[error("batch cancelled: {collected} of {expected} ranges collected")]
    Cancelled { collected: usize, expected: usize },

    /// Every worker went away before publishing. Should never happen.
    #[error("result channel closed unexpectedly: {collected} of {expected} ranges collected")]
    UnexpectedClose { collected: usize, expected: usize },

    #[error("failed to spawn batch worker: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::TimedOut { .. })
    }

    /// Number of records that had arrived when the call gave up.
    pub fn collected(&self) -> Option<usize> {
        match self {
            Error::TimedOut { collected, .. }
            | Error::Cancelled { collected, .. }
            | Error::UnexpectedClose { collected, .. } => Some(*collected),
            Error::EmptyBatch | Error::Spawn(_) => None,
        }
    }
}

/// Per-range failure handed to the consumer instead of failing the batch.
#[derive(Debug, Error)]
pub enum ItemError<E> {
    #[error("producer failed: {0}")]
    Producer(E),

    #[error("producer panicked: {0}")]
    Panicked(String),
}

impl<E> ItemError<E> {
    pub fn is_panic(&self) -> bool {
        matches!(self, ItemError::Panicked(_))
    }
}
