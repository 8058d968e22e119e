use std::fmt;

/// Errors reported by queue operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The operation needs at least one element, but the queue has none.
    Empty,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Empty => write!(f, "queue is empty"),
        }
    }
}

impl std::error::Error for QueueError {}
