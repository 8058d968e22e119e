use crate::error::QueueError;

/// A min-priority queue of distinct keys, each associated with an extrinsic priority.
///
/// This is the contract consumed by frontier-based graph search: nodes are added or relaxed
/// with [`MinQueue::add_or_update`] and finalized in order of increasing priority with
/// [`MinQueue::remove_min`].
pub trait MinQueue<K, P> {
    /// Returns whether the queue contains no elements.
    fn is_empty(&self) -> bool;

    /// Returns the number of elements in the queue.
    fn len(&self) -> usize;

    /// Returns a key associated with the smallest priority.
    /// This is the key the next call to [`MinQueue::remove_min`] would return.
    fn peek_min(&self) -> Result<&K, QueueError>;

    /// Returns the smallest priority in the queue.
    fn peek_min_priority(&self) -> Result<&P, QueueError>;

    /// Adds `key` with `priority`, or changes the priority of `key` if it is already queued.
    fn add_or_update(&mut self, key: K, priority: P);

    /// Removes and returns a key associated with the smallest priority.
    /// Ties are broken arbitrarily.
    fn remove_min(&mut self) -> Result<K, QueueError>;

    /// Removes all elements.
    fn clear(&mut self);

    /// Verifies the internal invariants of the queue.
    /// Implementations without checkable internal structure accept unconditionally.
    fn check_invariants(&self) -> Result<(), String> {
        Ok(())
    }
}
