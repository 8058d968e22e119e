use std::{collections::HashMap, hash::Hash};

use crate::{error::QueueError, min_queue::MinQueue};

/// A key paired with its priority. Owned exclusively by the heap.
#[derive(Debug, Clone)]
struct Entry<K, P> {
    key: K,
    priority: P,
}

/// A binary min-heap of distinct keys that allows efficient updates of priorities by key.
///
/// The heap array is the arena of entries, `key_to_heap_idx` tracks the slot of every key.
/// Both are kept in lockstep by [`IndexedMinQueue::swap`], so the slot of any queued key can be
/// looked up in O(1) and its priority changed in O(log n).
///
/// It is a logic error to modify a key in a way that changes its hash or equality while it is
/// in the queue.
///
/// # Examples
///
/// ```
/// use frontier_queue::IndexedMinQueue;
///
/// let mut queue = IndexedMinQueue::new();
/// queue.add_or_update("a", 5);
/// queue.add_or_update("b", 3);
/// queue.add_or_update("a", 1);
///
/// assert_eq!(queue.remove_min(), Ok("a"));
/// assert_eq!(queue.remove_min(), Ok("b"));
/// assert!(queue.remove_min().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct IndexedMinQueue<K, P> {
    /// The array representation of the heap.
    /// Satisfies `heap[i].priority >= heap[parent_of(i)].priority` for every `i > 0`.
    heap: Vec<Entry<K, P>>,
    /// Mapping from key to its index in the heap. Holds exactly the keys in `heap`.
    key_to_heap_idx: HashMap<K, usize>,
}

impl<K, P> IndexedMinQueue<K, P> {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        IndexedMinQueue {
            heap: Vec::new(),
            key_to_heap_idx: HashMap::new(),
        }
    }

    /// Creates a new empty queue with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        IndexedMinQueue {
            heap: Vec::with_capacity(capacity),
            key_to_heap_idx: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns a key associated with the smallest priority.
    pub fn peek_min(&self) -> Result<&K, QueueError> {
        self.heap.first().map(|e| &e.key).ok_or(QueueError::Empty)
    }

    /// Returns the smallest priority in the queue.
    pub fn peek_min_priority(&self) -> Result<&P, QueueError> {
        self.heap.first().map(|e| &e.priority).ok_or(QueueError::Empty)
    }

    /// Removes all keys.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.key_to_heap_idx.clear();
    }

    /// Iterates over all queued keys and their priorities in heap order (not sorted).
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &P)> {
        self.heap.iter().map(|e| (&e.key, &e.priority))
    }

    #[inline(always)]
    fn parent_of(idx: usize) -> usize {
        (idx - 1) >> 1
    }

    #[inline(always)]
    fn left_child_of(idx: usize) -> usize {
        (idx << 1) + 1
    }
}

impl<K: Hash + Eq + Clone, P: Ord> IndexedMinQueue<K, P> {
    /// Checks whether `key` is in the queue.
    pub fn contains(&self, key: &K) -> bool {
        self.key_to_heap_idx.contains_key(key)
    }

    /// Returns the current priority of `key`, if it is queued.
    pub fn priority_of(&self, key: &K) -> Option<&P> {
        self.key_to_heap_idx
            .get(key)
            .map(|&idx| &self.heap[idx].priority)
    }

    /// Adds `key` with `priority` if it is not queued yet, otherwise changes its priority.
    pub fn add_or_update(&mut self, key: K, priority: P) {
        match self.key_to_heap_idx.get(&key) {
            Some(&idx) => self.update_at(idx, priority),
            None => self.insert(key, priority),
        }
    }

    /// Removes and returns a key associated with the smallest priority.
    pub fn remove_min(&mut self) -> Result<K, QueueError> {
        self.remove_min_entry().map(|(key, _)| key)
    }

    /// Removes and returns a key associated with the smallest priority, together with that
    /// priority.
    pub fn remove_min_entry(&mut self) -> Result<(K, P), QueueError> {
        if self.heap.is_empty() {
            return Err(QueueError::Empty);
        }

        // Moves the last entry to the root
        let root = self.heap.swap_remove(0);
        self.key_to_heap_idx.remove(&root.key);

        if !self.heap.is_empty() {
            self.record_slot(0);
            self.sift_down(0);
        }

        Ok((root.key, root.priority))
    }

    /// Verifies heap order and that the index maps every key to its slot.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.key_to_heap_idx.len() != self.heap.len() {
            return Err(format!(
                "Index holds {} keys, but the heap holds {} entries.",
                self.key_to_heap_idx.len(),
                self.heap.len()
            ));
        }

        for (idx, entry) in self.heap.iter().enumerate() {
            if idx > 0 {
                let parent_idx = Self::parent_of(idx);
                if entry.priority < self.heap[parent_idx].priority {
                    return Err(format!(
                        "Heap order violated: slot {} has a smaller priority than its parent {}.",
                        idx, parent_idx
                    ));
                }
            }

            match self.key_to_heap_idx.get(&entry.key) {
                Some(&indexed) if indexed == idx => {}
                Some(&indexed) => {
                    return Err(format!(
                        "Key in slot {} is indexed at slot {}.",
                        idx, indexed
                    ));
                }
                None => return Err(format!("Key in slot {} is missing from the index.", idx)),
            }
        }

        Ok(())
    }

    fn insert(&mut self, key: K, priority: P) {
        debug_assert!(!self.contains(&key));

        let idx = self.heap.len();
        self.key_to_heap_idx.insert(key.clone(), idx);
        self.heap.push(Entry { key, priority });
        self.sift_up(idx);
    }

    fn update_at(&mut self, idx: usize, priority: P) {
        let old = std::mem::replace(&mut self.heap[idx].priority, priority);

        // A decrease can only break the order towards the ancestors, an increase only towards
        // the descendants.
        if self.heap[idx].priority <= old {
            self.sift_up(idx);
        } else {
            self.sift_down(idx);
        }
    }

    /// Moves the entry at `idx` up until its parent is not larger.
    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent_idx = Self::parent_of(idx);
            if self.heap[idx].priority >= self.heap[parent_idx].priority {
                break;
            }
            self.swap(idx, parent_idx);
            idx = parent_idx;
        }
    }

    /// Moves the entry at `idx` down until no child is smaller.
    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let left = Self::left_child_of(idx);
            if left >= self.heap.len() {
                break; // No children
            }
            let right = left + 1;

            // Left wins ties between equal children
            let mut min_child_idx = left;
            if right < self.heap.len() && self.heap[right].priority < self.heap[left].priority {
                min_child_idx = right;
            }

            if self.heap[min_child_idx].priority >= self.heap[idx].priority {
                break;
            }
            self.swap(idx, min_child_idx);
            idx = min_child_idx;
        }
    }

    /// Swaps the entries in slots `i` and `j` and updates the index for both.
    #[inline]
    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.record_slot(i);
        self.record_slot(j);
    }

    /// Points the index entry of the key in slot `idx` at `idx`.
    #[inline]
    fn record_slot(&mut self, idx: usize) {
        let slot = self.key_to_heap_idx.get_mut(&self.heap[idx].key);
        debug_assert!(slot.is_some(), "Key in slot {} is missing from the index.", idx);
        if let Some(slot) = slot {
            *slot = idx;
        }
    }
}

impl<K, P> Default for IndexedMinQueue<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone, P: Ord> Extend<(K, P)> for IndexedMinQueue<K, P> {
    fn extend<I: IntoIterator<Item = (K, P)>>(&mut self, iter: I) {
        for (key, priority) in iter {
            self.add_or_update(key, priority);
        }
    }
}

impl<K: Hash + Eq + Clone, P: Ord> FromIterator<(K, P)> for IndexedMinQueue<K, P> {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut queue = Self::with_capacity(iter.size_hint().0);
        queue.extend(iter);
        queue
    }
}

impl<K: Hash + Eq + Clone, P: Ord> MinQueue<K, P> for IndexedMinQueue<K, P> {
    fn is_empty(&self) -> bool {
        IndexedMinQueue::is_empty(self)
    }

    fn len(&self) -> usize {
        IndexedMinQueue::len(self)
    }

    fn peek_min(&self) -> Result<&K, QueueError> {
        IndexedMinQueue::peek_min(self)
    }

    fn peek_min_priority(&self) -> Result<&P, QueueError> {
        IndexedMinQueue::peek_min_priority(self)
    }

    fn add_or_update(&mut self, key: K, priority: P) {
        IndexedMinQueue::add_or_update(self, key, priority)
    }

    fn remove_min(&mut self) -> Result<K, QueueError> {
        IndexedMinQueue::remove_min(self)
    }

    fn clear(&mut self) {
        IndexedMinQueue::clear(self)
    }

    fn check_invariants(&self) -> Result<(), String> {
        IndexedMinQueue::check_invariants(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_of(pairs: &[(&'static str, i32)]) -> IndexedMinQueue<&'static str, i32> {
        pairs.iter().copied().collect()
    }

    fn assert_empty(queue: &mut IndexedMinQueue<&'static str, i32>) {
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.peek_min(), Err(QueueError::Empty));
        assert_eq!(queue.peek_min_priority(), Err(QueueError::Empty));
        assert_eq!(queue.remove_min(), Err(QueueError::Empty));
        assert_eq!(queue.check_invariants(), Ok(()));
    }

    #[test]
    fn test_new_is_empty() {
        let mut queue = IndexedMinQueue::new();
        assert_empty(&mut queue);
    }

    #[test]
    fn test_clear() {
        let mut queue = queue_of(&[("a", 5), ("b", 3), ("c", 8)]);
        queue.clear();
        assert_empty(&mut queue);

        // Usable again after clearing
        queue.add_or_update("a", 1);
        assert_eq!(queue.peek_min(), Ok(&"a"));
    }

    #[test]
    fn test_peek_and_remove_min() {
        let mut queue = queue_of(&[("a", 5), ("b", 3), ("c", 8)]);
        assert_eq!(queue.peek_min(), Ok(&"b"));
        assert_eq!(queue.peek_min_priority(), Ok(&3));

        assert_eq!(queue.remove_min(), Ok("b"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek_min(), Ok(&"a"));
        assert!(!queue.contains(&"b"));
    }

    #[test]
    fn test_decrease_then_increase() {
        let mut queue = IndexedMinQueue::new();
        queue.add_or_update("a", 5);
        queue.add_or_update("a", 1);
        assert_eq!(queue.peek_min(), Ok(&"a"));
        assert_eq!(queue.len(), 1);

        queue.add_or_update("b", 10);
        queue.add_or_update("a", 20);
        assert_eq!(queue.peek_min(), Ok(&"b"));
        assert_eq!(queue.priority_of(&"a"), Some(&20));
    }

    #[test]
    fn test_reverse_priorities() {
        let mut queue = IndexedMinQueue::new();
        for i in 1..=100 {
            queue.add_or_update(i, 101 - i);
        }

        let removed: Vec<i32> = (0..100).map(|_| queue.remove_min().unwrap()).collect();
        let expected: Vec<i32> = (1..=100).rev().collect();
        assert_eq!(removed, expected);
        assert!(queue.is_empty());
    }

    /// Every insert bubbles to the root; stays fast in unoptimized builds.
    #[test]
    fn test_large_descending_insert_then_drain() {
        let n = 200_000u32;
        let mut queue = IndexedMinQueue::with_capacity(n as usize);
        for key in 0..n {
            queue.add_or_update(key, n - key);
        }
        assert_eq!(queue.len(), n as usize);
        assert_eq!(queue.check_invariants(), Ok(()));

        let mut last = 0;
        while let Ok((_, priority)) = queue.remove_min_entry() {
            assert!(priority >= last);
            last = priority;
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_same_priority_update_is_noop() {
        let mut queue = queue_of(&[("a", 4), ("b", 2), ("c", 7), ("d", 2)]);
        let min_before = *queue.peek_min_priority().unwrap();

        queue.add_or_update("c", 7);
        queue.add_or_update("c", 7);

        assert_eq!(queue.len(), 4);
        assert_eq!(queue.peek_min_priority(), Ok(&min_before));
        for key in ["a", "b", "c", "d"] {
            assert!(queue.contains(&key));
        }
        assert_eq!(queue.check_invariants(), Ok(()));
    }

    #[test]
    fn test_duplicate_priorities_extract_sorted() {
        let mut queue = queue_of(&[("a", 3), ("b", 1), ("c", 3), ("d", 1), ("e", 2), ("f", 3)]);

        let mut priorities = Vec::new();
        while let Ok((_, priority)) = queue.remove_min_entry() {
            priorities.push(priority);
        }
        assert_eq!(priorities, vec![1, 1, 2, 3, 3, 3]);
    }

    #[test]
    fn test_from_iter_later_pairs_win() {
        let queue = queue_of(&[("a", 5), ("b", 3), ("a", 1)]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.priority_of(&"a"), Some(&1));
        assert_eq!(queue.peek_min(), Ok(&"a"));
    }

    #[test]
    fn test_iter_visits_every_entry() {
        let queue = queue_of(&[("a", 5), ("b", 3), ("c", 8)]);
        let mut entries: Vec<_> = queue.iter().map(|(&k, &p)| (k, p)).collect();
        entries.sort();
        assert_eq!(entries, vec![("a", 5), ("b", 3), ("c", 8)]);
    }

    #[test]
    fn test_check_invariants_detects_broken_order() {
        let mut queue = queue_of(&[("a", 1), ("b", 2)]);
        queue.heap[0].priority = 3;
        assert!(queue.check_invariants().is_err());
    }

    #[test]
    fn test_check_invariants_detects_stale_index() {
        let mut queue = queue_of(&[("a", 1), ("b", 2)]);
        queue.key_to_heap_idx.insert("a", 1);
        assert!(queue.check_invariants().is_err());
    }

    /// Applies random operations and compares every observation against a naive model.
    #[test]
    fn test_random_ops_match_model() {
        let mut rng = fastrand::Rng::with_seed(0xC0FFEE);
        let mut queue: IndexedMinQueue<u32, i64> = IndexedMinQueue::new();
        let mut model: HashMap<u32, i64> = HashMap::new();

        for _ in 0..5_000 {
            match rng.u32(0..10) {
                0..=5 => {
                    let key = rng.u32(0..64);
                    let priority = rng.i64(-50..50);
                    queue.add_or_update(key, priority);
                    model.insert(key, priority);
                }
                6..=8 => match queue.remove_min_entry() {
                    Ok((key, priority)) => {
                        let model_min = *model.values().min().unwrap();
                        assert_eq!(priority, model_min);
                        assert_eq!(model.remove(&key), Some(priority));
                    }
                    Err(QueueError::Empty) => assert!(model.is_empty()),
                },
                _ => {
                    if rng.u32(0..20) == 0 {
                        queue.clear();
                        model.clear();
                    }
                }
            }

            assert_eq!(queue.len(), model.len());
            assert_eq!(queue.check_invariants(), Ok(()));
            for (key, priority) in &model {
                assert_eq!(queue.priority_of(key), Some(priority));
            }
        }
    }

    #[test]
    fn test_min_queue_trait_dispatch() {
        fn drain<Q: MinQueue<u8, u8>>(queue: &mut Q) -> Vec<u8> {
            let mut out = Vec::new();
            while !queue.is_empty() {
                out.push(queue.remove_min().unwrap());
            }
            out
        }

        let mut queue: IndexedMinQueue<u8, u8> = [(1, 30), (2, 10), (3, 20)].into_iter().collect();
        assert_eq!(drain(&mut queue), vec![2, 3, 1]);
    }
}
