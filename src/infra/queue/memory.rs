//! In-memory timer queue kept sorted by trigger key.

use crate::core::TimerHandle;

/// A queued timer and the key it was inserted under.
///
/// The key is copied in at insertion time; timers refuse to change their
/// trigger while queued, so it never goes stale.
#[derive(Debug, Clone)]
pub struct QueueEntry<K> {
    /// Sort key: absolute time for the active queue, idle delay for the idle queue.
    pub key: K,
    /// The queued timer.
    pub timer: TimerHandle,
}

/// Sorted vector of timers, earliest key first.
///
/// Insertion is O(n) but keeps peeking O(1) and preserves insertion order
/// among equal keys, which a binary heap would not.
#[derive(Debug)]
pub struct TimerQueue<K> {
    entries: Vec<QueueEntry<K>>,
}

impl<K: Ord + Copy> TimerQueue<K> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Create an empty queue with room for `capacity` timers.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert before the first entry whose key is later than `key`, so equal
    /// keys keep insertion order. Returns the position used.
    pub fn insert(&mut self, key: K, timer: TimerHandle) -> usize {
        let pos = self.entries.partition_point(|entry| entry.key <= key);
        self.entries.insert(pos, QueueEntry { key, timer });
        pos
    }

    /// Remove `timer` if present, returning the key it was queued under.
    pub fn remove(&mut self, timer: &TimerHandle) -> Option<K> {
        let pos = self.entries.iter().position(|entry| entry.timer.ptr_eq(timer))?;
        Some(self.entries.remove(pos).key)
    }

    /// Whether `timer` is queued here.
    pub fn contains(&self, timer: &TimerHandle) -> bool {
        self.entries.iter().any(|entry| entry.timer.ptr_eq(timer))
    }

    /// Earliest entry, without removing it.
    pub fn peek(&self) -> Option<&QueueEntry<K>> {
        self.entries.first()
    }

    /// Earliest key.
    pub fn first_key(&self) -> Option<K> {
        self.peek().map(|entry| entry.key)
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry<K>> {
        self.entries.iter()
    }

    /// Owned copy of the entries, for iterating while the queue changes.
    pub fn snapshot(&self) -> Vec<QueueEntry<K>> {
        self.entries.clone()
    }

    /// Number of queued timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no timers are queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether keys are in ascending order.
    pub fn is_sorted(&self) -> bool {
        self.entries.is_sorted_by(|a, b| a.key <= b.key)
    }
}

impl<K: Ord + Copy> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}
