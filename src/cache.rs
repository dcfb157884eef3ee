use std::collections::{HashSet, VecDeque};

/// Default number of transaction hashes remembered
pub const DEFAULT_DEDUP_CAPACITY: usize = 1000;

/// Bounded set of already-notified transaction hashes.
///
/// Eviction follows insertion order only: lookups never refresh an entry,
/// so once `capacity` is exceeded the oldest recorded hash is dropped.
/// State is in-memory and lost on restart.
#[derive(Debug, Clone)]
pub struct DedupCache {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}

impl DedupCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            members: HashSet::with_capacity(capacity + 1),
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.members.contains(&hash.to_lowercase())
    }

    /// Record a hash, evicting the oldest entry when over capacity.
    /// Returns false if the hash was already present.
    pub fn record(&mut self, hash: &str) -> bool {
        let key = hash.to_lowercase();
        if !self.members.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);

        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
