//! Specialized collection types

use std::collections::HashMap;
use std::hash::Hash;

/// Bounded least-recently-used key/value cache
///
/// Stores at most `capacity` entries; a lookup or insert marks the entry as
/// most recently used, and inserting into a full cache evicts the entry
/// touched longest ago. All operations are O(1): a hash map locates entries
/// stored in a slab that is threaded as a doubly linked recency list.
pub struct LruCache<K, V> {
    map: HashMap<K, usize>,
    // occupied slots hold Some; vacated slots are listed in `free`
    slab: Vec<Option<LruEntry<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
}

struct LruEntry<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LruCache capacity must be non-zero");
        Self {
            map: HashMap::with_capacity(capacity),
            slab: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Whether `key` is cached, without refreshing its recency
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Look up `key`, marking it most recently used on a hit
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let index = *self.map.get(key)?;
        self.promote(index);
        self.slab[index].as_ref().map(|e| &e.value)
    }

    /// Mutable lookup, marking the entry most recently used on a hit
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = *self.map.get(key)?;
        self.promote(index);
        self.slab[index].as_mut().map(|e| &mut e.value)
    }

    /// Mark `key` most recently used without reading it
    pub fn touch(&mut self, key: &K) -> bool {
        match self.map.get(key) {
            Some(&index) => {
                self.promote(index);
                true
            }
            None => false,
        }
    }

    /// Insert a key/value pair as the most recently used entry
    ///
    /// Replacing an existing key refreshes its recency and returns the old
    /// value. Inserting a new key into a full cache evicts the least
    /// recently used entry first.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&index) = self.map.get(&key) {
            self.promote(index);
            return self
                .slab[index]
                .as_mut()
                .map(|entry| std::mem::replace(&mut entry.value, value));
        }

        if self.map.len() == self.capacity {
            self.pop_lru();
        }

        let entry = LruEntry {
            key: key.clone(),
            value,
            prev: None,
            next: self.head,
        };
        let index = if let Some(free) = self.free.pop() {
            self.slab[free] = Some(entry);
            free
        } else {
            self.slab.push(Some(entry));
            self.slab.len() - 1
        };

        if let Some(old_head) = self.head {
            if let Some(e) = self.slab[old_head].as_mut() {
                e.prev = Some(index);
            }
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
        self.map.insert(key, index);
        None
    }

    /// Remove and return the least recently used entry
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let tail = self.tail?;
        self.detach(tail);
        let entry = self.slab[tail].take()?;
        self.free.push(tail);
        self.map.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    /// Drop every entry, keeping the capacity
    pub fn clear(&mut self) {
        self.map.clear();
        self.slab.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    /// Unlink `index` from the recency list
    fn detach(&mut self, index: usize) {
        let (prev, next) = match self.slab[index].as_ref() {
            Some(e) => (e.prev, e.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(e) = self.slab[p].as_mut() {
                    e.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(e) = self.slab[n].as_mut() {
                    e.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(e) = self.slab[index].as_mut() {
            e.prev = None;
            e.next = None;
        }
    }

    /// Move `index` to the front of the recency list
    fn promote(&mut self, index: usize) {
        if self.head == Some(index) {
            return;
        }
        self.detach(index);
        let old_head = self.head;
        if let Some(e) = self.slab[index].as_mut() {
            e.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(e) = self.slab[h].as_mut() {
                e.prev = Some(index);
            }
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
    }
}
