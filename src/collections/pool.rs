//! Pool: free-list arena with generational keys.
//!
//! # Purpose
//!
//! Hand out stable `u32` slot indices for objects that are created and destroyed
//! at high frequency (contacts, manifolds) or that need stale-handle detection
//! (bodies), without per-tick heap churn once the pool has warmed up.
//!
//! # Architecture
//!
//! - `slots`: `Vec<Option<T>>`, never shrinks
//! - `free`: LIFO stack of vacant slot indices, so reuse order is deterministic
//! - `generations`: bumped on every removal; a [`PoolKey`] from before the removal no
//!   longer resolves
//! - `live`: bitset mirror of occupied slots for cheap membership tests
//!
//! [`Pool::acquire`] always starts from `T::default()`, so a recycled object never
//! leaks state from its previous owner.

use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

/// Slot index plus the generation it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Option<T>>,
    generations: Vec<u32>,
    free: Vec<u32>,
    live: FixedBitSet,
    len: usize,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            live: FixedBitSet::new(),
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: FixedBitSet::with_capacity(capacity),
            len: 0,
        }
    }

    /// Store `value`, reusing the most recently freed slot if any.
    pub fn insert(&mut self, value: T) -> PoolKey {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(value);
                index
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Some(value));
                self.generations.push(0);
                self.live.grow(self.slots.len());
                index
            }
        };
        self.live.insert(index as usize);
        self.len += 1;
        PoolKey {
            index,
            generation: self.generations[index as usize],
        }
    }

    /// Key the next [`Pool::insert`] will return.
    pub fn next_key(&self) -> PoolKey {
        match self.free.last() {
            Some(&index) => PoolKey {
                index,
                generation: self.generations[index as usize],
            },
            None => PoolKey {
                index: self.slots.len() as u32,
                generation: 0,
            },
        }
    }

    /// Remove the value behind `key`. Stale or vacant keys return `None`.
    pub fn remove(&mut self, key: PoolKey) -> Option<T> {
        if !self.contains(key) {
            return None;
        }
        let idx = key.index as usize;
        let value = self.slots[idx].take();
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.live.set(idx, false);
        self.free.push(key.index);
        self.len -= 1;
        value
    }

    /// Remove by slot index, ignoring generation.
    pub fn release(&mut self, index: u32) -> Option<T> {
        let key = self.key_at(index)?;
        self.remove(key)
    }

    pub fn contains(&self, key: PoolKey) -> bool {
        let idx = key.index as usize;
        idx < self.slots.len() && self.live.contains(idx) && self.generations[idx] == key.generation
    }

    pub fn get(&self, key: PoolKey) -> Option<&T> {
        if self.contains(key) {
            self.slots[key.index as usize].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, key: PoolKey) -> Option<&mut T> {
        if self.contains(key) {
            self.slots[key.index as usize].as_mut()
        } else {
            None
        }
    }

    /// Live value at `index` regardless of generation.
    pub fn get_index(&self, index: u32) -> Option<&T> {
        self.slots.get(index as usize).and_then(Option::as_ref)
    }

    pub fn get_index_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slots.get_mut(index as usize).and_then(Option::as_mut)
    }

    /// Two distinct live slots borrowed mutably at once. `None` if the indices are
    /// equal or either slot is vacant.
    pub fn get_pair_mut(&mut self, first: u32, second: u32) -> Option<(&mut T, &mut T)> {
        let (a, b) = (first as usize, second as usize);
        if a == b || a >= self.slots.len() || b >= self.slots.len() {
            return None;
        }
        if a < b {
            let (head, tail) = self.slots.split_at_mut(b);
            Some((head[a].as_mut()?, tail[0].as_mut()?))
        } else {
            let (head, tail) = self.slots.split_at_mut(a);
            Some((tail[0].as_mut()?, head[b].as_mut()?))
        }
    }

    /// Current key for a live slot.
    pub fn key_at(&self, index: u32) -> Option<PoolKey> {
        let idx = index as usize;
        if idx < self.slots.len() && self.live.contains(idx) {
            Some(PoolKey {
                index,
                generation: self.generations[idx],
            })
        } else {
            None
        }
    }

    /// Live entries in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (PoolKey, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(move |(idx, slot)| {
            slot.as_ref().map(|value| {
                (
                    PoolKey {
                        index: idx as u32,
                        generation: self.generations[idx],
                    },
                    value,
                )
            })
        })
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever allocated (live + free).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Upper bound (exclusive) on live slot indices, for sizing bitsets.
    pub fn index_bound(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

impl<T: Default> Pool<T> {
    /// Take a slot holding a freshly reset `T`.
    pub fn acquire(&mut self) -> PoolKey {
        self.insert(T::default())
    }
}
