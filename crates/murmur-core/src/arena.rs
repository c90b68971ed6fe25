//! Generational slot arena.
//!
//! Agents, swarms, and parameters live in [`Arena`]s and are addressed by
//! small `{index, generation}` handles. Removing an entry bumps its slot's
//! generation, so a handle that outlived its target fails lookup instead
//! of aliasing whatever reuses the slot.

use std::fmt;
use std::marker::PhantomData;

/// Untyped `{index, generation}` pair backing every typed handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawId {
    /// Slot index within the arena.
    pub index: u32,
    /// Generation of the slot when the handle was issued.
    pub generation: u32,
}

impl RawId {
    /// Pack into a single `u64` (generation in the high half).
    pub fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A typed handle usable as an [`Arena`] key.
pub trait ArenaKey: Copy {
    /// Wrap a raw id.
    fn from_raw(raw: RawId) -> Self;
    /// Unwrap to the raw id.
    fn raw(self) -> RawId;
}

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A generational arena keyed by `K`.
///
/// Iteration order is slot order, which is insertion order until a slot
/// is freed and reused.
#[derive(Clone, Debug)]
pub struct Arena<K, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    _key: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, T> Arena<K, T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            _key: PhantomData,
        }
    }

    /// Insert a value, returning its handle.
    pub fn insert(&mut self, value: T) -> K {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return K::from_raw(RawId {
                index,
                generation: slot.generation,
            });
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        K::from_raw(RawId {
            index,
            generation: 0,
        })
    }

    fn slot(&self, key: K) -> Option<&Slot<T>> {
        let raw = key.raw();
        self.slots
            .get(raw.index as usize)
            .filter(|s| s.generation == raw.generation)
    }

    /// Whether `key` refers to a live entry.
    pub fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Shared access to a live entry.
    pub fn get(&self, key: K) -> Option<&T> {
        self.slot(key)?.value.as_ref()
    }

    /// Exclusive access to a live entry.
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        let raw = key.raw();
        self.slots
            .get_mut(raw.index as usize)
            .filter(|s| s.generation == raw.generation)?
            .value
            .as_mut()
    }

    /// Remove an entry, invalidating every outstanding handle to it.
    pub fn remove(&mut self, key: K) -> Option<T> {
        let raw = key.raw();
        let slot = self
            .slots
            .get_mut(raw.index as usize)
            .filter(|s| s.generation == raw.generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(raw.index);
        self.len -= 1;
        Some(value)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the arena holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value.as_ref().map(|v| {
                (
                    K::from_raw(RawId {
                        index: i as u32,
                        generation: s.generation,
                    }),
                    v,
                )
            })
        })
    }

    /// Live entries in slot order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            let generation = s.generation;
            s.value.as_mut().map(|v| {
                (
                    K::from_raw(RawId {
                        index: i as u32,
                        generation,
                    }),
                    v,
                )
            })
        })
    }

    /// Handles of all live entries in slot order.
    pub fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// Highest slot index ever used, plus one.
    pub fn capacity_hint(&self) -> usize {
        self.slots.len()
    }
}

impl<K: ArenaKey, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Key(RawId);

    impl ArenaKey for Key {
        fn from_raw(raw: RawId) -> Self {
            Self(raw)
        }
        fn raw(self) -> RawId {
            self.0
        }
    }

    #[test]
    fn insert_get_remove() {
        let mut arena: Arena<Key, &str> = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert!(!arena.contains(a));
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut arena: Arena<Key, u32> = Arena::new();
        let old = arena.insert(1);
        arena.remove(old);
        let new = arena.insert(2);
        assert_eq!(old.0.index, new.0.index);
        assert_ne!(old, new);
        assert_eq!(arena.get(old), None);
        assert_eq!(arena.get(new), Some(&2));
        assert_eq!(arena.remove(old), None);
    }

    #[test]
    fn iter_skips_free_slots() {
        let mut arena: Arena<Key, u32> = Arena::new();
        let keys: Vec<Key> = (0..4).map(|i| arena.insert(i)).collect();
        arena.remove(keys[1]);
        let values: Vec<u32> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0, 2, 3]);
        assert_eq!(arena.keys().len(), 3);
    }

    proptest! {
        #[test]
        fn removed_handles_never_resolve(ops in prop::collection::vec(any::<bool>(), 1..64)) {
            let mut arena: Arena<Key, usize> = Arena::new();
            let mut live: Vec<Key> = Vec::new();
            let mut dead: Vec<Key> = Vec::new();
            for (i, insert) in ops.into_iter().enumerate() {
                if insert || live.is_empty() {
                    live.push(arena.insert(i));
                } else {
                    let k = live.remove(i % live.len());
                    arena.remove(k);
                    dead.push(k);
                }
            }
            for k in &dead {
                prop_assert!(arena.get(*k).is_none());
            }
            for k in &live {
                prop_assert!(arena.get(*k).is_some());
            }
            prop_assert_eq!(arena.len(), live.len());
        }
    }
}
