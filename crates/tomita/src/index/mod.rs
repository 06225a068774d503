//! # Indexed Collections
//!
//! Dense, array-backed associative containers keyed by the small integer ids
//! handed out to grammar objects (nonterminals, productions, items, states).
//!
//! Lookups, inserts and removals are plain bounds-checked slot accesses, so
//! the table generator can memoize per-nonterminal data and deduplicate item
//! ids without paying for hashing.
//!
//! ```rust
//! use tomita::index::{IndexMap, IndexSet, Indexed};
//! use tomita::grammar::NonterminalId;
//!
//! let expr = NonterminalId::from_index(3);
//! let mut names: IndexMap<NonterminalId, &str> = IndexMap::new();
//! names.insert(expr, "Expr");
//! assert_eq!(names.get(expr), Some(&"Expr"));
//!
//! let mut seen = IndexSet::new();
//! assert!(seen.insert(expr));
//! assert!(!seen.insert(expr));
//! ```

use std::fmt;
use std::marker::PhantomData;

/// A key with a dense, zero-based integer index.
pub trait Indexed: Copy {
    /// The slot this key occupies.
    fn index(self) -> usize;

    /// Rebuild a key from its slot.
    fn from_index(index: usize) -> Self;
}

/// Declares a `u32` newtype id implementing [`Indexed`].
macro_rules! dense_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident => $prefix:literal;) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(u32);

        impl $name {
            /// The position of this id in its owning table.
            #[inline]
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl $crate::index::Indexed for $name {
            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            fn from_index(index: usize) -> Self {
                debug_assert!(u32::try_from(index).is_ok(), "id overflow");
                #[allow(clippy::cast_possible_truncation)]
                Self(index as u32)
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

pub(crate) use dense_id;

/// Map from a dense key to a value, stored as one slot per possible key.
#[derive(Clone)]
pub struct IndexMap<K, V> {
    slots: Vec<Option<V>>,
    len: usize,
    _key: PhantomData<fn(K) -> K>,
}

impl<K: Indexed, V> IndexMap<K, V> {
    /// Create an empty map
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            _key: PhantomData,
        }
    }

    /// Create an empty map with room for keys below `capacity`
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            len: 0,
            _key: PhantomData,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn contains_key(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn get(&self, key: K) -> Option<&V> {
        self.slots.get(key.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key.index()).and_then(Option::as_mut)
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let slot = self.slot_mut(key);
        let previous = slot.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let removed = self.slots.get_mut(key.index()).and_then(Option::take);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Get the value for `key`, computing and storing it first if absent.
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        if self.get(key).is_none() {
            self.len += 1;
        }
        self.slot_mut(key).get_or_insert_with(default)
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (K::from_index(index), value)))
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
    }

    fn slot_mut(&mut self, key: K) -> &mut Option<V> {
        let index = key.index();
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        &mut self.slots[index]
    }
}

impl<K: Indexed, V> Default for IndexMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Indexed + fmt::Debug, V: fmt::Debug> fmt::Debug for IndexMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

const ABSENT: u32 = u32::MAX;

/// Set of dense keys.
///
/// Members are kept in a packed vector (insertion order until the first
/// removal) next to a slot table mapping each key to its position, so
/// membership tests, inserts and removals are all O(1).
#[derive(Clone)]
pub struct IndexSet<K> {
    positions: Vec<u32>,
    members: Vec<K>,
}

impl<K: Indexed> IndexSet<K> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.positions
            .get(key.index())
            .is_some_and(|&position| position != ABSENT)
    }

    /// Insert `key`, returning `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        let index = key.index();
        if index >= self.positions.len() {
            self.positions.resize(index + 1, ABSENT);
        }
        if self.positions[index] != ABSENT {
            return false;
        }
        debug_assert!(u32::try_from(self.members.len()).is_ok(), "set overflow");
        #[allow(clippy::cast_possible_truncation)]
        {
            self.positions[index] = self.members.len() as u32;
        }
        self.members.push(key);
        true
    }

    /// Remove `key`, returning `false` if it was not present.
    ///
    /// The last member takes the removed member's place.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(&position) = self.positions.get(key.index()) else {
            return false;
        };
        if position == ABSENT {
            return false;
        }
        self.positions[key.index()] = ABSENT;
        self.members.swap_remove(position as usize);
        if let Some(&moved) = self.members.get(position as usize) {
            self.positions[moved.index()] = position;
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.members.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[K] {
        &self.members
    }

    pub fn clear(&mut self) {
        for member in self.members.drain(..) {
            self.positions[member.index()] = ABSENT;
        }
    }
}

impl<K: Indexed> Default for IndexSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Indexed> Extend<K> for IndexSet<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Indexed> FromIterator<K> for IndexSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K: Indexed + fmt::Debug> fmt::Debug for IndexSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.members.iter()).finish()
    }
}
