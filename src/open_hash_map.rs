//! OpenHashMap: public map over `SlotTable` with a pluggable resize policy
//! and debug reentrancy guard.

use crate::error::CapacityError;
use crate::policy::{LoadFactorPolicy, Occupancy, Resize, ResizePolicy, MAX_LEVEL};
use crate::reentrancy::DebugReentrancy;
use crate::slot::Slot;
use crate::table::SlotTable;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Open-addressing hash map with tombstone deletion and triangular probing.
///
/// Keys need only `Hash + Eq`; values are unconstrained. Iteration follows
/// slot order, which changes whenever the table is rebuilt.
#[derive(Clone)]
pub struct OpenHashMap<K, V, S = DefaultHashBuilder, P = LoadFactorPolicy> {
    hasher: S,
    policy: P,
    table: SlotTable<K, V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> OpenHashMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Panics if no table can hold `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    pub fn try_with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        Self::try_with_capacity_hasher_and_policy(
            capacity,
            DefaultHashBuilder::default(),
            LoadFactorPolicy::default(),
        )
    }
}

impl<K, V, P> OpenHashMap<K, V, DefaultHashBuilder, P>
where
    P: ResizePolicy,
{
    pub fn with_policy(policy: P) -> Self {
        Self::with_capacity_hasher_and_policy(0, DefaultHashBuilder::default(), policy)
    }
}

impl<K, V, S> OpenHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::with_capacity_hasher_and_policy(capacity, hasher, LoadFactorPolicy::default())
    }
}

impl<K, V> Default for OpenHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, P> OpenHashMap<K, V, S, P>
where
    P: ResizePolicy,
{
    /// Panics if no table can hold `capacity` entries.
    pub fn with_capacity_hasher_and_policy(capacity: usize, hasher: S, policy: P) -> Self {
        match Self::try_with_capacity_hasher_and_policy(capacity, hasher, policy) {
            Ok(map) => map,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_with_capacity_hasher_and_policy(
        capacity: usize,
        hasher: S,
        policy: P,
    ) -> Result<Self, CapacityError> {
        let overflow = || CapacityError::Overflow {
            requested: capacity,
        };
        let level = policy
            .initial_level(capacity)
            .filter(|&level| level <= MAX_LEVEL)
            .ok_or_else(overflow)?;
        let slots = 1usize << level;
        Slot::<K, V>::table_bytes(slots).ok_or_else(overflow)?;
        let table = SlotTable::try_new(level)
            .map_err(|source| CapacityError::Allocation { slots, source })?;
        Ok(Self {
            hasher,
            policy,
            table,
            reentrancy: DebugReentrancy::new(),
        })
    }
}

impl<K, V, S, P> OpenHashMap<K, V, S, P> {
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.table.occupancy().live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots in the table.
    pub fn capacity(&self) -> usize {
        self.table.occupancy().capacity()
    }

    pub fn tombstones(&self) -> usize {
        self.table.occupancy().tombstones()
    }

    pub fn occupancy(&self) -> &Occupancy {
        self.table.occupancy()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Drop every entry and tombstone; the capacity is kept.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.slots().iter(),
            remaining: self.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.len();
        IterMut {
            it: self.table.slots_mut().iter_mut(),
            remaining,
        }
    }

    /// Live keys in slot order, aligned with `values()`.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Live values in slot order, aligned with `keys()`.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K, V, S, P> OpenHashMap<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: ResizePolicy,
{
    #[inline]
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    // Rebuilds the table if the policy asks for it; runs inside the caller's guard.
    fn apply(table: &mut SlotTable<K, V>, decision: Option<Resize>) {
        if let Some(resize) = decision {
            let level = resize.target(table.occupancy().level());
            assert!(level <= MAX_LEVEL, "capacity overflow");
            table.rehash(level);
        }
    }

    /// Insert or update. Returns the previous value when `key` was present;
    /// the live count only changes for new keys.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let _g = self.reentrancy.enter();
        let decision = self.policy.before_insert(self.table.occupancy());
        Self::apply(&mut self.table, decision);
        let hash = self.make_hash(&key);
        self.table.insert(hash, key, value)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        self.table.get(hash, q).map(|e| &e.value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        self.table.get(hash, q).map(|e| (&e.key, &e.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        self.table.get_mut(hash, q).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(q);
        self.table.find(hash, q).is_some()
    }

    /// Remove `q`, leaving a tombstone. A missing key is a no-op that
    /// returns `None`; the policy is consulted either way.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let decision = self.policy.before_remove(self.table.occupancy());
        Self::apply(&mut self.table, decision);
        let hash = self.make_hash(q);
        self.table.remove(hash, q).map(|e| (e.key, e.value))
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        K: fmt::Debug,
    {
        self.table.assert_invariants();
        for e in self.table.slots().iter().filter_map(Slot::entry) {
            assert_eq!(e.hash, self.make_hash(&e.key), "stale cached hash");
        }
    }
}

impl<K, V, S, P> fmt::Debug for OpenHashMap<K, V, S, P>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, P> Extend<(K, V)> for OpenHashMap<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher,
    P: ResizePolicy,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S, P> FromIterator<(K, V)> for OpenHashMap<K, V, S, P>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    P: ResizePolicy + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map =
            Self::with_capacity_hasher_and_policy(iter.size_hint().0, S::default(), P::default());
        map.extend(iter);
        map
    }
}

/// Iterator over live entries in slot order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.it.by_ref().find_map(Slot::entry)?;
        self.remaining -= 1;
        Some((&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            it: self.it.clone(),
            remaining: self.remaining,
        }
    }
}

/// Iterator over live entries with mutable values.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.it.by_ref().find_map(Slot::entry_mut)?;
        self.remaining -= 1;
        Some((&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// Owning iterator over live entries in slot order.
pub struct IntoIter<K, V> {
    it: std::vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        let e = self.it.by_ref().find_map(Slot::into_entry)?;
        self.remaining -= 1;
        Some((e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S, P> IntoIterator for OpenHashMap<K, V, S, P> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        let remaining = self.len();
        IntoIter {
            it: self.table.into_slots().into_iter(),
            remaining,
        }
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a OpenHashMap<K, V, S, P> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a mut OpenHashMap<K, V, S, P> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
