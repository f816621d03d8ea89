//! SlotTable: the raw open-addressing storage.
//!
//! Operates on precomputed hashes and never calls `K: Hash`; `K: Eq` only
//! runs on entries whose cached hash matches the probe hash. Resize
//! decisions are made by the caller, this layer just rebuilds on request.

use crate::policy::Occupancy;
use crate::probe::Probe;
use crate::slot::{Entry, Slot};
use core::borrow::Borrow;
use core::mem;
use log::trace;
use std::collections::TryReserveError;

#[derive(Clone, Debug)]
pub(crate) struct SlotTable<K, V> {
    occupancy: Occupancy,
    slots: Box<[Slot<K, V>]>,
}

impl<K, V> SlotTable<K, V> {
    #[cfg(test)]
    pub(crate) fn new(level: u32) -> Self {
        let occupancy = Occupancy::new(level);
        Self {
            slots: Slot::empty_table(occupancy.capacity()),
            occupancy,
        }
    }

    pub(crate) fn try_new(level: u32) -> Result<Self, TryReserveError> {
        let occupancy = Occupancy::new(level);
        Ok(Self {
            slots: Slot::try_empty_table(occupancy.capacity())?,
            occupancy,
        })
    }

    #[inline]
    pub(crate) fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    #[inline]
    pub(crate) fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [Slot<K, V>] {
        &mut self.slots
    }

    pub(crate) fn into_slots(self) -> Vec<Slot<K, V>> {
        self.slots.into_vec()
    }

    /// Index of the live entry matching `q`. Tombstones are skipped; the
    /// first `Empty` slot proves absence.
    pub(crate) fn find<Q>(&self, hash: u64, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        for i in Probe::new(hash, self.occupancy.mask()) {
            match &self.slots[i] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied(e) => {
                    if e.hash == hash && e.key.borrow() == q {
                        return Some(i);
                    }
                }
            }
        }
        None
    }

    pub(crate) fn get<Q>(&self, hash: u64, q: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let i = self.find(hash, q)?;
        self.slots[i].entry()
    }

    pub(crate) fn get_mut<Q>(&mut self, hash: u64, q: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let i = self.find(hash, q)?;
        self.slots[i].entry_mut()
    }

    /// Insert or update. A new entry lands on the first tombstone seen in
    /// the probe run if there was one, else on the `Empty` slot that ended
    /// the run. Returns the replaced value on update.
    ///
    /// Panics if the probe exhausts the table: the resize policy let the
    /// table fill up.
    pub(crate) fn insert(&mut self, hash: u64, key: K, value: V) -> Option<V>
    where
        K: Eq,
    {
        let mut reuse = None;
        for i in Probe::new(hash, self.occupancy.mask()) {
            match &mut self.slots[i] {
                Slot::Occupied(e) => {
                    if e.hash == hash && e.key == key {
                        return Some(mem::replace(&mut e.value, value));
                    }
                }
                Slot::Tombstone => {
                    reuse.get_or_insert(i);
                }
                Slot::Empty => {
                    let at = reuse.unwrap_or(i);
                    self.slots[at] = Slot::Occupied(Entry { hash, key, value });
                    self.occupancy.record_insert(reuse.is_some());
                    return None;
                }
            }
        }
        self.full()
    }

    /// Replace the matching entry with a tombstone and hand it back.
    pub(crate) fn remove<Q>(&mut self, hash: u64, q: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let i = self.find(hash, q)?;
        let entry = mem::replace(&mut self.slots[i], Slot::Tombstone).into_entry();
        if entry.is_some() {
            self.occupancy.record_remove();
        }
        entry
    }

    /// Rebuild at `level`, reinserting live entries in slot order and
    /// dropping every tombstone.
    pub(crate) fn rehash(&mut self, level: u32) {
        let before = self.occupancy;
        let old = mem::replace(&mut self.slots, Slot::empty_table(1usize << level));
        self.occupancy.reset(level);
        for entry in old.into_vec().into_iter().filter_map(Slot::into_entry) {
            self.insert_unique(entry);
        }
        trace!(
            "rehash: level {} -> {}, {} live, {} tombstones dropped",
            before.level(),
            level,
            self.occupancy.live(),
            before.tombstones()
        );
    }

    // Keys are already distinct and the fresh table has no tombstones.
    fn insert_unique(&mut self, entry: Entry<K, V>) {
        for i in Probe::new(entry.hash, self.occupancy.mask()) {
            if matches!(self.slots[i], Slot::Empty) {
                self.slots[i] = Slot::Occupied(entry);
                self.occupancy.record_insert(false);
                return;
            }
        }
        self.full()
    }

    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.occupancy.clear();
    }

    #[cold]
    #[track_caller]
    fn full(&self) -> ! {
        panic!(
            "open hash map is full: {} live, {} tombstones in {} slots",
            self.occupancy.live(),
            self.occupancy.tombstones(),
            self.occupancy.capacity()
        )
    }

    /// Structural checks used by the test suites.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self)
    where
        K: Eq + core::fmt::Debug,
    {
        let occ = &self.occupancy;
        assert_eq!(self.slots.len(), occ.capacity());
        let live = self.slots.iter().filter(|s| s.entry().is_some()).count();
        let tombstones = self
            .slots
            .iter()
            .filter(|s| matches!(s, Slot::Tombstone))
            .count();
        assert_eq!(live, occ.live(), "live count out of sync");
        assert_eq!(tombstones, occ.tombstones(), "tombstone count out of sync");
        assert!(occ.used() <= occ.capacity());

        for (i, slot) in self.slots.iter().enumerate() {
            let Some(e) = slot.entry() else { continue };
            for j in Probe::new(e.hash, occ.mask()) {
                if j == i {
                    break;
                }
                assert!(
                    !matches!(self.slots[j], Slot::Empty),
                    "entry {:?} at {} unreachable: empty slot {} on its probe path",
                    e.key,
                    i,
                    j
                );
                if let Some(other) = self.slots[j].entry() {
                    assert!(
                        !(other.hash == e.hash && other.key == e.key),
                        "duplicate key {:?} at {} and {}",
                        e.key,
                        j,
                        i
                    );
                }
            }
        }
    }
}
