//! Slot states of the open-addressing table.

use std::collections::TryReserveError;

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

#[derive(Clone, Debug)]
pub(crate) enum Slot<K, V> {
    /// Never occupied since the table was last built.
    Empty,
    /// Removed entry; probes must continue past it.
    Tombstone,
    Occupied(Entry<K, V>),
}

impl<K, V> Slot<K, V> {
    pub(crate) fn empty_table(capacity: usize) -> Box<[Slot<K, V>]> {
        (0..capacity).map(|_| Slot::Empty).collect()
    }

    /// Like `empty_table`, but reports allocation failure instead of aborting.
    pub(crate) fn try_empty_table(
        capacity: usize,
    ) -> Result<Box<[Slot<K, V>]>, TryReserveError> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize_with(capacity, || Slot::Empty);
        Ok(slots.into_boxed_slice())
    }

    /// Bytes a table of `capacity` slots occupies, if it fits in `isize`.
    pub(crate) fn table_bytes(capacity: usize) -> Option<usize> {
        capacity
            .checked_mul(core::mem::size_of::<Slot<K, V>>())
            .filter(|&bytes| bytes <= isize::MAX as usize)
    }

    #[inline]
    pub(crate) fn entry(&self) -> Option<&Entry<K, V>> {
        match self {
            Slot::Occupied(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self) -> Option<&mut Entry<K, V>> {
        match self {
            Slot::Occupied(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn into_entry(self) -> Option<Entry<K, V>> {
        match self {
            Slot::Occupied(e) => Some(e),
            _ => None,
        }
    }
}
