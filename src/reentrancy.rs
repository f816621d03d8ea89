//! Catches user `Hash`/`Eq` impls that call back into the map that is
//! running them.
//!
//! A lookup or mutation may be halfway through a probe, or a rebuild, when
//! it hands control to `K: Hash` or `K: Eq`. If that code touches the same
//! map, the table is seen in a state no public method exposes. Debug builds
//! mark the map busy for the duration of each public call and panic on a
//! nested call. Release builds keep only the `!Sync` marker.

use core::cell::Cell;
use core::marker::PhantomData;

/// Busy flag embedded in every `OpenHashMap`.
#[derive(Debug, Default)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    // Shared references must never cross threads; the flag is a plain Cell.
    _nosync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _nosync: PhantomData,
        }
    }

    /// Marks the map busy until the returned guard drops.
    #[cfg(debug_assertions)]
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        if self.busy.replace(true) {
            panic!("OpenHashMap re-entered from a key's Hash or Eq impl");
        }
        ReentrancyGuard { owner: self }
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        ReentrancyGuard {
            _owner: PhantomData,
        }
    }
}

impl Clone for DebugReentrancy {
    // A cloned map is idle whatever state the source is in.
    fn clone(&self) -> Self {
        Self::new()
    }
}

pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a DebugReentrancy>,
}

#[cfg(debug_assertions)]
impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        let was_busy = self.owner.busy.replace(false);
        debug_assert!(was_busy);
    }
}
