//! Capacity policy: size bookkeeping and resize decisions.
//!
//! The map owns an `Occupancy` and keeps it current. Before every `put` and
//! every `remove` it hands a read-only view to its `ResizePolicy`, which
//! answers whether the table must be rebuilt first and at which level.
//! Policies never see slot contents.

use crate::error::PolicyError;

/// Largest capacity exponent a table may reach.
pub const MAX_LEVEL: u32 = usize::BITS - 2;

pub const DEFAULT_MAX_LOAD_PERCENT: u8 = 70;
pub const DEFAULT_MIN_LOAD_PERCENT: u8 = 15;
pub const DEFAULT_MAX_TOMBSTONE_PERCENT: u8 = 25;
pub const DEFAULT_MIN_LEVEL: u32 = 3;

/// Table size bookkeeping: capacity level, live entries and tombstones.
///
/// `floor` is the level the map was created at; rebuilds keep it so a
/// presized map never shrinks below the size its owner asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Occupancy {
    level: u32,
    floor: u32,
    live: usize,
    tombstones: usize,
}

impl Occupancy {
    pub(crate) fn new(level: u32) -> Self {
        Self {
            level,
            floor: level,
            live: 0,
            tombstones: 0,
        }
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Lowest level a shrink may reach.
    #[inline]
    pub fn floor(&self) -> u32 {
        self.floor
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        1usize << self.level
    }

    #[inline]
    pub fn mask(&self) -> usize {
        self.capacity() - 1
    }

    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Slots that are not `Empty`.
    #[inline]
    pub fn used(&self) -> usize {
        self.live + self.tombstones
    }

    pub(crate) fn reset(&mut self, level: u32) {
        *self = Self {
            floor: self.floor,
            ..Self::new(level)
        };
    }

    pub(crate) fn record_insert(&mut self, reused_tombstone: bool) {
        if reused_tombstone {
            self.tombstones -= 1;
        }
        self.live += 1;
        debug_assert!(self.used() <= self.capacity());
    }

    pub(crate) fn record_remove(&mut self) {
        self.live -= 1;
        self.tombstones += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.live = 0;
        self.tombstones = 0;
    }
}

/// How the table must be rebuilt before a mutation proceeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resize {
    /// Double the capacity.
    Grow,
    /// Halve the capacity.
    Shrink,
    /// Rebuild at the same capacity, dropping tombstones.
    Compact,
}

impl Resize {
    /// Level the table moves to from `level`.
    pub fn target(self, level: u32) -> u32 {
        match self {
            Resize::Grow => level + 1,
            Resize::Shrink => level.saturating_sub(1),
            Resize::Compact => level,
        }
    }
}

/// Strategy deciding table capacity.
///
/// Implementations must keep `used() < capacity()` whenever `put` scans,
/// otherwise the probe can exhaust the table and the map panics.
pub trait ResizePolicy {
    /// Level for a fresh table expected to hold `entries`; `None` if no
    /// level up to `MAX_LEVEL` is large enough.
    fn initial_level(&self, entries: usize) -> Option<u32>;

    /// Consulted before every `put`.
    fn before_insert(&self, occupancy: &Occupancy) -> Option<Resize>;

    /// Consulted before every `remove`, whether or not the key is present.
    /// `LoadFactorPolicy` never shrinks below `occupancy.floor()`.
    fn before_remove(&self, occupancy: &Occupancy) -> Option<Resize>;
}

/// Percentage-threshold policy used by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadFactorPolicy {
    max_load_percent: u8,
    min_load_percent: u8,
    max_tombstone_percent: u8,
    min_level: u32,
}

impl LoadFactorPolicy {
    pub fn new(
        max_load_percent: u8,
        min_load_percent: u8,
        max_tombstone_percent: u8,
        min_level: u32,
    ) -> Result<Self, PolicyError> {
        if !(1..=90).contains(&max_load_percent) {
            return Err(PolicyError::MaxLoad(max_load_percent));
        }
        if !(1..=100).contains(&max_tombstone_percent) {
            return Err(PolicyError::MaxTombstones(max_tombstone_percent));
        }
        if u16::from(min_load_percent) * 2 >= u16::from(max_load_percent) {
            return Err(PolicyError::MinLoad {
                min: min_load_percent,
                max: max_load_percent,
            });
        }
        if min_level > MAX_LEVEL {
            return Err(PolicyError::MinLevel(min_level));
        }
        Ok(Self {
            max_load_percent,
            min_load_percent,
            max_tombstone_percent,
            min_level,
        })
    }

    pub fn max_load_percent(&self) -> u8 {
        self.max_load_percent
    }

    pub fn min_load_percent(&self) -> u8 {
        self.min_load_percent
    }

    pub fn max_tombstone_percent(&self) -> u8 {
        self.max_tombstone_percent
    }

    pub fn min_level(&self) -> u32 {
        self.min_level
    }
}

impl Default for LoadFactorPolicy {
    fn default() -> Self {
        Self {
            max_load_percent: DEFAULT_MAX_LOAD_PERCENT,
            min_load_percent: DEFAULT_MIN_LOAD_PERCENT,
            max_tombstone_percent: DEFAULT_MAX_TOMBSTONE_PERCENT,
            min_level: DEFAULT_MIN_LEVEL,
        }
    }
}

// `count * 100 > capacity * percent`, widened so large tables cannot overflow.
#[inline]
fn exceeds(count: usize, capacity: usize, percent: u8) -> bool {
    count as u128 * 100 > capacity as u128 * u128::from(percent)
}

impl ResizePolicy for LoadFactorPolicy {
    fn initial_level(&self, entries: usize) -> Option<u32> {
        (self.min_level..=MAX_LEVEL)
            .find(|&level| !exceeds(entries, 1usize << level, self.max_load_percent))
    }

    fn before_insert(&self, occupancy: &Occupancy) -> Option<Resize> {
        if !exceeds(
            occupancy.used() + 1,
            occupancy.capacity(),
            self.max_load_percent,
        ) {
            return None;
        }
        if occupancy.tombstones() > occupancy.live() {
            Some(Resize::Compact)
        } else {
            Some(Resize::Grow)
        }
    }

    fn before_remove(&self, occupancy: &Occupancy) -> Option<Resize> {
        let capacity = occupancy.capacity();
        let sparse = (occupancy.live() as u128) * 100
            < capacity as u128 * u128::from(self.min_load_percent);
        if sparse && occupancy.level() > self.min_level.max(occupancy.floor()) {
            Some(Resize::Shrink)
        } else if exceeds(occupancy.tombstones(), capacity, self.max_tombstone_percent) {
            Some(Resize::Compact)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(level: u32, live: usize, tombstones: usize) -> Occupancy {
        Occupancy {
            level,
            floor: 0,
            live,
            tombstones,
        }
    }

    #[test]
    fn default_tunables_are_valid() {
        let d = LoadFactorPolicy::default();
        let checked = LoadFactorPolicy::new(
            d.max_load_percent(),
            d.min_load_percent(),
            d.max_tombstone_percent(),
            d.min_level(),
        )
        .unwrap();
        assert_eq!(d, checked);
    }

    #[test]
    fn invalid_tunables_rejected() {
        assert_eq!(
            LoadFactorPolicy::new(0, 0, 25, 3),
            Err(PolicyError::MaxLoad(0))
        );
        assert_eq!(
            LoadFactorPolicy::new(95, 10, 25, 3),
            Err(PolicyError::MaxLoad(95))
        );
        assert_eq!(
            LoadFactorPolicy::new(70, 10, 0, 3),
            Err(PolicyError::MaxTombstones(0))
        );
        assert_eq!(
            LoadFactorPolicy::new(70, 35, 25, 3),
            Err(PolicyError::MinLoad { min: 35, max: 70 })
        );
        assert_eq!(
            LoadFactorPolicy::new(70, 10, 25, MAX_LEVEL + 1),
            Err(PolicyError::MinLevel(MAX_LEVEL + 1))
        );
    }

    #[test]
    fn occupancy_bookkeeping() {
        let mut o = Occupancy::new(3);
        assert_eq!(o.capacity(), 8);
        assert_eq!(o.mask(), 7);
        o.record_insert(false);
        o.record_insert(false);
        o.record_remove();
        assert_eq!((o.live(), o.tombstones(), o.used()), (1, 1, 2));
        o.record_insert(true);
        assert_eq!((o.live(), o.tombstones()), (2, 0));
        o.reset(4);
        assert_eq!(o.level(), 4);
        assert_eq!((o.live(), o.tombstones()), (0, 0));
        // Rebuilds keep the creation level as the shrink floor.
        assert_eq!(o.floor(), 3);
    }

    #[test]
    fn presized_tables_do_not_shrink_below_floor() {
        let p = LoadFactorPolicy::default();
        let mut o = Occupancy::new(10);
        o.record_insert(false);
        assert_eq!(p.before_remove(&o), None);
        o.reset(11);
        assert_eq!(p.before_remove(&o), Some(Resize::Shrink));
    }

    #[test]
    fn resize_targets() {
        assert_eq!(Resize::Grow.target(3), 4);
        assert_eq!(Resize::Shrink.target(3), 2);
        assert_eq!(Resize::Shrink.target(0), 0);
        assert_eq!(Resize::Compact.target(3), 3);
    }

    #[test]
    fn initial_level_respects_min_and_load() {
        let p = LoadFactorPolicy::default();
        assert_eq!(p.initial_level(0), Some(3));
        // 5 entries fit in 8 slots at 70%, 6 do not.
        assert_eq!(p.initial_level(5), Some(3));
        assert_eq!(p.initial_level(6), Some(4));
        assert_eq!(p.initial_level(700), Some(10));
        assert_eq!(p.initial_level(usize::MAX), None);
    }

    #[test]
    fn grows_past_high_water_mark() {
        let p = LoadFactorPolicy::default();
        // 8 slots: the 6th entry would push occupancy to 75%.
        assert_eq!(p.before_insert(&occ(3, 4, 0)), None);
        assert_eq!(p.before_insert(&occ(3, 5, 0)), Some(Resize::Grow));
        // Tombstones count toward occupancy.
        assert_eq!(p.before_insert(&occ(3, 3, 2)), Some(Resize::Grow));
    }

    #[test]
    fn compacts_when_tombstones_dominate_on_insert() {
        let p = LoadFactorPolicy::default();
        assert_eq!(p.before_insert(&occ(3, 1, 4)), Some(Resize::Compact));
    }

    #[test]
    fn shrinks_sparse_tables_above_min_level() {
        let p = LoadFactorPolicy::default();
        // 64 slots, 15% is 9.6 entries.
        assert_eq!(p.before_remove(&occ(6, 9, 0)), Some(Resize::Shrink));
        assert_eq!(p.before_remove(&occ(6, 10, 0)), None);
        // Never below the minimum level.
        assert_eq!(p.before_remove(&occ(3, 0, 0)), None);
    }

    #[test]
    fn compacts_tombstone_buildup_on_remove() {
        let p = LoadFactorPolicy::default();
        // 64 slots, 25% is 16 tombstones.
        assert_eq!(p.before_remove(&occ(6, 20, 16)), None);
        assert_eq!(p.before_remove(&occ(6, 20, 17)), Some(Resize::Compact));
    }
}
