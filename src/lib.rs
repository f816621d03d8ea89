//! value-hashmap: an open-addressing hash map for richly typed keys, built
//! to back distinct-value sets and grouping tables inside a query engine.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a flat, single-allocation map whose keys are compared by value
//!   (`K: Hash + Eq`), never by identity, with predictable resize rules.
//! - Layers:
//!   - `ResizePolicy` / `Occupancy`: size bookkeeping (capacity level, live
//!     entries, tombstones) and the decision to grow, shrink or compact.
//!     Policies never see slot contents, so thresholds are testable alone.
//!   - `SlotTable<K, V>`: one boxed slice of `Empty | Tombstone |
//!     Occupied` slots addressed by a triangular probe sequence. Works on
//!     precomputed hashes only.
//!   - `OpenHashMap<K, V, S, P>`: public API. Hashes keys with `S`, asks
//!     `P` before every `put` and `remove`, and rebuilds the table when
//!     told to.
//!
//! Probing
//! - Home slot is `hash & mask`; the n-th probe advances by `n`, giving
//!   offsets 0, 1, 3, 6, 10, ... which cover a power-of-two table in
//!   exactly `capacity` probes.
//! - Lookups skip tombstones and stop at the first `Empty` slot.
//! - Inserts place a new key on the first tombstone of its probe run, or
//!   on the terminating `Empty` slot.
//! - Each entry caches its `u64` hash. Probing compares hashes before
//!   running `K: Eq`, and rebuilding never runs `K: Hash`.
//!
//! Resizing
//! - Every rebuild reinserts exactly the live entries into a fresh table
//!   and drops all tombstones.
//! - The default `LoadFactorPolicy` grows past 70% occupancy (live plus
//!   tombstones), compacts instead when tombstones outnumber live entries,
//!   shrinks below 15% live on removal, and compacts on removal once
//!   tombstones exceed 25% of the table. All four numbers are tunable.
//! - A map never shrinks below the capacity it was created with.
//!
//! Failure semantics
//! - A missing key is `None`, never an error.
//! - If a policy lets the table fill so that `put` exhausts its probe,
//!   the map panics ("open hash map is full"); this is a policy bug.
//! - Only construction is fallible (`CapacityError`, `PolicyError`).
//!   `try_with_capacity*` reports oversized and unallocatable tables as
//!   errors instead of panicking.
//!
//! Constraints
//! - Single-threaded: the map is `Send` when its parts are, never `Sync`.
//!   Share it behind a lock or keep one per worker.
//! - Reentrancy: `K: Hash`/`K: Eq` must not call back into the same map;
//!   debug builds panic if they do.
//! - Iteration order is slot order: neither insertion nor sorted order.

mod error;
pub mod open_hash_map;
mod open_hash_map_proptest;
pub mod policy;
mod probe;
mod reentrancy;
mod slot;
mod table;
pub mod value;

// Public surface
pub use error::{CapacityError, PolicyError};
pub use open_hash_map::OpenHashMap;
pub use policy::{LoadFactorPolicy, Occupancy, Resize, ResizePolicy};
pub use value::{Value, ValueHashMap};
