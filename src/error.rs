//! Errors returned by fallible construction.
//!
//! Lookups and mutations never fail: a missing key is reported as `None`,
//! and probe exhaustion is a broken resize policy, which panics.

use std::collections::TryReserveError;
use thiserror::Error;

/// A requested capacity cannot be backed by a power-of-two table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("capacity overflow: cannot size a table for {requested} entries")]
    Overflow { requested: usize },
    #[error("failed to allocate {slots} slots")]
    Allocation {
        slots: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Rejected `LoadFactorPolicy` tunables.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    #[error("max load must be within 1..=90 percent, got {0}")]
    MaxLoad(u8),
    #[error("max tombstones must be within 1..=100 percent, got {0}")]
    MaxTombstones(u8),
    #[error("min load {min}% must be less than half of max load {max}%")]
    MinLoad { min: u8, max: u8 },
    #[error("min level {0} exceeds the largest addressable table")]
    MinLevel(u32),
}
