//! Open-addressed hash tables with double hashing and tombstones.
//!
//! [`HashMap`] and [`crate::sets::HashSet`] share one bucket table. Every
//! bucket caches the full 64-bit hash of its key, so growth moves entries
//! without hashing them again and lookups compare hashes before keys.

pub mod map;
pub(crate) mod table;

pub use map::HashMap;

/// Fraction of buckets (live plus tombstones) that may be in use before an
/// insert rebuilds the table.
pub const LOAD_FACTOR: f64 = 0.75;

/// Growth is `capacity * (1 + GROWTH_FACTOR)`, so `1.0` doubles.
pub const GROWTH_FACTOR: f64 = 1.0;

/// Capacity of the first bucket array an empty table allocates.
pub const DEFAULT_CAPACITY: usize = 64;
