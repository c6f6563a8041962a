//! Type aliases for hashmaps and hashsets backed by ahash.
//!
//! The `ahash` feature (on by default) swaps the standard library's SipHash
//! for ahash's faster, DoS-resistant-enough hasher. Disabling the feature
//! falls back to the standard hasher with no other code changes.

#[cfg(feature = "ahash")]
pub type ARandomState = ahash::RandomState;
#[cfg(not(feature = "ahash"))]
pub type ARandomState = std::collections::hash_map::RandomState;

pub type AHashMap<K, V> = std::collections::HashMap<K, V, ARandomState>;
pub type AHashSet<T> = std::collections::HashSet<T, ARandomState>;
