//! Hash containers over *hashbrown* with a fixed *foldhash* seed.

/// Build state for [`HashMap`]. The seed does not change between runs.
pub type FixedHashState = foldhash::fast::FixedState;

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;
