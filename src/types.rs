use rustc_hash::FxHashMap;

pub type HashMap<K, V> = FxHashMap<K, V>;

/// Index of a grid point on the simulation time axis.
pub type Step = u64;
