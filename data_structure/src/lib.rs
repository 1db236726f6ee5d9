pub mod arena;
pub mod index;
pub mod interning;

pub use bitvec::vec::BitVec;
pub type FxIndexSet<T> = indexmap::IndexSet<T, rustc_hash::FxBuildHasher>;
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
