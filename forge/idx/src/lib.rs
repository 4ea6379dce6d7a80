//! Typed handles and the arenas they index into.
//!
//! Every node of the IR lives in an [`IndexedMap`](maps::IndexedMap) and is
//! referred to by a small `Copy` newtype created with [`impl_index!`].
mod index_trait;
mod indexed_map;
mod macros;

pub mod maps {
    pub use super::indexed_map::IndexedMap;
}

pub use index_trait::IndexRef;
