//! Internal representation of an untimed forge design.
//!
//! The design is a graph of [`Component`]s wired together through [`Port`]s
//! and [`Bus`]es. Every node is stored in an arena owned by the [`Design`]
//! and is referred to by a typed handle ([`CompIdx`], [`PortIdx`], ...), so
//! back-references such as a bus's logical dependents or a component's owner
//! are plain handle lookups.
//!
//! Stateful hardware resources are described by [`StateHolder`]s and every
//! access to one is a component of kind [`ComponentKind::Access`].

// Modules defining internal structures.
mod base;
mod builder;
mod component;
mod design;
mod printer;
mod resource;
mod structure;

/// Ordering of components for dataflow traversals.
pub mod traversal;

// Re-export types at the module level.
pub use base::{BusIdx, CompIdx, HolderIdx, PortIdx, TaskIdx};
pub use builder::{Builder, BranchParts};
pub use component::{Branch, Component, ComponentKind, OpKind, Task};
pub use design::Design;
pub use forge_utils::{GetName, Id};
pub use printer::Printer;
pub use resource::{Access, AccessKind, HolderKind, StateHolder};
pub use structure::{
    Bus, BusKind, Dependency, DependencyKind, Entry, Exit, Port, PortKind,
};
