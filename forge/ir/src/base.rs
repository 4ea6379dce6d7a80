//! Handles into the arenas owned by a [Design](crate::Design).
use forge_idx::impl_index;

/// Handle to a [Component](crate::Component).
#[derive(Debug, Eq, Copy, Clone, PartialEq, Hash, PartialOrd, Ord)]
pub struct CompIdx(u32);
impl_index!(CompIdx);

/// Handle to a [Port](crate::Port).
#[derive(Debug, Eq, Copy, Clone, PartialEq, Hash, PartialOrd, Ord)]
pub struct PortIdx(u32);
impl_index!(PortIdx);

/// Handle to a [Bus](crate::Bus).
#[derive(Debug, Eq, Copy, Clone, PartialEq, Hash, PartialOrd, Ord)]
pub struct BusIdx(u32);
impl_index!(BusIdx);

/// Handle to a [StateHolder](crate::StateHolder).
#[derive(Debug, Eq, Copy, Clone, PartialEq, Hash, PartialOrd, Ord)]
pub struct HolderIdx(u32);
impl_index!(HolderIdx);

/// Handle to a [Task](crate::Task).
#[derive(Debug, Eq, Copy, Clone, PartialEq, Hash, PartialOrd, Ord)]
pub struct TaskIdx(u32);
impl_index!(TaskIdx);
