//! Wiring of the IR: ports, buses, and the dependencies between them.
use crate::{BusIdx, CompIdx, PortIdx};
use forge_utils::{GetName, Id};
use linked_hash_map::LinkedHashMap;
use smallvec::SmallVec;

/// The role a port plays on its component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// The control enable of a component.
    Go,
    /// A data input.
    Data,
}

/// An input of a component.
#[derive(Debug, Clone)]
pub struct Port {
    /// Name of the port, unique within its owner.
    pub name: Id,
    /// Component this port belongs to.
    pub owner: CompIdx,
    pub kind: PortKind,
}

impl GetName for Port {
    fn name(&self) -> Id {
        self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusKind {
    /// Asserted when the producing component has completed.
    Done,
    /// A data result.
    Data,
}

/// An output of a component.
#[derive(Debug, Clone)]
pub struct Bus {
    pub name: Id,
    /// Component this bus belongs to.
    pub owner: CompIdx,
    pub kind: BusKind,
    /// A statically known value for the bus, if constant propagation found
    /// one.
    pub value: Option<u64>,
    /// Ports that depend on this bus through some [Entry]. Maintained by the
    /// [Builder](crate::Builder).
    pub(crate) dependents: SmallVec<[PortIdx; 4]>,
}

impl Bus {
    /// Ports that logically consume this bus.
    pub fn dependents(&self) -> &[PortIdx] {
        &self.dependents
    }

    pub fn is_constant(&self) -> bool {
        self.value.is_some()
    }
}

impl GetName for Bus {
    fn name(&self) -> Id {
        self.name
    }
}

/// Why a port depends on a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// The port consumes the value carried on the bus.
    Data,
    /// The port must wait until the bus is asserted.
    Control,
}

/// An edge from an upstream bus to the port of an [Entry].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    /// The logical source of the value.
    pub bus: BusIdx,
    pub kind: DependencyKind,
}

/// One way of entering a component: for every input port, the buses it
/// depends on.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    deps: LinkedHashMap<PortIdx, Vec<Dependency>>,
}

impl Entry {
    /// Dependencies recorded for `port`; empty when there are none.
    pub fn dependencies(&self, port: PortIdx) -> &[Dependency] {
        self.deps.get(&port).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All ports with at least one dependency, in insertion order.
    pub fn ports(&self) -> impl Iterator<Item = PortIdx> + '_ {
        self.deps.keys().copied()
    }

    pub fn all_dependencies(
        &self,
    ) -> impl Iterator<Item = (PortIdx, &Dependency)> + '_ {
        self.deps
            .iter()
            .flat_map(|(port, deps)| deps.iter().map(move |dep| (*port, dep)))
    }

    pub(crate) fn add_dependency(&mut self, port: PortIdx, dep: Dependency) {
        self.deps.entry(port).or_insert_with(Vec::new).push(dep);
    }
}

/// One way of leaving a component.
#[derive(Debug, Clone)]
pub struct Exit {
    pub done: BusIdx,
    pub data: SmallVec<[BusIdx; 2]>,
}

impl Exit {
    /// Every bus of the exit, starting with the done bus.
    pub fn buses(&self) -> impl Iterator<Item = BusIdx> + '_ {
        std::iter::once(self.done).chain(self.data.iter().copied())
    }
}
