use crate::{
    BusIdx, CompIdx, Dependency, HolderIdx, OpKind, PortIdx, TaskIdx,
    component::{Component, Task},
    resource::StateHolder,
    structure::{Bus, Port},
};
use forge_idx::maps::IndexedMap;
use forge_utils::NameGenerator;

/// The in-memory representation of a whole design. Owns every node of the
/// graph; the rest of the compiler refers to nodes through handles.
#[derive(Debug, Default)]
pub struct Design {
    pub(crate) components: IndexedMap<CompIdx, Component>,
    pub(crate) ports: IndexedMap<PortIdx, Port>,
    pub(crate) buses: IndexedMap<BusIdx, Bus>,
    pub(crate) holders: IndexedMap<HolderIdx, StateHolder>,
    pub(crate) tasks: IndexedMap<TaskIdx, Task>,
    pub(crate) namegen: NameGenerator,
    /// Extra options provided to the passes, in `pass:option` form.
    pub extra_opts: Vec<String>,
}

impl Design {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panics when `idx` does not belong to this design; use
    /// [get_component](Self::get_component) for unchecked handles.
    pub fn component(&self, idx: CompIdx) -> &Component {
        &self.components[idx]
    }

    pub fn get_component(&self, idx: CompIdx) -> Option<&Component> {
        self.components.get(idx)
    }

    pub fn port(&self, idx: PortIdx) -> &Port {
        &self.ports[idx]
    }

    pub fn bus(&self, idx: BusIdx) -> &Bus {
        &self.buses[idx]
    }

    pub fn holder(&self, idx: HolderIdx) -> &StateHolder {
        &self.holders[idx]
    }

    pub fn task(&self, idx: TaskIdx) -> &Task {
        &self.tasks[idx]
    }

    pub fn components(&self) -> impl Iterator<Item = (CompIdx, &Component)> {
        self.components.iter()
    }

    pub fn holders(&self) -> impl Iterator<Item = (HolderIdx, &StateHolder)> {
        self.holders.iter()
    }

    pub fn tasks(&self) -> impl Iterator<Item = (TaskIdx, &Task)> {
        self.tasks.iter()
    }

    /// The component that drives `bus`.
    pub fn bus_owner(&self, bus: BusIdx) -> CompIdx {
        self.buses[bus].owner
    }

    /// Dependencies recorded for `port` across every entry of its owner.
    pub fn dependencies(
        &self,
        port: PortIdx,
    ) -> impl Iterator<Item = &Dependency> + '_ {
        let owner = &self.components[self.ports[port].owner];
        owner
            .entries
            .iter()
            .flat_map(move |entry| entry.dependencies(port).iter())
    }

    /// The resource accessed by `comp` if it is an accessor.
    pub fn resource(&self, comp: CompIdx) -> Option<HolderIdx> {
        self.components[comp].as_access().map(|acc| acc.resource())
    }

    /// Iterates over the owners of `comp`, innermost first.
    pub fn owners(&self, comp: CompIdx) -> impl Iterator<Item = CompIdx> + '_ {
        std::iter::successors(self.components[comp].owner, move |c| {
            self.components[*c].owner
        })
    }

    /// Every component nested under `comp`, in pre-order. Callee bodies of
    /// task calls are not nested under the call.
    pub fn descendants(&self, comp: CompIdx) -> Vec<CompIdx> {
        let mut out = vec![];
        let mut stack = self.components[comp].children();
        stack.reverse();
        while let Some(child) = stack.pop() {
            out.push(child);
            stack.extend(self.components[child].children().into_iter().rev());
        }
        out
    }

    /// A bus is untimed when the value it carries is fixed at compile time
    /// and therefore needs no cycle-accurate ordering. Chains of casts are
    /// looked through since their outputs are only as timed as their input.
    pub fn is_untimed(&self, bus: BusIdx) -> bool {
        let mut bus = bus;
        loop {
            let owner = &self.components[self.buses[bus].owner];
            if owner.is_constant() {
                return true;
            }
            if !owner.is_op(OpKind::Cast) {
                break;
            }
            let Some(&input) = owner.data_ports.first() else {
                return false;
            };
            let mut sources = self.dependencies(input).map(|dep| dep.bus);
            match (sources.next(), sources.next()) {
                (Some(src), None) => bus = src,
                _ => return false,
            }
        }
        self.buses[bus].is_constant()
    }
}
