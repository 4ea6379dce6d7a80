use super::{ComponentProcessDeriver, MemProcess, ProcessIdx, ProcessTable};
use forge_ir::{self as ir, CompIdx, Id, PortIdx, traversal::DataflowOrder};
use forge_utils::{Error, ForgeResult};
use std::{
    collections::{BTreeSet, HashMap},
    rc::Rc,
};

/// Why a module must stall.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleStallSource {
    /// The module opens these processes without any process controlling
    /// it; it has to wait for their stall boards.
    Processes(BTreeSet<ProcessIdx>),
    /// The component runs inside a process but consumes timed data that no
    /// process orders.
    Component(CompIdx),
}

impl ModuleStallSource {
    /// Components whose completion the stalled module waits for.
    pub fn stalling_components(
        &self,
        processes: &ProcessTable,
    ) -> BTreeSet<CompIdx> {
        match self {
            ModuleStallSource::Processes(procs) => procs
                .iter()
                .flat_map(|proc| processes[*proc].stall_points())
                .map(|(_, board)| board.component())
                .collect(),
            ModuleStallSource::Component(comp) => BTreeSet::from([*comp]),
        }
    }
}

/// The processes of one module, tracked through its children.
///
/// Children are registered in dataflow order. Registering a component marks
/// every port fed by one of its exits with the processes the component runs
/// in, so that later components find the processes reaching them with a
/// simple lookup on their own ports.
#[derive(Debug)]
pub struct ProcessTracker {
    module: CompIdx,
    name: Id,
    processes: Rc<ProcessTable>,
    port_to_procs: HashMap<PortIdx, BTreeSet<ProcessIdx>>,
    /// Components whose completion releases each process.
    stall_signals: HashMap<ProcessIdx, BTreeSet<CompIdx>>,
    module_stalls: HashMap<CompIdx, Vec<ModuleStallSource>>,
}

impl ProcessTracker {
    pub fn new(
        design: &ir::Design,
        module: CompIdx,
        processes: Rc<ProcessTable>,
    ) -> ForgeResult<Self> {
        let name = match design.get_component(module) {
            Some(comp) if comp.is_module() => comp.name,
            Some(_) => {
                return Err(Error::invalid_argument(format!(
                    "Cannot track processes of `{}`: not a module",
                    ir::Printer::component_to_str(design, module)
                )));
            }
            None => {
                return Err(Error::invalid_argument(format!(
                    "Cannot track processes of {module:?}: \
                     not a component of the design"
                )));
            }
        };
        let mut tracker = Self {
            module,
            name,
            processes,
            port_to_procs: HashMap::new(),
            stall_signals: HashMap::new(),
            module_stalls: HashMap::new(),
        };
        if !tracker.processes.is_empty() {
            for child in DataflowOrder::children(design, module)? {
                tracker.register(design, child)?;
            }
        }
        Ok(tracker)
    }

    fn register(
        &mut self,
        design: &ir::Design,
        comp: CompIdx,
    ) -> ForgeResult<()> {
        let derived = ComponentProcessDeriver::new(design, comp, self)?;
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("Registering {}", derived.to_str(design));
        }
        let in_procs = derived.in_processes();
        self.mark_ports(design, comp, &in_procs);

        for proc in derived.closed_processes() {
            log::debug!(
                "Stalling(close) {} by {}",
                self.processes[*proc].to_str(design),
                design.component(comp).name
            );
            self.stall_signals.entry(*proc).or_default().insert(comp);
        }
        let data_stalled = !derived.data_procs_to_stall().is_empty();
        for proc in derived.data_procs_to_stall() {
            log::debug!(
                "Stalling(data) {} by {}",
                self.processes[*proc].to_str(design),
                design.component(comp).name
            );
            self.stall_signals.entry(*proc).or_default().insert(comp);
        }

        let owner = design.component(comp).owner.unwrap_or(self.module);
        let uncontrolled = derived.uncontrolled_open_procs();
        if !uncontrolled.is_empty() && !data_stalled {
            log::debug!(
                "Stalling(module by process) {} by {:?}",
                ir::Printer::owners_to_str(design, comp),
                uncontrolled
            );
            self.stall_module(
                owner,
                ModuleStallSource::Processes(uncontrolled),
            );
        }
        if !in_procs.is_empty() && !derived.uncontrolled_data_ports().is_empty()
        {
            log::debug!(
                "Stalling(module by uncontrolled data) {} by {}",
                ir::Printer::owners_to_str(design, comp),
                design.component(comp).name
            );
            self.stall_module(owner, ModuleStallSource::Component(comp));
        }
        Ok(())
    }

    /// Annotate every port fed by an exit of `comp` with `procs`.
    fn mark_ports(
        &mut self,
        design: &ir::Design,
        comp: CompIdx,
        procs: &BTreeSet<ProcessIdx>,
    ) {
        for exit in &design.component(comp).exits {
            for bus in exit.buses() {
                for port in design.bus(bus).dependents() {
                    self.port_to_procs
                        .entry(*port)
                        .or_default()
                        .extend(procs.iter().copied());
                }
            }
        }
    }

    fn stall_module(&mut self, module: CompIdx, source: ModuleStallSource) {
        let sources = self.module_stalls.entry(module).or_default();
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    /// The module whose children this tracker registered.
    pub fn module(&self) -> CompIdx {
        self.module
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn process(&self, idx: ProcessIdx) -> &MemProcess {
        &self.processes[idx]
    }

    /// The processes reaching `ports`: the ones annotated on the ports by
    /// their producers in this module and, for a data search, every process
    /// that ends at the producer of a value consumed by the ports. Ports fed
    /// from outside the module carry no annotation.
    pub fn procs_for_ports(
        &self,
        design: &ir::Design,
        ports: impl IntoIterator<Item = PortIdx>,
        is_data_search: bool,
    ) -> BTreeSet<ProcessIdx> {
        let mut procs = BTreeSet::new();
        for port in ports {
            if let Some(annotated) = self.port_to_procs.get(&port) {
                procs.extend(annotated.iter().copied());
            }
            if !is_data_search {
                continue;
            }
            for dep in design.dependencies(port) {
                let source = design.bus_owner(dep.bus);
                procs.extend(
                    self.processes
                        .iter()
                        .filter(|(_, proc)| proc.is_end_point(source))
                        .map(|(idx, _)| idx),
                );
            }
        }
        procs
    }

    /// Components whose completion releases `proc`.
    pub fn stall_signals(
        &self,
        proc: ProcessIdx,
    ) -> impl Iterator<Item = CompIdx> + '_ {
        self.stall_signals.get(&proc).into_iter().flatten().copied()
    }

    /// Why `module` must stall, in the order the reasons were found.
    pub fn module_stall_sources(
        &self,
        module: CompIdx,
    ) -> &[ModuleStallSource] {
        self.module_stalls
            .get(&module)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
