use super::{ProcessIdx, ProcessTracker};
use forge_ir::{self as ir, CompIdx, PortIdx};
use forge_utils::{Error, ForgeResult};
use std::collections::BTreeSet;

/// Classifies one component against the processes known to a
/// [ProcessTracker]. Everything is computed at construction; the answers go
/// stale if the design changes afterwards.
#[derive(Debug)]
pub struct ComponentProcessDeriver {
    component: CompIdx,
    /// Processes reaching the go port through control dependencies.
    initial_procs: BTreeSet<ProcessIdx>,
    /// Processes reaching any data port, including the ones closed by the
    /// producer of the data.
    data_procs: BTreeSet<ProcessIdx>,
    opened_procs: BTreeSet<ProcessIdx>,
    closed_procs: BTreeSet<ProcessIdx>,
    /// Data ports that no process reaches.
    uncontrolled_data_ports: BTreeSet<PortIdx>,
    /// Uncontrolled data ports fed by at least one timed bus.
    timed_data_ports: BTreeSet<PortIdx>,
}

impl ComponentProcessDeriver {
    pub fn new(
        design: &ir::Design,
        comp: CompIdx,
        tracker: &ProcessTracker,
    ) -> ForgeResult<Self> {
        let Some(component) = design.get_component(comp) else {
            return Err(Error::invalid_argument(format!(
                "Cannot derive processes of {comp:?}: \
                 not a component of the design"
            )));
        };

        let mut deriver = Self {
            component: comp,
            initial_procs: BTreeSet::new(),
            data_procs: BTreeSet::new(),
            opened_procs: BTreeSet::new(),
            closed_procs: BTreeSet::new(),
            uncontrolled_data_ports: BTreeSet::new(),
            timed_data_ports: BTreeSet::new(),
        };
        if tracker.processes().is_empty() {
            return Ok(deriver);
        }

        deriver.initial_procs =
            tracker.procs_for_ports(design, [component.go], false);
        for &port in &component.data_ports {
            let procs = tracker.procs_for_ports(design, [port], true);
            if procs.is_empty() {
                deriver.uncontrolled_data_ports.insert(port);
            }
            deriver.data_procs.extend(procs);
        }
        for (idx, proc) in tracker.processes().iter() {
            if proc.is_start_point(comp) {
                deriver.opened_procs.insert(idx);
            }
            if proc.is_end_point(comp) {
                deriver.closed_procs.insert(idx);
            }
        }
        // Values that are fixed at compile time need no ordering.
        deriver.timed_data_ports = deriver
            .uncontrolled_data_ports
            .iter()
            .copied()
            .filter(|port| {
                design
                    .dependencies(*port)
                    .any(|dep| !design.is_untimed(dep.bus))
            })
            .collect();
        Ok(deriver)
    }

    pub fn component(&self) -> CompIdx {
        self.component
    }

    /// The processes the component executes in. A component that neither
    /// waits on nor opens a process inherits the processes of its data.
    pub fn in_processes(&self) -> BTreeSet<ProcessIdx> {
        let procs: BTreeSet<_> = self
            .initial_procs
            .union(&self.opened_procs)
            .copied()
            .collect();
        if procs.is_empty() {
            self.data_procs.clone()
        } else {
            procs.difference(&self.closed_procs).copied().collect()
        }
    }

    pub fn closed_processes(&self) -> &BTreeSet<ProcessIdx> {
        &self.closed_procs
    }

    /// Every process whose data the component consumes. The component must
    /// factor into the stall of each of them even when it also runs inside
    /// the process through its control path.
    pub fn data_procs_to_stall(&self) -> &BTreeSet<ProcessIdx> {
        &self.data_procs
    }

    /// Processes opened without any process controlling the go port. The
    /// scheduler has to factor their go signals into the enclosing module.
    pub fn uncontrolled_open_procs(&self) -> BTreeSet<ProcessIdx> {
        if self.initial_procs.is_empty() {
            self.opened_procs.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Data ports reached by no process, except for ports only fed by
    /// untimed buses.
    pub fn uncontrolled_data_ports(&self) -> &BTreeSet<PortIdx> {
        &self.timed_data_ports
    }

    /// Multi-line summary of the classification for debug logging.
    pub fn to_str(&self, design: &ir::Design) -> String {
        format!(
            "{}\n\tinit  {:?}\n\topen  {:?}\n\tclose {:?}\n\t\
             data  {:?}\n\tdataP {:?}",
            ir::Printer::component_to_str(design, self.component),
            self.initial_procs,
            self.opened_procs,
            self.closed_procs,
            self.data_procs,
            self.uncontrolled_data_ports
        )
    }
}
