use super::MemProcess;
use forge_ir::{
    self as ir, CompIdx, ComponentKind, HolderIdx, TaskIdx,
    traversal::DataflowOrder,
};
use forge_utils::{Error, ForgeResult};
use itertools::Itertools;
use std::collections::{BTreeSet, HashMap, HashSet};

/// First and last accessors seen so far for every state holder touched by a
/// traversal.
#[derive(Debug, Default)]
struct AccessChains {
    to_first: HashMap<HolderIdx, BTreeSet<CompIdx>>,
    to_last: HashMap<HolderIdx, BTreeSet<CompIdx>>,
    /// Holders with a sequencing access; their first accessors are fixed
    /// once recorded.
    non_aggregating: HashSet<HolderIdx>,
}

impl AccessChains {
    fn register(
        &mut self,
        holder: HolderIdx,
        firsts: BTreeSet<CompIdx>,
        lasts: BTreeSet<CompIdx>,
    ) {
        if self.non_aggregating.contains(&holder) {
            self.to_first.entry(holder).or_insert(firsts);
        } else {
            self.to_first.entry(holder).or_default().extend(firsts);
        }
        self.to_last.insert(holder, lasts);
    }

    /// Every holder that appears in either map.
    fn holders(&self) -> BTreeSet<HolderIdx> {
        self.to_first
            .keys()
            .chain(self.to_last.keys())
            .copied()
            .collect()
    }

    /// Turn the chains into processes. Holders accessed by a single,
    /// already serial, set of accessors need none.
    fn close(self, design: &ir::Design) -> HashMap<HolderIdx, MemProcess> {
        let mut processes = HashMap::new();
        for holder in self.holders() {
            let name = design.holder(holder).name;
            let starts =
                self.to_first.get(&holder).cloned().unwrap_or_default();
            let ends =
                self.to_last.get(&holder).cloned().unwrap_or_default();
            assert!(
                !starts.is_empty(),
                "No valid start point found for process of `{name}`"
            );
            assert!(
                !ends.is_empty(),
                "No valid end point found for process of `{name}`"
            );
            if starts == ends {
                continue;
            }
            let process = MemProcess::new(design, holder, starts, ends);
            if log::log_enabled!(log::Level::Debug) {
                log::debug!("Identified {}", process.to_str(design));
            }
            processes.insert(holder, process);
        }
        processes
    }
}

/// Finds the processes of a component by visiting it forward, in dataflow
/// order.
///
/// Every access to a state holder is recorded as the latest access of that
/// holder. The first accesses of a holder are collected until its first
/// sequencing access (anything but a register read); from then on the firsts
/// are fixed. This way several unordered register reads may all open the
/// process that ends at the following write.
///
/// Branch arms are analysed independently and joined conservatively: a
/// process may start or end in either arm. A task call is a single access,
/// first and last, of every holder the callee touches; the callee's own
/// processes are identified from its body.
pub struct ProcessIdentifier<'a> {
    design: &'a ir::Design,
    /// Tasks being analysed, innermost last.
    call_stack: Vec<TaskIdx>,
}

impl<'a> ProcessIdentifier<'a> {
    /// Processes of `root`, keyed by the state holder they serialize.
    pub fn generate_processes(
        design: &'a ir::Design,
        root: CompIdx,
    ) -> ForgeResult<HashMap<HolderIdx, MemProcess>> {
        let mut identifier = ProcessIdentifier {
            design,
            call_stack: vec![],
        };
        let mut chains = AccessChains::default();
        identifier.visit(root, &mut chains)?;
        Ok(chains.close(design))
    }

    fn visit(
        &mut self,
        comp: CompIdx,
        chains: &mut AccessChains,
    ) -> ForgeResult<()> {
        let design = self.design;
        match &design.component(comp).kind {
            ComponentKind::Access(access) => {
                let holder = access.resource();
                if access.is_sequencing_point() {
                    chains.non_aggregating.insert(holder);
                }
                log::trace!(
                    "Identified `{}` <= {}",
                    design.holder(holder).name,
                    design.component(comp).name
                );
                chains.register(holder, [comp].into(), [comp].into());
            }
            ComponentKind::Op(_) => {}
            ComponentKind::Block(_) | ComponentKind::Loop { .. } => {
                for child in DataflowOrder::children(design, comp)? {
                    self.visit(child, chains)?;
                }
            }
            ComponentKind::Branch(branch) => {
                // The arms are joined at the position of whichever arm the
                // dataflow order reaches first.
                let mut arms_visited = false;
                for child in DataflowOrder::children(design, comp)? {
                    if child == branch.true_branch
                        || child == branch.false_branch
                    {
                        if !arms_visited {
                            self.visit_arms(branch, chains)?;
                            arms_visited = true;
                        }
                    } else {
                        self.visit(child, chains)?;
                    }
                }
            }
            ComponentKind::TaskCall(task) => {
                self.visit_call(comp, *task, chains)?
            }
        }
        Ok(())
    }

    fn visit_arms(
        &mut self,
        branch: &ir::Branch,
        chains: &mut AccessChains,
    ) -> ForgeResult<()> {
        let mut true_chains = AccessChains::default();
        self.visit(branch.true_branch, &mut true_chains)?;
        let mut false_chains = AccessChains::default();
        self.visit(branch.false_branch, &mut false_chains)?;

        let holders = true_chains
            .holders()
            .into_iter()
            .chain(false_chains.holders())
            .unique();
        for holder in holders {
            let firsts = union_of(
                [&true_chains.to_first, &false_chains.to_first],
                holder,
            );
            let lasts = union_of(
                [&true_chains.to_last, &false_chains.to_last],
                holder,
            );
            chains.register(holder, firsts, lasts);
        }
        chains.non_aggregating.extend(true_chains.non_aggregating);
        chains.non_aggregating.extend(false_chains.non_aggregating);
        Ok(())
    }

    fn visit_call(
        &mut self,
        call: CompIdx,
        task: TaskIdx,
        chains: &mut AccessChains,
    ) -> ForgeResult<()> {
        let design = self.design;
        if self.call_stack.contains(&task) {
            return Err(Error::malformed_structure(format!(
                "Recursive call of task `{}`: {}",
                design.task(task).name,
                self.call_stack
                    .iter()
                    .map(|t| design.task(*t).name)
                    .join(" -> ")
            )));
        }
        self.call_stack.push(task);
        let mut callee = AccessChains::default();
        let visited = self.visit(design.task(task).body, &mut callee);
        self.call_stack.pop();
        visited?;

        for holder in callee.holders() {
            log::trace!(
                "Identified `{}` <= {}",
                design.holder(holder).name,
                design.component(call).name
            );
            chains.register(holder, [call].into(), [call].into());
        }
        chains.non_aggregating.extend(callee.non_aggregating);
        Ok(())
    }
}

fn union_of(
    maps: [&HashMap<HolderIdx, BTreeSet<CompIdx>>; 2],
    holder: HolderIdx,
) -> BTreeSet<CompIdx> {
    maps.into_iter()
        .filter_map(|map| map.get(&holder))
        .flatten()
        .copied()
        .collect()
}
