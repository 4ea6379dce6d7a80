use crate::{CompIdx, Design, Printer};
use forge_utils::{Error, ForgeResult};
use itertools::Itertools;
use petgraph::{
    Direction,
    algo,
    graph::{DiGraph, NodeIndex},
};
use std::collections::{BTreeSet, HashMap};

/// Orders sibling components so that every component comes after the
/// siblings it depends on. Components that are not ordered with respect to
/// each other keep their declaration order, which makes the execution order
/// seen by analyses deterministic.
pub struct DataflowOrder;

impl DataflowOrder {
    /// Execution order of the children of `module`.
    pub fn children(
        design: &Design,
        module: CompIdx,
    ) -> ForgeResult<Vec<CompIdx>> {
        Self::sort(design, &design.component(module).children())
    }

    /// Execution order of `comps`, which must share an owner. A sibling
    /// waits for everything its nested components depend on.
    pub fn sort(
        design: &Design,
        comps: &[CompIdx],
    ) -> ForgeResult<Vec<CompIdx>> {
        // Node `i` of the graph is `comps[i]`; an edge means the source must
        // run before the target.
        let mut gr: DiGraph<CompIdx, ()> =
            DiGraph::with_capacity(comps.len(), 0);
        let position: HashMap<CompIdx, NodeIndex> = comps
            .iter()
            .map(|comp| (*comp, gr.add_node(*comp)))
            .collect();
        // The sibling that is or contains `comp`, if any.
        let sibling_of = |comp: CompIdx| {
            std::iter::once(comp)
                .chain(design.owners(comp))
                .find_map(|c| position.get(&c).copied())
        };

        for (i, comp) in comps.iter().enumerate() {
            let node = NodeIndex::new(i);
            let consumers =
                std::iter::once(*comp).chain(design.descendants(*comp));
            for consumer in consumers {
                for (_, dep) in design
                    .component(consumer)
                    .entries
                    .iter()
                    .flat_map(|entry| entry.all_dependencies())
                {
                    let src = design.bus_owner(dep.bus);
                    if src == consumer {
                        return Err(Error::malformed_structure(format!(
                            "Component depends on itself: {}",
                            Printer::component_to_str(design, consumer)
                        )));
                    }
                    // Values produced and consumed inside one sibling do not
                    // order it.
                    match sibling_of(src) {
                        Some(src_node) if src_node != node => {
                            gr.update_edge(src_node, node, ());
                        }
                        _ => {}
                    }
                }
            }
        }

        // Kahn's algorithm with the ready set ordered by declaration.
        let mut in_degree: Vec<usize> = gr
            .node_indices()
            .map(|n| gr.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut ready: BTreeSet<NodeIndex> = gr
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(comps.len());
        while let Some(node) = ready.pop_first() {
            order.push(gr[node]);
            for succ in gr.neighbors_directed(node, Direction::Outgoing) {
                in_degree[succ.index()] -= 1;
                if in_degree[succ.index()] == 0 {
                    ready.insert(succ);
                }
            }
        }

        if order.len() == comps.len() {
            return Ok(order);
        }
        let sccs = algo::kosaraju_scc(&gr);
        let msg = sccs
            .iter()
            .filter(|cc| cc.len() > 1)
            .flatten()
            .map(|idx| Printer::component_to_str(design, gr[*idx]))
            .join("\n");
        Err(Error::malformed_structure("Found dependency cycle:")
            .with_post_msg(Some(msg)))
    }
}
